//! The queries needed to populate the heritage map, in dependency order.
//!
//! The [`QueryStage::Discovery`] query runs first and yields the site identifiers. All other
//! stages are scoped to those identifiers through a [`ValuesClause`] and may run concurrently.

use heritage_map_model::{wikipedia_site, DesignationCatalog, Jurisdiction, LanguageTag, SiteId};
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use std::fmt;

/// The Wikidata query service GUI.
pub const WDQS_GUI_URL: &str = "https://query.wikidata.org/";

/// The Philippines (`wd:Q928`), used to restrict international designations.
const PHILIPPINES: &str = "Q928";

const PREFIXES: &str = "\
PREFIX wd: <http://www.wikidata.org/entity/>
PREFIX wdt: <http://www.wikidata.org/prop/direct/>
PREFIX p: <http://www.wikidata.org/prop/>
PREFIX ps: <http://www.wikidata.org/prop/statement/>
PREFIX pq: <http://www.wikidata.org/prop/qualifier/>
PREFIX pqv: <http://www.wikidata.org/prop/qualifier/value/>
PREFIX wikibase: <http://wikiba.se/ontology#>
PREFIX bd: <http://www.bigdata.com/rdf#>
PREFIX schema: <http://schema.org/>
";

/// One of the queries of the plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum QueryStage {
    /// Sites, their titles and designation types, and the members of compound sites.
    Discovery,
    /// The positions of sites and of the members of compound sites.
    Coordinates,
    /// Declaration dates and documents of each designation.
    DesignationDetails,
    /// Images and Wikipedia articles.
    Media,
}

impl QueryStage {
    pub const ALL: [Self; 4] = [
        Self::Discovery,
        Self::Coordinates,
        Self::DesignationDetails,
        Self::Media,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Discovery => "discovery",
            Self::Coordinates => "coordinates",
            Self::DesignationDetails => "designation details",
            Self::Media => "media",
        }
    }
}

impl fmt::Display for QueryStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A `VALUES` block binding one variable to a list of entities.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValuesClause {
    variable: &'static str,
    tokens: Vec<String>,
}

impl ValuesClause {
    pub fn new<'a>(
        variable: &'static str,
        tokens: impl IntoIterator<Item = &'a str>,
    ) -> Self {
        Self {
            variable,
            tokens: tokens.into_iter().map(str::to_owned).collect(),
        }
    }

    /// Scopes the `?site` variable to the given sites.
    pub fn sites<'a>(sites: impl IntoIterator<Item = &'a SiteId>) -> Self {
        Self::new("site", sites.into_iter().map(SiteId::as_str))
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

impl fmt::Display for ValuesClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VALUES ?{} {{", self.variable)?;
        for token in &self.tokens {
            write!(f, " wd:{token}")?;
        }
        f.write_str(" }")
    }
}

/// A query ready to be sent, tagged with its stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedQuery {
    pub stage: QueryStage,
    pub text: String,
}

impl PlannedQuery {
    /// A link opening this query in the Wikidata query service GUI.
    pub fn gui_url(&self) -> String {
        format!(
            "{WDQS_GUI_URL}#{}",
            utf8_percent_encode(&self.text, NON_ALPHANUMERIC)
        )
    }
}

/// Builds the queries of every stage for a catalog and a label language.
#[derive(Debug, Clone)]
pub struct QueryPlan<'catalog> {
    catalog: &'catalog DesignationCatalog,
    language: LanguageTag,
}

impl<'catalog> QueryPlan<'catalog> {
    pub fn new(catalog: &'catalog DesignationCatalog, language: LanguageTag) -> Self {
        Self { catalog, language }
    }

    pub fn language(&self) -> &LanguageTag {
        &self.language
    }

    fn designation_values(&self, jurisdiction: Jurisdiction) -> ValuesClause {
        ValuesClause::new(
            "designation",
            self.catalog
                .types_with_jurisdiction(jurisdiction)
                .map(|t| t.id.as_str()),
        )
    }

    fn label_service(&self) -> String {
        let language = &self.language;
        format!("SERVICE wikibase:label {{ bd:serviceParam wikibase:language \"{language}\". }}")
    }

    /// Every `(site, designation)` pair for the recognized designations, plus the members of
    /// compound sites.
    ///
    /// National designations are matched on best-rank statements. International ones are matched
    /// on any statement of a site located in the Philippines. A `?partSite` binding names a part
    /// of the site that has its own position qualified on the site's coordinate statement.
    pub fn discovery(&self) -> PlannedQuery {
        let national = self.designation_values(Jurisdiction::National);
        let international = self.designation_values(Jurisdiction::International);
        let labels = self.label_service();
        let text = format!(
            r#"{PREFIXES}SELECT DISTINCT ?site ?siteLabel ?designation ?partSite ?partSiteLabel WHERE {{
  {{
    {national}
    ?site p:P1435 ?designationStatement .
    ?designationStatement ps:P1435 ?designation .
    ?site wdt:P1435 ?designation .
  }}
  UNION
  {{
    {international}
    ?site p:P1435 ?designationStatement ;
          wdt:P17 wd:{PHILIPPINES} .
    ?designationStatement ps:P1435 ?designation .
  }}
  OPTIONAL {{
    ?site wdt:P527 ?partSite ;
          p:P625 ?partCoordStatement .
    ?partCoordStatement pq:P518 ?partSite .
  }}
  {labels}
}}
"#
        );
        PlannedQuery {
            stage: QueryStage::Discovery,
            text,
        }
    }

    /// The coordinate statements of the given (non-member) sites.
    ///
    /// A statement qualified with "applies to part" (`pq:P518`) locates that member instead of the
    /// site itself.
    pub fn coordinates(&self, scope: &ValuesClause) -> PlannedQuery {
        let labels = self.label_service();
        let text = format!(
            r#"{PREFIXES}SELECT ?site ?coord ?partSite ?partSiteLabel WHERE {{
  {scope}
  ?site p:P625 ?coordStatement .
  ?coordStatement ps:P625 ?coord .
  OPTIONAL {{
    ?coordStatement pq:P518 ?partSite .
    ?site wdt:P527 ?partSite .
  }}
  {labels}
}}
"#
        );
        PlannedQuery {
            stage: QueryStage::Coordinates,
            text,
        }
    }

    /// The declaration metadata of every recognized designation of the given sites.
    pub fn designation_details(&self, scope: &ValuesClause) -> PlannedQuery {
        let designations = ValuesClause::new(
            "designation",
            self.catalog.recognized_type_ids().map(|t| t.as_str()),
        );
        let language = &self.language;
        let text = format!(
            r#"{PREFIXES}SELECT ?site ?designation ?declared ?declaredPrecision ?declaration ?declarationTitle ?declarationScan ?declarationText WHERE {{
  {scope}
  {designations}
  ?site p:P1435 ?designationStatement .
  ?designationStatement ps:P1435 ?designation .
  OPTIONAL {{
    ?designationStatement pqv:P580 ?declaredValue .
    ?declaredValue wikibase:timeValue ?declared ;
                   wikibase:timePrecision ?declaredPrecision .
  }}
  OPTIONAL {{
    ?designationStatement pq:P457 ?declaration .
    ?declaration wdt:P1476 ?declarationTitle .
    OPTIONAL {{ ?declaration wdt:P996 ?declarationScan }}
    OPTIONAL {{
      ?declarationText schema:about ?declaration ;
                       schema:isPartOf <https://{language}.wikisource.org/> .
    }}
  }}
}}
"#
        );
        PlannedQuery {
            stage: QueryStage::DesignationDetails,
            text,
        }
    }

    /// The image and Wikipedia article of the given sites.
    pub fn media(&self, scope: &ValuesClause) -> PlannedQuery {
        let wikipedia = wikipedia_site(&self.language);
        let text = format!(
            r#"{PREFIXES}SELECT ?site ?image ?siteArticle WHERE {{
  {scope}
  OPTIONAL {{ ?site wdt:P18 ?image }}
  OPTIONAL {{
    ?siteArticle schema:about ?site ;
                 schema:isPartOf <{wikipedia}> .
  }}
}}
"#
        );
        PlannedQuery {
            stage: QueryStage::Media,
            text,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spargebra::Query;

    fn scope() -> ValuesClause {
        let sites = [SiteId::new("Q1").unwrap(), SiteId::new("Q22").unwrap()];
        ValuesClause::sites(&sites)
    }

    fn assert_parses(query: &PlannedQuery) {
        if let Err(e) = Query::parse(&query.text, None) {
            panic!("{} query is not valid SPARQL: {e}\n{}", query.stage, query.text);
        }
    }

    #[test]
    fn values_clause_lists_entities() {
        assert_eq!(scope().to_string(), "VALUES ?site { wd:Q1 wd:Q22 }");
        assert_eq!(scope().len(), 2);
        assert_eq!(ValuesClause::sites(&[]).to_string(), "VALUES ?site { }");
    }

    #[test]
    fn every_stage_is_valid_sparql() {
        let catalog = DesignationCatalog::philippine();
        let plan = QueryPlan::new(&catalog, LanguageTag::english());
        assert_parses(&plan.discovery());
        assert_parses(&plan.coordinates(&scope()));
        assert_parses(&plan.designation_details(&scope()));
        assert_parses(&plan.media(&scope()));
    }

    #[test]
    fn empty_scope_is_valid_sparql() {
        let catalog = DesignationCatalog::philippine();
        let plan = QueryPlan::new(&catalog, LanguageTag::english());
        assert_parses(&plan.coordinates(&ValuesClause::sites(&[])));
    }

    #[test]
    fn discovery_splits_jurisdictions() {
        let catalog = DesignationCatalog::philippine();
        let text = QueryPlan::new(&catalog, LanguageTag::english()).discovery().text;
        let (national, international) = text.split_once("UNION").unwrap();
        assert!(national.contains("wd:Q23677505"));
        assert!(!national.contains("wd:Q9259"));
        assert!(international.contains("wd:Q9259"));
        assert!(international.contains("wdt:P17 wd:Q928"));
    }

    #[test]
    fn scoped_stages_embed_the_scope() {
        let catalog = DesignationCatalog::philippine();
        let plan = QueryPlan::new(&catalog, LanguageTag::new("tl").unwrap());
        for query in [
            plan.coordinates(&scope()),
            plan.designation_details(&scope()),
            plan.media(&scope()),
        ] {
            assert!(query.text.contains("VALUES ?site { wd:Q1 wd:Q22 }"));
        }
        assert!(plan.media(&scope()).text.contains("<https://tl.wikipedia.org/>"));
        assert!(plan
            .designation_details(&scope())
            .text
            .contains("<https://tl.wikisource.org/>"));
    }

    #[test]
    fn gui_url_escapes_the_query() {
        let catalog = DesignationCatalog::philippine();
        let url = QueryPlan::new(&catalog, LanguageTag::english()).discovery().gui_url();
        assert!(url.starts_with("https://query.wikidata.org/#PREFIX%20wd%3A"));
        assert!(!url.contains(' '));
    }
}
