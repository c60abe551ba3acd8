//! Read-only views handed to presentation adapters.

use crate::{DesignationIndex, FacetKey, RecordStore};
use heritage_map_model::{
    commons_file_url, wikidata_page_for_iri, wikidata_page_url, wikipedia_article_url, Coordinates,
    DesignationCatalog, DesignationTypeId, LanguageTag, OrganizationId, SiteId, SiteRecord,
};

/// One selectable designation type of the filter menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterOption {
    pub facet: FacetKey,
    pub name: String,
    pub count: usize,
}

/// The options of one organization, headed by its full name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterGroup {
    pub organization: OrganizationId,
    pub label: String,
    pub options: Vec<FilterOption>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterMenu {
    pub all_count: usize,
    pub groups: Vec<FilterGroup>,
}

impl FilterMenu {
    pub fn new(catalog: &DesignationCatalog, index: &DesignationIndex) -> Self {
        let groups = catalog
            .groups()
            .into_iter()
            .map(|group| FilterGroup {
                organization: group.organization.id.clone(),
                label: group.organization.full_name.clone(),
                options: group
                    .types
                    .into_iter()
                    .map(|designation| {
                        let facet = FacetKey::Type(designation.id.clone());
                        FilterOption {
                            count: index.count(&facet),
                            name: designation.name.clone(),
                            facet,
                        }
                    })
                    .collect(),
            })
            .collect();
        Self {
            all_count: index.count(&FacetKey::All),
            groups,
        }
    }
}

/// Links to the declaration document behind a designation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclarationView {
    pub title: Option<String>,
    pub wikidata_url: Option<String>,
    pub text_url: Option<String>,
    pub scan_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesignationView {
    pub type_id: DesignationTypeId,
    pub name: String,
    pub organization: String,
    /// The rendered declaration date.
    pub declared: Option<String>,
    pub declaration: Option<DeclarationView>,
    /// The compound site this designation is held through, with its title.
    pub part_of: Option<(SiteId, String)>,
}

/// Everything shown about a site in its details panel.
#[derive(Debug, Clone, PartialEq)]
pub struct SiteDetails {
    pub id: SiteId,
    pub title: String,
    pub wikidata_url: String,
    pub coordinates: Option<Coordinates>,
    pub image: Option<(String, String)>,
    pub article: Option<(String, String)>,
    pub members: Vec<(SiteId, String)>,
    /// Ordered by the sort order of the designation types.
    pub designations: Vec<DesignationView>,
}

impl SiteDetails {
    /// Builds the details of `record`. Links point to the Wikipedia of `language`.
    pub fn new(
        record: &SiteRecord,
        store: &RecordStore,
        catalog: &DesignationCatalog,
        language: &LanguageTag,
    ) -> Self {
        let title_of = |id: &SiteId| {
            store
                .get(id.as_str())
                .map_or_else(|| id.to_string(), |r| r.title.to_string())
        };

        let mut designations: Vec<_> = record
            .designations
            .iter()
            .filter_map(|(type_id, designation)| {
                let metadata = catalog.metadata(type_id.as_str())?;
                let organization = catalog
                    .organization(metadata.organization.as_str())
                    .map_or_else(
                        || metadata.organization.to_string(),
                        |o| o.full_name.clone(),
                    );
                let declaration = designation.has_declaration().then(|| DeclarationView {
                    title: designation.declaration_title.clone(),
                    wikidata_url: designation
                        .declaration
                        .as_ref()
                        .map(|d| wikidata_page_for_iri(&d.iri())),
                    text_url: designation.declaration_text_url.clone(),
                    scan_url: designation.declaration_scan_url.clone(),
                });
                let view = DesignationView {
                    type_id: type_id.clone(),
                    name: metadata.name.clone(),
                    organization,
                    declared: designation.declared.map(|d| d.to_string()),
                    declaration,
                    part_of: designation
                        .part_of
                        .as_ref()
                        .map(|parent| (parent.clone(), title_of(parent))),
                };
                Some((metadata.sort_order, view))
            })
            .collect();
        designations.sort_by_key(|(sort_order, _)| *sort_order);

        Self {
            id: record.id.clone(),
            title: record.title.to_string(),
            wikidata_url: wikidata_page_url(&record.id),
            coordinates: record.coordinates(),
            image: record
                .image_filename
                .as_ref()
                .map(|name| (name.clone(), commons_file_url(name))),
            article: record
                .article_title
                .as_ref()
                .map(|title| (title.clone(), wikipedia_article_url(title, language))),
            members: record
                .members()
                .iter()
                .map(|member| (member.clone(), title_of(member)))
                .collect(),
            designations: designations.into_iter().map(|(_, view)| view).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use heritage_map_model::{Designation, DocumentId, PartialDate, SiteTitle};

    #[test]
    fn filter_menu_follows_catalog_groups() {
        let catalog = DesignationCatalog::philippine();
        let mut record = SiteRecord::new_simple(
            SiteId::new("Q1").unwrap(),
            SiteTitle::Label("Intramuros".to_owned()),
        );
        record.designation_entry(&DesignationTypeId::new("Q23677505").unwrap());
        let store: RecordStore = [record].into_iter().collect();
        let index = DesignationIndex::build(&store, &catalog);

        let menu = FilterMenu::new(&catalog, &index);
        assert_eq!(menu.all_count, 1);
        assert_eq!(menu.groups.len(), 6);
        let first = &menu.groups[0];
        assert_eq!(first.label, "National Historical Commission of the Philippines");
        assert_eq!(first.options[0].name, "National Historical Landmark");
        assert_eq!(first.options[0].count, 1);
        assert_eq!(first.options[1].count, 0);
    }

    #[test]
    fn site_details_sort_designations_and_build_links() {
        let catalog = DesignationCatalog::philippine();
        let parent_id = SiteId::new("Q1").unwrap();
        let parent = SiteRecord::new_compound(
            parent_id.clone(),
            SiteTitle::Label("Baroque Churches of the Philippines".to_owned()),
        );
        let mut record = SiteRecord::new_simple(
            SiteId::new("Q2").unwrap(),
            SiteTitle::Label("San Agustin Church".to_owned()),
        );
        record.image_filename = Some("San Agustin Church.jpg".to_owned());
        record.article_title = Some("San_Agustin_Church_(Manila)".to_owned());
        record.designations.insert(
            DesignationTypeId::new("Q9259").unwrap(),
            Designation {
                part_of: Some(parent_id),
                ..Designation::default()
            },
        );
        record.designations.insert(
            DesignationTypeId::new("Q24189292").unwrap(),
            Designation {
                declared: Some(PartialDate::parse("+1973-01-01T00:00:00Z", 9).unwrap()),
                declaration: Some(DocumentId::new("Q100").unwrap()),
                declaration_title: Some("Presidential Decree No. 260".to_owned()),
                ..Designation::default()
            },
        );
        let store: RecordStore = [parent, record.clone()].into_iter().collect();

        let details = SiteDetails::new(&record, &store, &catalog, &LanguageTag::english());
        assert_eq!(details.wikidata_url, "https://www.wikidata.org/wiki/Q2");
        assert_eq!(
            details.image.map(|(_, url)| url).as_deref(),
            Some("https://commons.wikimedia.org/wiki/File:San%20Agustin%20Church.jpg")
        );
        assert_eq!(
            details.article.map(|(_, url)| url).as_deref(),
            Some("https://en.wikipedia.org/wiki/San_Agustin_Church_(Manila)")
        );

        let names: Vec<_> = details.designations.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, ["National Cultural Treasure", "World Heritage Site"]);
        let treasure = &details.designations[0];
        assert_eq!(treasure.organization, "National Museum");
        assert_eq!(treasure.declared.as_deref(), Some("1973"));
        assert_eq!(
            treasure.declaration.as_ref().and_then(|d| d.wikidata_url.as_deref()),
            Some("https://www.wikidata.org/wiki/Q100")
        );
        let heritage = &details.designations[1];
        assert_eq!(heritage.declaration, None);
        assert_eq!(
            heritage.part_of.as_ref().map(|(_, title)| title.as_str()),
            Some("Baroque Churches of the Philippines")
        );
    }
}
