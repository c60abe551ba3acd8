//! Typed rows of each query stage.
//!
//! Each row type states which variables its query binds and which of them are optional. Rows are
//! validated once, here, so that reconciliation never inspects raw terms.

use crate::RowError;
use heritage_map_model::{
    article_title_from_url, commons_file_name, commons_file_page, CoordinateParseError,
    Coordinates, DesignationTypeId, DocumentId, IdentifierError, LanguageTag, PartialDate,
    PartialDateError, SiteId,
};
use oxrdf::{Literal, NamedNode, Term};
use sparesults::QuerySolution;
use tracing::debug;

fn named_node<'a>(
    solution: &'a QuerySolution,
    variable: &'static str,
) -> Result<Option<&'a NamedNode>, RowError> {
    match solution.get(variable) {
        None => Ok(None),
        Some(Term::NamedNode(node)) => Ok(Some(node)),
        Some(_) => Err(RowError::UnexpectedTerm {
            variable,
            expected: "an IRI",
        }),
    }
}

fn literal<'a>(
    solution: &'a QuerySolution,
    variable: &'static str,
) -> Result<Option<&'a Literal>, RowError> {
    match solution.get(variable) {
        None => Ok(None),
        Some(Term::Literal(literal)) => Ok(Some(literal)),
        Some(_) => Err(RowError::UnexpectedTerm {
            variable,
            expected: "a literal",
        }),
    }
}

fn entity<T>(
    solution: &QuerySolution,
    variable: &'static str,
    from_iri: impl FnOnce(&str) -> Result<T, IdentifierError>,
) -> Result<Option<T>, RowError> {
    named_node(solution, variable)?
        .map(|node| from_iri(node.as_str()))
        .transpose()
        .map_err(|source| RowError::Identifier { variable, source })
}

fn required<T>(value: Option<T>, variable: &'static str) -> Result<T, RowError> {
    value.ok_or(RowError::Unbound(variable))
}

/// The label service falls back to the entity token when no label exists in the language.
fn label(solution: &QuerySolution, variable: &'static str, id: &SiteId) -> Option<String> {
    match solution.get(variable) {
        Some(Term::Literal(literal)) if literal.value() != id.as_str() => {
            Some(literal.value().to_owned())
        }
        _ => None,
    }
}

/// A member of a compound site, as named by a `?partSite` binding.
#[derive(Debug, Clone, PartialEq)]
pub struct PartBinding {
    pub site: SiteId,
    pub label: Option<String>,
}

impl PartBinding {
    fn from_solution(solution: &QuerySolution) -> Result<Option<Self>, RowError> {
        Ok(entity(solution, "partSite", SiteId::from_iri)?.map(|site| {
            let label = label(solution, "partSiteLabel", &site);
            Self { site, label }
        }))
    }
}

/// A row of the [discovery](crate::QueryStage::Discovery) stage.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscoveryRow {
    pub site: SiteId,
    pub label: Option<String>,
    pub designation: DesignationTypeId,
    pub part: Option<PartBinding>,
}

impl DiscoveryRow {
    pub fn from_solution(solution: &QuerySolution) -> Result<Self, RowError> {
        let site = required(entity(solution, "site", SiteId::from_iri)?, "site")?;
        Ok(Self {
            label: label(solution, "siteLabel", &site),
            designation: required(
                entity(solution, "designation", DesignationTypeId::from_iri)?,
                "designation",
            )?,
            part: PartBinding::from_solution(solution)?,
            site,
        })
    }
}

/// A row of the [coordinates](crate::QueryStage::Coordinates) stage.
///
/// A malformed point does not invalidate the row: the member link it may carry is still useful.
#[derive(Debug, Clone, PartialEq)]
pub struct CoordinatesRow {
    pub site: SiteId,
    pub coordinates: Result<Coordinates, CoordinateParseError>,
    pub part: Option<PartBinding>,
}

impl CoordinatesRow {
    pub fn from_solution(solution: &QuerySolution) -> Result<Self, RowError> {
        let site = required(entity(solution, "site", SiteId::from_iri)?, "site")?;
        let coord = required(literal(solution, "coord")?, "coord")?;
        Ok(Self {
            site,
            coordinates: Coordinates::from_wkt(coord.value()),
            part: PartBinding::from_solution(solution)?,
        })
    }
}

/// A row of the [designation details](crate::QueryStage::DesignationDetails) stage.
#[derive(Debug, Clone, PartialEq)]
pub struct DesignationDetailsRow {
    pub site: SiteId,
    pub designation: DesignationTypeId,
    pub declared: Option<PartialDate>,
    pub declaration: Option<DocumentId>,
    pub declaration_title: Option<String>,
    /// The Commons description page of the scanned declaration.
    pub declaration_scan_url: Option<String>,
    pub declaration_text_url: Option<String>,
}

impl DesignationDetailsRow {
    pub fn from_solution(solution: &QuerySolution) -> Result<Self, RowError> {
        let site = required(entity(solution, "site", SiteId::from_iri)?, "site")?;
        let designation = required(
            entity(solution, "designation", DesignationTypeId::from_iri)?,
            "designation",
        )?;
        let declared = match (
            literal(solution, "declared")?,
            literal(solution, "declaredPrecision")?,
        ) {
            (Some(value), Some(precision)) => parse_declared(value, precision)
                .map_err(|e| debug!(%site, %designation, "ignoring declaration date: {e}"))
                .ok(),
            _ => None,
        };
        Ok(Self {
            declared,
            declaration: entity(solution, "declaration", DocumentId::from_iri)?,
            declaration_title: literal(solution, "declarationTitle")?
                .map(|l| l.value().to_owned()),
            declaration_scan_url: named_node(solution, "declarationScan")?
                .map(|n| commons_file_page(n.as_str())),
            declaration_text_url: named_node(solution, "declarationText")?
                .map(|n| n.as_str().to_owned()),
            site,
            designation,
        })
    }
}

fn parse_declared(value: &Literal, precision: &Literal) -> Result<PartialDate, PartialDateError> {
    let code = precision
        .value()
        .parse::<u8>()
        .map_err(|_| PartialDateError::Malformed(precision.value().to_owned()))?;
    PartialDate::parse(value.value(), code)
}

/// A row of the [media](crate::QueryStage::Media) stage.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaRow {
    pub site: SiteId,
    pub image_filename: Option<String>,
    /// The decoded title of the article in the plan's language.
    pub article_title: Option<String>,
}

impl MediaRow {
    pub fn from_solution(solution: &QuerySolution, language: &LanguageTag) -> Result<Self, RowError> {
        let site = required(entity(solution, "site", SiteId::from_iri)?, "site")?;
        Ok(Self {
            site,
            image_filename: named_node(solution, "image")?
                .and_then(|n| commons_file_name(n.as_str())),
            article_title: named_node(solution, "siteArticle")?
                .and_then(|n| article_title_from_url(n.as_str(), language)),
        })
    }
}
