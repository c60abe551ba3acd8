use heritage_map_model::{CoordinateParseError, DesignationTypeId, SiteId};
use heritage_map_sparql::EndpointError;
use reqwest::StatusCode;
use thiserror::Error;

/// A row that could not be merged into the record store.
///
/// Reconciliation errors never abort a stage. The offending row is logged and skipped.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ReconcileError {
    #[error("site {site} holds designation {designation}, which is not in the catalog")]
    UnknownDesignation {
        site: SiteId,
        designation: DesignationTypeId,
    },
    #[error("site {0} was not discovered")]
    UnknownSite(SiteId),
    #[error("site {site} was not discovered with designation {designation}")]
    DesignationNotDiscovered {
        site: SiteId,
        designation: DesignationTypeId,
    },
    #[error("invalid position for site {site}: {source}")]
    Coordinates {
        site: SiteId,
        #[source]
        source: CoordinateParseError,
    },
}

/// An error that prevents a session from loading.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("the discovery query failed: {0}")]
    Discovery(#[source] EndpointError),
}

/// An error raised while fetching an article extract.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ArticleError {
    #[error("could not reach Wikipedia: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Wikipedia answered with status {0}")]
    Status(StatusCode),
    #[error("unexpected Wikipedia API response: {0}")]
    Response(#[from] serde_json::Error),
    #[error("invalid Wikipedia API URL: {0}")]
    Url(#[from] url::ParseError),
}

/// An error raised while looking up a site outline on OpenStreetMap.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum OutlineError {
    #[error("could not reach the Overpass API: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("the Overpass API answered with status {0}")]
    Status(StatusCode),
    #[error("unexpected Overpass API response: {0}")]
    Response(#[from] serde_json::Error),
}
