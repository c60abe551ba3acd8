use heritage_map_model::IdentifierError;
use reqwest::StatusCode;
use sparesults::QueryResultsParseError;
use thiserror::Error;

/// An error raised while turning a query solution into a typed row.
///
/// Row errors are scoped to a single row: the row is skipped and the batch goes on.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RowError {
    #[error("variable ?{0} is not bound")]
    Unbound(&'static str),
    #[error("variable ?{variable} should be bound to {expected}")]
    UnexpectedTerm {
        variable: &'static str,
        expected: &'static str,
    },
    #[error("variable ?{variable}: {source}")]
    Identifier {
        variable: &'static str,
        #[source]
        source: IdentifierError,
    },
}

/// An error raised while querying a SPARQL endpoint.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum EndpointError {
    #[error("could not reach the SPARQL endpoint: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("the SPARQL endpoint answered with status {0}")]
    Status(StatusCode),
    #[error("invalid SPARQL results document: {0}")]
    Results(#[from] QueryResultsParseError),
    #[error("expected query solutions but the endpoint returned a boolean")]
    UnexpectedBoolean,
}
