//! Access to the Wikidata query service for the heritage map.
//!
//! [`QueryPlan`] builds the four staged queries, [`SparqlEndpoint`] runs them and the row types
//! turn the returned solutions into typed records.

mod endpoint;
mod error;
mod plan;
mod rows;

pub use endpoint::{
    parse_solutions, EndpointConfig, HttpEndpoint, SparqlEndpoint, WIKIDATA_SPARQL_ENDPOINT,
};
pub use error::{EndpointError, RowError};
pub use plan::{PlannedQuery, QueryPlan, QueryStage, ValuesClause, WDQS_GUI_URL};
pub use rows::{CoordinatesRow, DesignationDetailsRow, DiscoveryRow, MediaRow, PartBinding};
pub use sparesults::QuerySolution;
