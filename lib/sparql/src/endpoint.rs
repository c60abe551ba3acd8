use crate::{EndpointError, PlannedQuery};
use async_trait::async_trait;
use reqwest::header::{ACCEPT, USER_AGENT};
use sparesults::{
    QueryResultsFormat, QueryResultsParser, QuerySolution, ReaderQueryResultsParserOutput,
};
use std::time::Duration;
use tracing::debug;
use url::Url;

/// The public Wikidata query service.
pub const WIKIDATA_SPARQL_ENDPOINT: &str = "https://query.wikidata.org/sparql";

const SPARQL_RESULTS_JSON: &str = "application/sparql-results+json";

/// Something that answers `SELECT` queries.
///
/// The session only depends on this trait so that it can be driven by canned results.
#[async_trait]
pub trait SparqlEndpoint: Send + Sync {
    async fn select(&self, query: &PlannedQuery) -> Result<Vec<QuerySolution>, EndpointError>;
}

/// Connection settings of an [`HttpEndpoint`].
#[derive(Debug, Clone)]
pub struct EndpointConfig {
    pub url: Url,
    /// Wikimedia services reject requests without a descriptive user agent.
    pub user_agent: String,
    pub timeout: Option<Duration>,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        #[allow(clippy::expect_used, reason = "The endpoint constant is a valid URL")]
        let url = Url::parse(WIKIDATA_SPARQL_ENDPOINT).expect("valid endpoint URL");
        Self {
            url,
            user_agent: format!(
                "heritage-map/{} (https://github.com/heritage-map)",
                env!("CARGO_PKG_VERSION")
            ),
            timeout: None,
        }
    }
}

/// A SPARQL protocol endpoint reached over HTTP.
///
/// Queries are sent as URL-encoded `POST` bodies since the scoped queries can be long.
#[derive(Debug, Clone)]
pub struct HttpEndpoint {
    client: reqwest::Client,
    config: EndpointConfig,
}

impl HttpEndpoint {
    pub fn new(config: EndpointConfig) -> Result<Self, EndpointError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
            config,
        })
    }

    pub fn config(&self) -> &EndpointConfig {
        &self.config
    }
}

#[async_trait]
impl SparqlEndpoint for HttpEndpoint {
    async fn select(&self, query: &PlannedQuery) -> Result<Vec<QuerySolution>, EndpointError> {
        debug!(stage = %query.stage, endpoint = %self.config.url, "sending query");
        let response = self
            .client
            .post(self.config.url.clone())
            .header(ACCEPT, SPARQL_RESULTS_JSON)
            .header(USER_AGENT, &self.config.user_agent)
            .form(&[("query", query.text.as_str())])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(EndpointError::Status(response.status()));
        }

        let body = response.bytes().await?;
        let solutions = parse_solutions(&body)?;
        debug!(stage = %query.stage, rows = solutions.len(), "received solutions");
        Ok(solutions)
    }
}

/// Parses a SPARQL JSON results document into its solutions.
pub fn parse_solutions(body: &[u8]) -> Result<Vec<QuerySolution>, EndpointError> {
    match QueryResultsParser::from_format(QueryResultsFormat::Json).for_reader(body)? {
        ReaderQueryResultsParserOutput::Solutions(solutions) => {
            Ok(solutions.collect::<Result<Vec<_>, _>>()?)
        }
        ReaderQueryResultsParserOutput::Boolean(_) => Err(EndpointError::UnexpectedBoolean),
    }
}
