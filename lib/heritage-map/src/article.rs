//! Introductory extracts of Wikipedia articles.

use crate::ArticleError;
use heritage_map_model::LanguageTag;
use regex::Regex;
use reqwest::header::USER_AGENT;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::LazyLock;
use tracing::debug;
use url::Url;

#[allow(clippy::expect_used, reason = "The pattern is a valid regex")]
static PARAGRAPH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<p\b[^>]*>(.*?)</p>").expect("valid paragraph pattern"));

#[derive(Debug, Deserialize)]
struct ExtractResponse {
    query: ExtractQuery,
}

#[derive(Debug, Deserialize)]
struct ExtractQuery {
    #[serde(default)]
    pages: BTreeMap<String, ExtractPage>,
}

#[derive(Debug, Deserialize)]
struct ExtractPage {
    #[serde(default)]
    extract: Option<String>,
}

/// The first non-empty `<p>` element of an HTML fragment.
pub fn first_paragraph(html: &str) -> Option<&str> {
    PARAGRAPH
        .captures_iter(html)
        .find(|c| c.get(1).is_some_and(|inner| !inner.as_str().trim().is_empty()))
        .and_then(|c| c.get(0))
        .map(|m| m.as_str())
}

/// Fetches article extracts from the Wikipedia of one language.
#[derive(Debug, Clone)]
pub struct ArticleClient {
    client: reqwest::Client,
    api_url: Url,
    user_agent: String,
}

impl ArticleClient {
    pub fn new(language: &LanguageTag, user_agent: impl Into<String>) -> Result<Self, ArticleError> {
        Ok(Self {
            client: reqwest::Client::new(),
            api_url: Url::parse(&format!("https://{language}.wikipedia.org/w/api.php"))?,
            user_agent: user_agent.into(),
        })
    }

    /// The first paragraph of the introduction of the article `title`, following redirects.
    ///
    /// Returns [`None`] if the article does not exist or has no paragraph.
    pub async fn first_paragraph(&self, title: &str) -> Result<Option<String>, ArticleError> {
        debug!(title, "fetching article extract");
        let response = self
            .client
            .get(self.api_url.clone())
            .header(USER_AGENT, &self.user_agent)
            .query(&[
                ("action", "query"),
                ("format", "json"),
                ("prop", "extracts"),
                ("exintro", "1"),
                ("redirects", "1"),
                ("titles", title),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ArticleError::Status(response.status()));
        }

        let body = response.bytes().await?;
        Ok(paragraph_from_response(&body)?)
    }
}

fn paragraph_from_response(body: &[u8]) -> Result<Option<String>, serde_json::Error> {
    let response: ExtractResponse = serde_json::from_slice(body)?;
    Ok(response
        .query
        .pages
        .into_values()
        .find_map(|page| page.extract)
        .and_then(|extract| first_paragraph(&extract).map(str::to_owned)))
}
