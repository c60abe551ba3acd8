use crate::{LanguageTag, SiteId, WIKIDATA_ENTITY_PREFIX};
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};

const FILE_PATH_MARKER: &str = "Special:FilePath/";

/// Characters escaped in wiki page paths. Slashes, parentheses and commas stay readable.
const WIKI_PATH: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'[')
    .add(b']')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}');

fn decode(text: &str) -> String {
    percent_decode_str(text).decode_utf8_lossy().into_owned()
}

/// Reduces a Commons `Special:FilePath` IRI to the decoded file name.
///
/// ```
/// use heritage_map_model::commons_file_name;
///
/// assert_eq!(
///     commons_file_name("http://commons.wikimedia.org/wiki/Special:FilePath/Rizal%20Shrine.jpg"),
///     Some("Rizal Shrine.jpg".to_owned())
/// );
/// ```
pub fn commons_file_name(image_iri: &str) -> Option<String> {
    let (_, encoded) = image_iri.rsplit_once(FILE_PATH_MARKER)?;
    (!encoded.is_empty()).then(|| decode(encoded))
}

/// Rewrites a `Special:FilePath` IRI (which serves the raw file) to the file's description page.
pub fn commons_file_page(scan_iri: &str) -> String {
    scan_iri.replacen(FILE_PATH_MARKER, "File:", 1)
}

/// The Wikipedia site IRI used as `schema:isPartOf` for articles in `language`.
pub fn wikipedia_site(language: &LanguageTag) -> String {
    format!("https://{language}.wikipedia.org/")
}

/// Extracts the decoded article title from a Wikipedia article URL in `language`.
///
/// ```
/// use heritage_map_model::{article_title_from_url, LanguageTag};
///
/// assert_eq!(
///     article_title_from_url(
///         "https://en.wikipedia.org/wiki/Fort_Santiago_%28Manila%29",
///         &LanguageTag::english()
///     ),
///     Some("Fort_Santiago_(Manila)".to_owned())
/// );
/// ```
pub fn article_title_from_url(url: &str, language: &LanguageTag) -> Option<String> {
    let prefix = format!("{}wiki/", wikipedia_site(language));
    let encoded = url.strip_prefix(&prefix)?;
    (!encoded.is_empty()).then(|| decode(encoded))
}

pub fn wikipedia_article_url(title: &str, language: &LanguageTag) -> String {
    format!(
        "{}wiki/{}",
        wikipedia_site(language),
        utf8_percent_encode(title, WIKI_PATH)
    )
}

pub fn commons_file_url(file_name: &str) -> String {
    format!(
        "https://commons.wikimedia.org/wiki/File:{}",
        utf8_percent_encode(file_name, WIKI_PATH)
    )
}

/// The human-facing Wikidata page of an item.
pub fn wikidata_page_url(id: &SiteId) -> String {
    format!("https://www.wikidata.org/wiki/{id}")
}

/// Turns an entity IRI into its human-facing Wikidata page.
pub fn wikidata_page_for_iri(iri: &str) -> String {
    match iri.strip_prefix(WIKIDATA_ENTITY_PREFIX) {
        Some(token) => format!("https://www.wikidata.org/wiki/{token}"),
        None => iri.to_owned(),
    }
}
