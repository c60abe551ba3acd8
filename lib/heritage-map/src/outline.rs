//! Site outlines from OpenStreetMap, looked up through the Overpass API.
//!
//! OpenStreetMap ways and relations link back to Wikidata with a `wikidata=<QID>` tag. The outline
//! of a site is the geometry of every way and relation carrying its identifier.

use crate::OutlineError;
use heritage_map_model::{Coordinates, SiteId};
use reqwest::header::USER_AGENT;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use tracing::debug;
use url::Url;

/// The public Overpass API instance.
pub const OVERPASS_API_URL: &str = "https://overpass-api.de/api/interpreter";

/// The Overpass QL query for the ways and relations tagged with `site`, followed by the ways and
/// nodes they are made of.
pub fn overpass_query(site: &SiteId) -> String {
    format!(
        "[out:json][timeout:25];(way[\"wikidata\"=\"{site}\"];relation[\"wikidata\"=\"{site}\"];);out body;>;out skel qt;"
    )
}

#[derive(Debug, Deserialize)]
struct OverpassResponse {
    #[serde(default)]
    elements: Vec<Element>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum Element {
    Node {
        id: u64,
        lat: f64,
        lon: f64,
    },
    Way {
        id: u64,
        #[serde(default)]
        nodes: Vec<u64>,
        #[serde(default)]
        tags: BTreeMap<String, String>,
    },
    Relation {
        id: u64,
        #[serde(default)]
        members: Vec<Member>,
        #[serde(default)]
        tags: BTreeMap<String, String>,
    },
}

#[derive(Debug, Deserialize)]
struct Member {
    #[serde(rename = "type")]
    kind: String,
    #[serde(rename = "ref")]
    id: u64,
}

/// The OpenStreetMap element type of an outline feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutlineKind {
    Way,
    Relation,
}

impl fmt::Display for OutlineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            Self::Way => "way",
            Self::Relation => "relation",
        })
    }
}

/// A way or relation tagged with the site's identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct OutlineFeature {
    pub kind: OutlineKind,
    pub osm_id: u64,
    pub name: Option<String>,
    /// The lines of the feature: the way itself, or every member way of a relation.
    pub paths: Vec<Vec<Coordinates>>,
}

impl OutlineFeature {
    pub fn osm_url(&self) -> String {
        format!("https://www.openstreetmap.org/{}/{}", self.kind, self.osm_id)
    }
}

/// The smallest box holding an outline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub south_west: Coordinates,
    pub north_east: Coordinates,
}

/// The OpenStreetMap geometry of a site.
#[derive(Debug, Clone, PartialEq)]
pub struct Outline {
    pub site: SiteId,
    pub features: Vec<OutlineFeature>,
}

impl Outline {
    /// Builds the outline of `site` from an Overpass JSON document.
    ///
    /// Returns [`None`] if no tagged way or relation has any geometry.
    pub fn from_overpass_json(site: &SiteId, body: &[u8]) -> Result<Option<Self>, OutlineError> {
        let response: OverpassResponse = serde_json::from_slice(body)?;
        Ok(Self::from_elements(site, &response.elements))
    }

    fn from_elements(site: &SiteId, elements: &[Element]) -> Option<Self> {
        let mut nodes = HashMap::new();
        let mut ways = HashMap::new();
        for element in elements {
            match element {
                Element::Node { id, lat, lon } => {
                    if let Ok(position) = Coordinates::new(*lat, *lon) {
                        nodes.insert(*id, position);
                    }
                }
                Element::Way { id, nodes: refs, .. } => {
                    let known = ways.entry(*id).or_insert(refs.as_slice());
                    if known.is_empty() {
                        *known = refs.as_slice();
                    }
                }
                Element::Relation { .. } => {}
            }
        }
        let path = |way: u64| -> Vec<Coordinates> {
            ways.get(&way)
                .map(|refs| refs.iter().filter_map(|node| nodes.get(node).copied()).collect())
                .unwrap_or_default()
        };
        let tagged = |tags: &BTreeMap<String, String>| {
            tags.get("wikidata").is_some_and(|qid| qid == site.as_str())
        };

        let features: Vec<_> = elements
            .iter()
            .filter_map(|element| {
                let (kind, id, tags, paths) = match element {
                    Element::Way { id, tags, .. } if tagged(tags) => {
                        (OutlineKind::Way, *id, tags, vec![path(*id)])
                    }
                    Element::Relation { id, members, tags } if tagged(tags) => {
                        let paths = members
                            .iter()
                            .filter(|member| member.kind == "way")
                            .map(|member| path(member.id))
                            .collect();
                        (OutlineKind::Relation, *id, tags, paths)
                    }
                    _ => return None,
                };
                let paths: Vec<_> = paths.into_iter().filter(|p| !p.is_empty()).collect();
                if paths.is_empty() {
                    debug!(%site, %kind, id, "ignoring an outline feature without geometry");
                    return None;
                }
                Some(OutlineFeature {
                    kind,
                    osm_id: id,
                    name: tags.get("name").cloned(),
                    paths,
                })
            })
            .collect();

        (!features.is_empty()).then(|| Self {
            site: site.clone(),
            features,
        })
    }

    /// The bounding box of every position of the outline.
    pub fn bounds(&self) -> Option<Bounds> {
        let mut positions = self
            .features
            .iter()
            .flat_map(|feature| feature.paths.iter().flatten())
            .copied();
        let first = positions.next()?;
        let (mut south_west, mut north_east) = (first, first);
        for position in positions {
            south_west.lat = south_west.lat.min(position.lat);
            south_west.lon = south_west.lon.min(position.lon);
            north_east.lat = north_east.lat.max(position.lat);
            north_east.lon = north_east.lon.max(position.lon);
        }
        Some(Bounds {
            south_west,
            north_east,
        })
    }
}

/// Looks up site outlines on an Overpass API instance.
#[derive(Debug, Clone)]
pub struct OutlineClient {
    client: reqwest::Client,
    api_url: Url,
    user_agent: String,
}

impl OutlineClient {
    /// A client of the public Overpass API instance.
    pub fn new(user_agent: impl Into<String>) -> Self {
        #[allow(clippy::expect_used, reason = "The Overpass constant is a valid URL")]
        let api_url = Url::parse(OVERPASS_API_URL).expect("valid Overpass URL");
        Self::with_api_url(api_url, user_agent)
    }

    pub fn with_api_url(api_url: Url, user_agent: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url,
            user_agent: user_agent.into(),
        }
    }

    /// The outline of `site`, or [`None`] if OpenStreetMap has no geometry tagged with it.
    pub async fn outline(&self, site: &SiteId) -> Result<Option<Outline>, OutlineError> {
        debug!(%site, "fetching outline");
        let response = self
            .client
            .post(self.api_url.clone())
            .header(USER_AGENT, &self.user_agent)
            .form(&[("data", overpass_query(site))])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(OutlineError::Status(response.status()));
        }

        let body = response.bytes().await?;
        Outline::from_overpass_json(site, &body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FORT_SANTIAGO: &str = r#"{
      "version": 0.6,
      "generator": "Overpass API",
      "elements": [
        {"type": "way", "id": 10, "nodes": [1, 2, 3, 1],
         "tags": {"name": "Fort Santiago", "wikidata": "Q1", "historic": "fort"}},
        {"type": "relation", "id": 20,
         "members": [
           {"type": "way", "ref": 11, "role": "outer"},
           {"type": "node", "ref": 1, "role": "label"},
           {"type": "way", "ref": 12, "role": "inner"}
         ],
         "tags": {"type": "multipolygon", "wikidata": "Q1"}},
        {"type": "way", "id": 11, "nodes": [1, 2, 4, 1]},
        {"type": "way", "id": 12, "nodes": [5, 6]},
        {"type": "node", "id": 1, "lat": 14.594, "lon": 120.970},
        {"type": "node", "id": 2, "lat": 14.596, "lon": 120.971},
        {"type": "node", "id": 3, "lat": 14.595, "lon": 120.968},
        {"type": "node", "id": 4, "lat": 14.597, "lon": 120.973}
      ]
    }"#;

    fn fort_santiago() -> SiteId {
        SiteId::new("Q1").unwrap()
    }

    #[test]
    fn query_targets_tagged_ways_and_relations() {
        assert_eq!(
            overpass_query(&fort_santiago()),
            "[out:json][timeout:25];(way[\"wikidata\"=\"Q1\"];relation[\"wikidata\"=\"Q1\"];);out body;>;out skel qt;"
        );
    }

    #[test]
    fn resolves_ways_and_relations() {
        let outline = Outline::from_overpass_json(&fort_santiago(), FORT_SANTIAGO.as_bytes())
            .unwrap()
            .unwrap();
        assert_eq!(outline.features.len(), 2);

        let way = &outline.features[0];
        assert_eq!(way.kind, OutlineKind::Way);
        assert_eq!(way.name.as_deref(), Some("Fort Santiago"));
        assert_eq!(way.paths.len(), 1);
        assert_eq!(way.paths[0].len(), 4);
        assert_eq!(way.osm_url(), "https://www.openstreetmap.org/way/10");

        let relation = &outline.features[1];
        assert_eq!(relation.kind, OutlineKind::Relation);
        assert_eq!(relation.name, None);
        // The inner way's nodes are missing from the document.
        assert_eq!(relation.paths.len(), 1);
        assert_eq!(
            relation.paths[0][2],
            Coordinates {
                lat: 14.597,
                lon: 120.973
            }
        );

        let bounds = outline.bounds().unwrap();
        assert_eq!(
            bounds.south_west,
            Coordinates {
                lat: 14.594,
                lon: 120.968
            }
        );
        assert_eq!(
            bounds.north_east,
            Coordinates {
                lat: 14.597,
                lon: 120.973
            }
        );
    }

    #[test]
    fn other_sites_have_no_outline() {
        let other = SiteId::new("Q2").unwrap();
        assert_eq!(
            Outline::from_overpass_json(&other, FORT_SANTIAGO.as_bytes()).unwrap(),
            None
        );
        let empty = br#"{"version": 0.6, "elements": []}"#;
        assert_eq!(
            Outline::from_overpass_json(&fort_santiago(), empty).unwrap(),
            None
        );
    }

    #[test]
    fn features_without_nodes_are_dropped() {
        let body = br#"{"elements": [
            {"type": "way", "id": 10, "nodes": [1, 2], "tags": {"wikidata": "Q1"}}
        ]}"#;
        assert_eq!(
            Outline::from_overpass_json(&fort_santiago(), body).unwrap(),
            None
        );
    }

    #[test]
    fn rejects_error_pages() {
        assert!(matches!(
            Outline::from_overpass_json(&fort_santiago(), b"<html>rate limited</html>"),
            Err(OutlineError::Response(_))
        ));
    }
}
