//! A map of Philippine heritage sites built from Wikidata.
//!
//! A [`Session`] runs the staged queries of [`heritage_map_sparql::QueryPlan`] against a
//! [`SparqlEndpoint`](heritage_map_sparql::SparqlEndpoint), merges the rows into a
//! [`RecordStore`] and keeps a [`DesignationIndex`] of the store current. Presentation layers
//! observe the session through [`PresentationAdapter`] and read [`FilterMenu`] and
//! [`SiteDetails`] views.
//!
//! ```no_run
//! use heritage_map::{DesignationCatalog, LanguageTag, Session};
//! use heritage_map_sparql::{EndpointConfig, HttpEndpoint};
//!
//! # async fn load() -> Result<(), Box<dyn std::error::Error>> {
//! let endpoint = HttpEndpoint::new(EndpointConfig::default())?;
//! let catalog = DesignationCatalog::philippine();
//! let mut session = Session::new(endpoint, catalog, LanguageTag::english());
//! session.load(&mut ()).await?;
//! println!("{} sites", session.store().len());
//! # Ok(())
//! # }
//! ```

mod article;
mod error;
mod index;
mod outline;
mod session;
mod store;
mod views;

pub use article::{first_paragraph, ArticleClient};
pub use error::{ArticleError, OutlineError, ReconcileError, SessionError};
pub use index::{DesignationIndex, FacetKey, IndexEntry, ListItem};
pub use outline::{
    overpass_query, Bounds, Outline, OutlineClient, OutlineFeature, OutlineKind, OVERPASS_API_URL,
};
pub use session::{LoadReport, PresentationAdapter, Session, Snapshot, StageOutcome};
pub use store::RecordStore;
pub use views::{DeclarationView, DesignationView, FilterGroup, FilterMenu, FilterOption, SiteDetails};

pub use heritage_map_model::{DesignationCatalog, LanguageTag};
