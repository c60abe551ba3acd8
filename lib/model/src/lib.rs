//! The data model of the heritage map: identifiers, positions, partial dates, the designation
//! catalog and site records.

pub mod catalog;
mod date;
mod error;
mod geo;
mod id;
mod links;
mod record;

pub use catalog::{
    CatalogBuilder, CatalogError, CatalogGroup, DesignationCatalog, DesignationType, Jurisdiction,
    Organization,
};
pub use date::*;
pub use error::*;
pub use geo::*;
pub use id::*;
pub use links::*;
pub use record::*;

// Re-export the oxrdf term types that identifiers are extracted from.
pub use oxrdf::{Literal, LiteralRef, NamedNode, NamedNodeRef, Term, TermRef};
