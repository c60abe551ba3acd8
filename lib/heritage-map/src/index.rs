//! The faceted index over the record store.
//!
//! The index is rebuilt from scratch whenever the store changes, so it never drifts from the
//! records it describes.

use crate::RecordStore;
use heritage_map_model::{DesignationCatalog, DesignationTypeId, OrganizationId, SiteId};
use indexmap::{IndexMap, IndexSet};
use std::fmt;

/// A dimension along which sites are filtered.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FacetKey {
    All,
    Type(DesignationTypeId),
    Organization(OrganizationId),
}

impl FacetKey {
    /// Parses `all`, a designation type or an organization id known to `catalog`.
    ///
    /// Aliased types resolve to their canonical type.
    pub fn parse(key: &str, catalog: &DesignationCatalog) -> Option<Self> {
        if key.eq_ignore_ascii_case("all") {
            return Some(Self::All);
        }
        if let Some(type_id) = catalog.resolve(key) {
            return Some(Self::Type(type_id.clone()));
        }
        catalog
            .organization(key)
            .map(|organization| Self::Organization(organization.id.clone()))
    }
}

impl fmt::Display for FacetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.pad("all"),
            Self::Type(id) => fmt::Display::fmt(id, f),
            Self::Organization(id) => fmt::Display::fmt(id, f),
        }
    }
}

/// A site as listed in a facet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListItem {
    pub site: SiteId,
    pub label: String,
}

/// The aggregate of one facet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexEntry {
    pub total_count: usize,
    /// The sites of the facet that can be drawn on the map, in discovery order.
    pub marker_site_ids: Vec<SiteId>,
    /// The sites of the facet sorted by label. Equal labels keep discovery order.
    pub list_items: Vec<ListItem>,
}

/// Counts and memberships of every facet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DesignationIndex {
    entries: IndexMap<FacetKey, IndexEntry>,
}

impl DesignationIndex {
    /// Computes the index of the current state of `store`.
    ///
    /// Every canonical type and every organization of `catalog` gets an entry, even if empty. A
    /// site is counted once per facet, whatever the number of its designations in that facet.
    pub fn build(store: &RecordStore, catalog: &DesignationCatalog) -> Self {
        let mut entries = IndexMap::new();
        entries.insert(FacetKey::All, IndexEntry::default());
        for type_id in catalog.canonical_type_ids() {
            entries.insert(FacetKey::Type(type_id.clone()), IndexEntry::default());
        }
        for organization in catalog.organizations() {
            entries.insert(
                FacetKey::Organization(organization.id.clone()),
                IndexEntry::default(),
            );
        }

        for record in store.records() {
            if record.designations.is_empty() {
                continue;
            }

            let mut facets = IndexSet::new();
            facets.insert(FacetKey::All);
            for type_id in record.designations.keys() {
                let Some(metadata) = catalog
                    .resolve(type_id.as_str())
                    .and_then(|canonical| catalog.metadata(canonical.as_str()))
                else {
                    continue;
                };
                facets.insert(FacetKey::Type(metadata.id.clone()));
                facets.insert(FacetKey::Organization(metadata.organization.clone()));
            }

            let has_marker = record.coordinates().is_some();
            for facet in facets {
                let entry = entries.entry(facet).or_default();
                entry.total_count += 1;
                if has_marker {
                    entry.marker_site_ids.push(record.id.clone());
                }
                entry.list_items.push(ListItem {
                    site: record.id.clone(),
                    label: record.title.to_string(),
                });
            }
        }

        for entry in entries.values_mut() {
            entry.list_items.sort_by(|a, b| a.label.cmp(&b.label));
        }
        Self { entries }
    }

    pub fn get(&self, facet: &FacetKey) -> Option<&IndexEntry> {
        self.entries.get(facet)
    }

    /// The entry of the `all` facet.
    pub fn all(&self) -> Option<&IndexEntry> {
        self.get(&FacetKey::All)
    }

    /// The number of sites in a facet, zero for facets the index does not know.
    pub fn count(&self, facet: &FacetKey) -> usize {
        self.get(facet).map_or(0, |entry| entry.total_count)
    }

    pub fn entries(&self) -> impl Iterator<Item = (&FacetKey, &IndexEntry)> {
        self.entries.iter()
    }
}
