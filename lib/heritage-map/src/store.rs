//! The record store and the reconciliation of query rows into site records.
//!
//! Every `apply_*` method is idempotent: applying the same row twice leaves the store as applying
//! it once. Optional fields are written by the first row that carries them.

use crate::ReconcileError;
use heritage_map_model::{
    fill_once, DesignationCatalog, DesignationTypeId, SiteId, SiteRecord, SiteTitle,
};
use heritage_map_sparql::{
    CoordinatesRow, DesignationDetailsRow, DiscoveryRow, MediaRow, PartBinding,
};
use indexmap::{IndexMap, IndexSet};
use tracing::debug;

/// All site records of a session, in discovery order.
#[derive(Debug, Clone, Default)]
pub struct RecordStore {
    records: IndexMap<SiteId, SiteRecord>,
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&SiteRecord> {
        self.records.get(id)
    }

    /// Looks up the record named by a permalink fragment such as `#Q1153`.
    pub fn record_for_fragment(&self, fragment: &str) -> Option<&SiteRecord> {
        self.get(fragment.strip_prefix('#').unwrap_or(fragment))
    }

    pub fn records(&self) -> impl Iterator<Item = &SiteRecord> {
        self.records.values()
    }

    pub fn ids(&self) -> impl Iterator<Item = &SiteId> {
        self.records.keys()
    }

    /// The ids of every site listed as a member of a compound site.
    pub fn member_ids(&self) -> IndexSet<&SiteId> {
        self.records.values().flat_map(SiteRecord::members).collect()
    }

    /// The ids of the sites that are not members of a compound site.
    ///
    /// Members are located through the coordinate statements of their parent.
    pub fn non_member_ids(&self) -> Vec<&SiteId> {
        let members = self.member_ids();
        self.ids().filter(|id| !members.contains(id)).collect()
    }

    /// Merges a discovery row: creates the site, adds the designation to its skeleton and links
    /// the member named by the row, if any.
    ///
    /// Returns whether the store changed.
    pub fn apply_discovery(
        &mut self,
        row: DiscoveryRow,
        catalog: &DesignationCatalog,
    ) -> Result<bool, ReconcileError> {
        let type_id = resolve(catalog, &row.site, &row.designation)?;
        let title = SiteTitle::from_label(row.label.as_deref(), &row.site);

        let mut changed = false;
        let record = self.records.entry(row.site.clone()).or_insert_with(|| {
            changed = true;
            if row.part.is_some() {
                SiteRecord::new_compound(row.site.clone(), title.clone())
            } else {
                SiteRecord::new_simple(row.site.clone(), title.clone())
            }
        });
        changed |= record.upgrade_title(title);
        if !record.designations.contains_key(&type_id) {
            record.designation_entry(&type_id);
            changed = true;
        }

        if let Some(part) = &row.part {
            changed |= self.link_member(&row.site, part, &[type_id]);
        }
        Ok(changed)
    }

    /// Merges a coordinates row into the site, or into the member it names.
    ///
    /// A member named here is linked even if its position cannot be parsed. A compound site never
    /// takes a position of its own.
    pub fn apply_coordinates(&mut self, row: CoordinatesRow) -> Result<bool, ReconcileError> {
        let parent = self
            .records
            .get(&row.site)
            .ok_or_else(|| ReconcileError::UnknownSite(row.site.clone()))?;

        let (mut changed, target) = match &row.part {
            Some(part) => {
                let types = parent.designations.keys().cloned().collect::<Vec<_>>();
                (self.link_member(&row.site, part, &types), &part.site)
            }
            None => (false, &row.site),
        };

        let coordinates = row.coordinates.map_err(|source| ReconcileError::Coordinates {
            site: target.clone(),
            source,
        })?;
        if let Some(record) = self.records.get_mut(target) {
            if record.is_compound() {
                debug!(site = %target, "ignoring the own position of a compound site");
            } else {
                changed |= record.fill_coordinates(coordinates);
            }
        }
        Ok(changed)
    }

    /// Merges a designation details row into the matching designation of the site.
    ///
    /// The declaration date also fills in the same designation of the site's members.
    pub fn apply_designation_details(
        &mut self,
        row: DesignationDetailsRow,
        catalog: &DesignationCatalog,
    ) -> Result<bool, ReconcileError> {
        let type_id = resolve(catalog, &row.site, &row.designation)?;
        let record = self
            .records
            .get_mut(&row.site)
            .ok_or_else(|| ReconcileError::UnknownSite(row.site.clone()))?;
        let designation = record.designations.get_mut(&type_id).ok_or_else(|| {
            ReconcileError::DesignationNotDiscovered {
                site: row.site.clone(),
                designation: type_id.clone(),
            }
        })?;

        let mut changed = fill_once(&mut designation.declared, row.declared);
        changed |= fill_once(&mut designation.declaration, row.declaration);
        changed |= fill_once(&mut designation.declaration_title, row.declaration_title);
        changed |= fill_once(&mut designation.declaration_scan_url, row.declaration_scan_url);
        changed |= fill_once(&mut designation.declaration_text_url, row.declaration_text_url);

        if let Some(declared) = row.declared {
            let members = record.members().to_vec();
            for member in &members {
                let designation = self
                    .records
                    .get_mut(member)
                    .and_then(|m| m.designations.get_mut(&type_id));
                if let Some(designation) = designation {
                    changed |= fill_once(&mut designation.declared, Some(declared));
                }
            }
        }
        Ok(changed)
    }

    pub fn apply_media(&mut self, row: MediaRow) -> Result<bool, ReconcileError> {
        let record = self
            .records
            .get_mut(&row.site)
            .ok_or_else(|| ReconcileError::UnknownSite(row.site.clone()))?;
        let mut changed = fill_once(&mut record.image_filename, row.image_filename);
        changed |= fill_once(&mut record.article_title, row.article_title);
        Ok(changed)
    }

    /// Makes `parent` a compound site listing the member, creating the member record if needed,
    /// and marks the member's designations of `types` as part of `parent`.
    fn link_member(
        &mut self,
        parent: &SiteId,
        part: &PartBinding,
        types: &[DesignationTypeId],
    ) -> bool {
        if part.site == *parent {
            debug!(site = %parent, "ignoring a site listed as its own part");
            return false;
        }

        let mut changed = false;
        let parent_title = match self.records.get_mut(parent) {
            Some(record) => {
                if let Some(dropped) = record.make_compound() {
                    debug!(site = %parent, ?dropped, "site has parts, dropping its own position");
                }
                changed |= record.add_member(&part.site);
                record.title.clone()
            }
            None => return false,
        };

        let label = part.label.clone().or_else(|| match parent_title {
            SiteTitle::Label(label) => Some(label),
            SiteTitle::Placeholder(_) => None,
        });
        let title = SiteTitle::from_label(label.as_deref(), &part.site);
        let member = self.records.entry(part.site.clone()).or_insert_with(|| {
            changed = true;
            SiteRecord::new_simple(part.site.clone(), title.clone())
        });
        changed |= member.upgrade_title(title);
        for type_id in types {
            let designation = member.designation_entry(type_id);
            if designation.part_of.as_ref() != Some(parent) {
                designation.part_of = Some(parent.clone());
                changed = true;
            }
        }
        changed
    }
}

impl FromIterator<SiteRecord> for RecordStore {
    /// Collects records keyed by their id. A later record replaces an earlier one with the same id.
    fn from_iter<I: IntoIterator<Item = SiteRecord>>(records: I) -> Self {
        Self {
            records: records
                .into_iter()
                .map(|record| (record.id.clone(), record))
                .collect(),
        }
    }
}

fn resolve(
    catalog: &DesignationCatalog,
    site: &SiteId,
    designation: &DesignationTypeId,
) -> Result<DesignationTypeId, ReconcileError> {
    catalog
        .resolve(designation.as_str())
        .cloned()
        .ok_or_else(|| ReconcileError::UnknownDesignation {
            site: site.clone(),
            designation: designation.clone(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use heritage_map_model::{Coordinates, Jurisdiction, PartialDate};

    const LANDMARK: &str = "Q23677505";
    const WORLD_HERITAGE: &str = "Q9259";

    fn site(token: &str) -> SiteId {
        SiteId::new(token).unwrap()
    }

    fn designation(token: &str) -> DesignationTypeId {
        DesignationTypeId::new(token).unwrap()
    }

    fn discovery(site_token: &str, label: Option<&str>, type_token: &str) -> DiscoveryRow {
        DiscoveryRow {
            site: site(site_token),
            label: label.map(str::to_owned),
            designation: designation(type_token),
            part: None,
        }
    }

    fn with_part(mut row: DiscoveryRow, part: &str, label: Option<&str>) -> DiscoveryRow {
        row.part = Some(PartBinding {
            site: site(part),
            label: label.map(str::to_owned),
        });
        row
    }

    fn coordinates(site_token: &str, lat: f64, lon: f64) -> CoordinatesRow {
        CoordinatesRow {
            site: site(site_token),
            coordinates: Ok(Coordinates { lat, lon }),
            part: None,
        }
    }

    fn details(site_token: &str, type_token: &str) -> DesignationDetailsRow {
        DesignationDetailsRow {
            site: site(site_token),
            designation: designation(type_token),
            declared: None,
            declaration: None,
            declaration_title: None,
            declaration_scan_url: None,
            declaration_text_url: None,
        }
    }

    #[test]
    fn discovery_is_idempotent() {
        let catalog = DesignationCatalog::philippine();
        let mut store = RecordStore::new();
        let row = discovery("Q1", Some("Fort Santiago"), LANDMARK);
        assert!(store.apply_discovery(row.clone(), &catalog).unwrap());
        let snapshot = store.clone();
        assert!(!store.apply_discovery(row, &catalog).unwrap());
        assert_eq!(store.records().collect::<Vec<_>>(), snapshot.records().collect::<Vec<_>>());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn unknown_designations_are_skipped() {
        let catalog = DesignationCatalog::philippine();
        let mut store = RecordStore::new();
        let error = store
            .apply_discovery(discovery("Q1", Some("Somewhere"), "Q5"), &catalog)
            .unwrap_err();
        assert!(matches!(error, ReconcileError::UnknownDesignation { .. }));
        assert!(store.is_empty());
    }

    #[test]
    fn aliases_resolve_to_one_designation() {
        let catalog = DesignationCatalog::builder()
            .organization("NHCP", "National Historical Commission of the Philippines")
            .designation(designation("Q10"), "NHCP", "Landmark", 101, Jurisdiction::National)
            .alias(designation("Q11"), designation("Q10"))
            .build()
            .unwrap();
        let mut store = RecordStore::new();
        store
            .apply_discovery(discovery("Q1", Some("Site"), "Q10"), &catalog)
            .unwrap();
        store
            .apply_discovery(discovery("Q1", Some("Site"), "Q11"), &catalog)
            .unwrap();
        let record = store.get("Q1").unwrap();
        assert_eq!(record.designations.len(), 1);
        assert!(record.designations.contains_key("Q10"));
    }

    #[test]
    fn placeholder_titles_are_upgraded() {
        let catalog = DesignationCatalog::philippine();
        let mut store = RecordStore::new();
        store
            .apply_discovery(discovery("Q1", None, LANDMARK), &catalog)
            .unwrap();
        assert_eq!(store.get("Q1").unwrap().title.as_str(), "[untitled Q1]");
        store
            .apply_discovery(discovery("Q1", Some("Rizal Shrine"), WORLD_HERITAGE), &catalog)
            .unwrap();
        assert_eq!(store.get("Q1").unwrap().title.as_str(), "Rizal Shrine");
    }

    #[test]
    fn compound_sites_link_members() {
        let catalog = DesignationCatalog::philippine();
        let mut store = RecordStore::new();
        let row = with_part(
            discovery("Q1", Some("Baroque Churches"), WORLD_HERITAGE),
            "Q2",
            Some("Paoay Church"),
        );
        store.apply_discovery(row.clone(), &catalog).unwrap();
        store.apply_discovery(row, &catalog).unwrap();
        store
            .apply_discovery(
                with_part(discovery("Q1", Some("Baroque Churches"), WORLD_HERITAGE), "Q3", None),
                &catalog,
            )
            .unwrap();

        let parent = store.get("Q1").unwrap();
        assert!(parent.is_compound());
        assert_eq!(parent.members(), &[site("Q2"), site("Q3")]);
        let member = store.get("Q2").unwrap();
        assert!(!member.is_compound());
        assert_eq!(member.title.as_str(), "Paoay Church");
        assert_eq!(member.designations[WORLD_HERITAGE].part_of, Some(site("Q1")));
        assert_eq!(store.get("Q3").unwrap().title.as_str(), "Baroque Churches");
        assert_eq!(store.non_member_ids(), vec![&site("Q1")]);
    }

    #[test]
    fn simple_sites_become_compound() {
        let catalog = DesignationCatalog::philippine();
        let mut store = RecordStore::new();
        store
            .apply_discovery(discovery("Q1", Some("Rice Terraces"), WORLD_HERITAGE), &catalog)
            .unwrap();
        store.apply_coordinates(coordinates("Q1", 16.9, 121.1)).unwrap();
        store
            .apply_discovery(
                with_part(discovery("Q1", Some("Rice Terraces"), WORLD_HERITAGE), "Q2", None),
                &catalog,
            )
            .unwrap();
        let parent = store.get("Q1").unwrap();
        assert!(parent.is_compound());
        assert_eq!(parent.coordinates(), None);
    }

    #[test]
    fn coordinates_locate_sites_and_members() {
        let catalog = DesignationCatalog::philippine();
        let mut store = RecordStore::new();
        store
            .apply_discovery(discovery("Q1", Some("Intramuros"), LANDMARK), &catalog)
            .unwrap();
        store
            .apply_discovery(
                with_part(discovery("Q5", Some("Baroque Churches"), WORLD_HERITAGE), "Q6", None),
                &catalog,
            )
            .unwrap();

        assert!(store.apply_coordinates(coordinates("Q1", 14.59, 120.97)).unwrap());
        assert!(!store.apply_coordinates(coordinates("Q1", 0.0, 0.0)).unwrap());
        assert!(!store.apply_coordinates(coordinates("Q5", 15.0, 120.0)).unwrap());
        let mut member_row = coordinates("Q5", 18.06, 120.52);
        member_row.part = Some(PartBinding {
            site: site("Q6"),
            label: None,
        });
        assert!(store.apply_coordinates(member_row).unwrap());

        assert_eq!(
            store.get("Q1").unwrap().coordinates(),
            Some(Coordinates { lat: 14.59, lon: 120.97 })
        );
        assert_eq!(store.get("Q5").unwrap().coordinates(), None);
        assert_eq!(
            store.get("Q6").unwrap().coordinates(),
            Some(Coordinates { lat: 18.06, lon: 120.52 })
        );
    }

    #[test]
    fn invalid_points_leave_sites_unlocated() {
        let catalog = DesignationCatalog::philippine();
        let mut store = RecordStore::new();
        store
            .apply_discovery(discovery("Q1", Some("Intramuros"), LANDMARK), &catalog)
            .unwrap();
        let row = CoordinatesRow {
            site: site("Q1"),
            coordinates: Coordinates::from_wkt("Point(abc 14.6)"),
            part: None,
        };
        assert!(matches!(
            store.apply_coordinates(row),
            Err(ReconcileError::Coordinates { .. })
        ));
        assert_eq!(store.get("Q1").unwrap().coordinates(), None);
        assert!(matches!(
            store.apply_coordinates(coordinates("Q9", 1.0, 1.0)),
            Err(ReconcileError::UnknownSite(_))
        ));
    }

    #[test]
    fn details_fill_each_field_once() {
        let catalog = DesignationCatalog::philippine();
        let mut store = RecordStore::new();
        store
            .apply_discovery(discovery("Q1", Some("Intramuros"), LANDMARK), &catalog)
            .unwrap();
        let mut first = details("Q1", LANDMARK);
        first.declared = Some(PartialDate::parse("+1951-01-01T00:00:00Z", 9).unwrap());
        let mut second = details("Q1", LANDMARK);
        second.declared = Some(PartialDate::parse("+1972-05-16T00:00:00Z", 11).unwrap());
        second.declaration_title = Some("Resolution No. 1".to_owned());

        assert!(store.apply_designation_details(first, &catalog).unwrap());
        assert!(store.apply_designation_details(second, &catalog).unwrap());
        let designation = &store.get("Q1").unwrap().designations[LANDMARK];
        assert_eq!(designation.declared.map(|d| d.to_string()), Some("1951".to_owned()));
        assert_eq!(designation.declaration_title.as_deref(), Some("Resolution No. 1"));
    }

    #[test]
    fn details_for_undiscovered_designations_are_skipped() {
        let catalog = DesignationCatalog::philippine();
        let mut store = RecordStore::new();
        store
            .apply_discovery(discovery("Q1", Some("Intramuros"), LANDMARK), &catalog)
            .unwrap();
        assert!(matches!(
            store.apply_designation_details(details("Q1", WORLD_HERITAGE), &catalog),
            Err(ReconcileError::DesignationNotDiscovered { .. })
        ));
        assert!(!store.get("Q1").unwrap().designations.contains_key(WORLD_HERITAGE));
    }

    #[test]
    fn declaration_dates_reach_members() {
        let catalog = DesignationCatalog::philippine();
        let mut store = RecordStore::new();
        store
            .apply_discovery(
                with_part(discovery("Q1", Some("Baroque Churches"), WORLD_HERITAGE), "Q2", None),
                &catalog,
            )
            .unwrap();
        let mut row = details("Q1", WORLD_HERITAGE);
        row.declared = Some(PartialDate::parse("+1993-01-01T00:00:00Z", 9).unwrap());
        store.apply_designation_details(row, &catalog).unwrap();
        let member = &store.get("Q2").unwrap().designations[WORLD_HERITAGE];
        assert_eq!(member.declared.map(|d| d.to_string()), Some("1993".to_owned()));
    }

    #[test]
    fn media_and_fragments() {
        let catalog = DesignationCatalog::philippine();
        let mut store = RecordStore::new();
        store
            .apply_discovery(discovery("Q1", Some("Intramuros"), LANDMARK), &catalog)
            .unwrap();
        let row = MediaRow {
            site: site("Q1"),
            image_filename: Some("Intramuros.jpg".to_owned()),
            article_title: Some("Intramuros".to_owned()),
        };
        assert!(store.apply_media(row.clone()).unwrap());
        assert!(!store.apply_media(row).unwrap());
        let record = store.record_for_fragment("#Q1").unwrap();
        assert_eq!(record.image_filename.as_deref(), Some("Intramuros.jpg"));
        assert!(store.record_for_fragment("#Q2").is_none());
    }
}
