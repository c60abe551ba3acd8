use crate::{Coordinates, DesignationTypeId, DocumentId, PartialDate, SiteId};
use indexmap::IndexMap;
use std::fmt;

/// Sets `slot` to `value` unless it is already set. Returns whether `slot` changed.
pub fn fill_once<T>(slot: &mut Option<T>, value: Option<T>) -> bool {
    match (slot.is_none(), value) {
        (true, Some(value)) => {
            *slot = Some(value);
            true
        }
        _ => false,
    }
}

/// A heritage status held by a site.
///
/// Every optional field is written at most once; later values for an already set field are
/// ignored. Only [`Designation::part_of`] is overwritten by the compound-site merge.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Designation {
    pub declared: Option<PartialDate>,
    pub declaration: Option<DocumentId>,
    pub declaration_title: Option<String>,
    pub declaration_scan_url: Option<String>,
    pub declaration_text_url: Option<String>,
    pub part_of: Option<SiteId>,
}

impl Designation {
    /// Whether anything is known about the declaration beyond the designation itself.
    pub fn has_declaration(&self) -> bool {
        self.declaration.is_some() || self.declaration_title.is_some()
    }
}

/// The title of a site, or a placeholder if the source has no label for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SiteTitle {
    Label(String),
    Placeholder(String),
}

impl SiteTitle {
    /// Uses `label` if it is present and not blank, else a placeholder naming `id`.
    pub fn from_label(label: Option<&str>, id: &SiteId) -> Self {
        match label.map(str::trim) {
            Some(label) if !label.is_empty() => Self::Label(label.to_owned()),
            _ => Self::Placeholder(format!("[untitled {id}]")),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Label(text) | Self::Placeholder(text) => text,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, Self::Placeholder(_))
    }
}

impl fmt::Display for SiteTitle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Distinguishes sites located by a single point from sites made of located members.
#[derive(Debug, Clone, PartialEq)]
pub enum SiteKind {
    Simple { coordinates: Option<Coordinates> },
    Compound { members: Vec<SiteId> },
}

/// Everything known about one heritage site.
#[derive(Debug, Clone, PartialEq)]
pub struct SiteRecord {
    pub id: SiteId,
    pub title: SiteTitle,
    pub kind: SiteKind,
    pub image_filename: Option<String>,
    pub article_title: Option<String>,
    pub designations: IndexMap<DesignationTypeId, Designation>,
}

impl SiteRecord {
    pub fn new_simple(id: SiteId, title: SiteTitle) -> Self {
        Self::new(id, title, SiteKind::Simple { coordinates: None })
    }

    pub fn new_compound(id: SiteId, title: SiteTitle) -> Self {
        Self::new(
            id,
            title,
            SiteKind::Compound {
                members: Vec::new(),
            },
        )
    }

    fn new(id: SiteId, title: SiteTitle, kind: SiteKind) -> Self {
        Self {
            id,
            title,
            kind,
            image_filename: None,
            article_title: None,
            designations: IndexMap::new(),
        }
    }

    pub fn is_compound(&self) -> bool {
        matches!(self.kind, SiteKind::Compound { .. })
    }

    /// The position of a simple site. Compound sites are only located through their members.
    pub fn coordinates(&self) -> Option<Coordinates> {
        match &self.kind {
            SiteKind::Simple { coordinates } => *coordinates,
            SiteKind::Compound { .. } => None,
        }
    }

    pub fn members(&self) -> &[SiteId] {
        match &self.kind {
            SiteKind::Simple { .. } => &[],
            SiteKind::Compound { members } => members,
        }
    }

    /// Replaces a placeholder title. Returns whether the title changed.
    pub fn upgrade_title(&mut self, title: SiteTitle) -> bool {
        if self.title.is_placeholder() && !title.is_placeholder() {
            self.title = title;
            true
        } else {
            false
        }
    }

    /// Sets the position of a simple site unless it already has one.
    ///
    /// Returns whether the position changed. Compound sites never take a position.
    pub fn fill_coordinates(&mut self, value: Coordinates) -> bool {
        match &mut self.kind {
            SiteKind::Simple { coordinates } => fill_once(coordinates, Some(value)),
            SiteKind::Compound { .. } => false,
        }
    }

    /// Turns a simple site into a compound one, dropping its own position.
    ///
    /// Returns the dropped position, if any.
    pub fn make_compound(&mut self) -> Option<Coordinates> {
        match self.kind {
            SiteKind::Simple { coordinates } => {
                self.kind = SiteKind::Compound {
                    members: Vec::new(),
                };
                coordinates
            }
            SiteKind::Compound { .. } => None,
        }
    }

    /// Appends a member to a compound site unless it is already listed.
    ///
    /// Returns whether the member list changed.
    pub fn add_member(&mut self, member: &SiteId) -> bool {
        match &mut self.kind {
            SiteKind::Compound { members } if !members.contains(member) => {
                members.push(member.clone());
                true
            }
            _ => false,
        }
    }

    /// The designation of the given canonical type, created empty if absent.
    pub fn designation_entry(&mut self, type_id: &DesignationTypeId) -> &mut Designation {
        self.designations.entry(type_id.clone()).or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn site(token: &str) -> SiteId {
        SiteId::new(token).unwrap()
    }

    #[test]
    fn fill_once_keeps_first_value() {
        let mut slot = None;
        assert!(fill_once(&mut slot, Some(1)));
        assert!(!fill_once(&mut slot, Some(2)));
        assert!(!fill_once(&mut slot, None));
        assert_eq!(slot, Some(1));
    }

    #[test]
    fn blank_labels_become_placeholders() {
        let id = site("Q7");
        assert_eq!(
            SiteTitle::from_label(Some("  "), &id),
            SiteTitle::Placeholder("[untitled Q7]".to_owned())
        );
        assert_eq!(
            SiteTitle::from_label(None, &id).as_str(),
            "[untitled Q7]"
        );
        assert_eq!(
            SiteTitle::from_label(Some("Intramuros"), &id),
            SiteTitle::Label("Intramuros".to_owned())
        );
    }

    #[test]
    fn labels_replace_placeholders_only() {
        let id = site("Q7");
        let mut record = SiteRecord::new_simple(id.clone(), SiteTitle::from_label(None, &id));
        assert!(record.upgrade_title(SiteTitle::Label("Paoay Church".to_owned())));
        assert!(!record.upgrade_title(SiteTitle::Label("Other".to_owned())));
        assert_eq!(record.title.as_str(), "Paoay Church");
    }

    #[test]
    fn compound_sites_have_no_coordinates() {
        let id = site("Q1");
        let mut record = SiteRecord::new_compound(id, SiteTitle::Label("Baroque Churches".to_owned()));
        assert!(!record.fill_coordinates(Coordinates { lat: 1.0, lon: 2.0 }));
        assert_eq!(record.coordinates(), None);
        assert!(record.add_member(&site("Q2")));
        assert!(!record.add_member(&site("Q2")));
        assert_eq!(record.members(), &[site("Q2")]);
    }

    #[test]
    fn promotion_drops_position() {
        let id = site("Q1");
        let mut record = SiteRecord::new_simple(id, SiteTitle::Label("Site".to_owned()));
        let point = Coordinates { lat: 1.0, lon: 2.0 };
        assert!(record.fill_coordinates(point));
        assert_eq!(record.make_compound(), Some(point));
        assert!(record.is_compound());
        assert_eq!(record.make_compound(), None);
    }
}
