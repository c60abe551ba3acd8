//! The static catalog of recognized designation types and the organizations conferring them.
//!
//! A designation type may be an *alias* of another one. Aliases are recognized when discovering
//! sites but are always resolved to their canonical type before they are used as a key.

use crate::{DesignationTypeId, OrganizationId};
use indexmap::IndexMap;
use thiserror::Error;

/// Whether a designation is conferred by a Philippine body or by an international one.
///
/// National designations are only ever held by Philippine sites. International ones are restricted
/// to sites located in the Philippines when querying.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Jurisdiction {
    National,
    International,
}

/// An organization conferring designations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Organization {
    pub id: OrganizationId,
    pub full_name: String,
}

/// A designation type known to the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesignationType {
    pub id: DesignationTypeId,
    pub organization: OrganizationId,
    pub name: String,
    pub sort_order: u32,
    pub jurisdiction: Jurisdiction,
    pub alias_of: Option<DesignationTypeId>,
}

/// A run of consecutive canonical types belonging to one organization, in sort order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogGroup<'catalog> {
    pub organization: &'catalog Organization,
    pub types: Vec<&'catalog DesignationType>,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("designation type {0} is declared twice")]
    DuplicateType(DesignationTypeId),
    #[error("designation type {type_id} refers to unknown organization {organization}")]
    UnknownOrganization {
        type_id: DesignationTypeId,
        organization: OrganizationId,
    },
    #[error("designation type {type_id} is an alias of unknown type {target}")]
    UnknownAliasTarget {
        type_id: DesignationTypeId,
        target: DesignationTypeId,
    },
    #[error("designation type {type_id} is an alias of {target}, which is itself an alias")]
    ChainedAlias {
        type_id: DesignationTypeId,
        target: DesignationTypeId,
    },
}

/// Lookup of designation types and organizations.
#[derive(Debug, Clone)]
pub struct DesignationCatalog {
    organizations: IndexMap<OrganizationId, Organization>,
    types: IndexMap<DesignationTypeId, DesignationType>,
    canonical_order: Vec<DesignationTypeId>,
}

impl DesignationCatalog {
    pub fn builder() -> CatalogBuilder {
        CatalogBuilder::default()
    }

    /// The designations tracked by the Encyclopedia of Philippine Heritage.
    pub fn philippine() -> Self {
        use Jurisdiction::{International, National};

        let organizations = [
            ("NHCP", "National Historical Commission of the Philippines"),
            ("NM", "National Museum"),
            ("DENR", "Department of Environment and Natural Resources"),
            ("WHC", "UNESCO World Heritage Committee"),
            ("RAMSAR", "Ramsar Convention"),
            ("ASEAN", "ASEAN Center for Biodiversity"),
        ];
        let types = [
            ("Q23677505", "NHCP", "National Historical Landmark", 101, National),
            ("Q36348834", "NHCP", "National Monument", 102, National),
            ("Q25927302", "NHCP", "National Shrine", 103, National),
            ("Q40720162", "NHCP", "Heritage Zone", 104, National),
            ("Q36352489", "NHCP", "Heritage House", 105, National),
            ("Q24189292", "NM", "National Cultural Treasure", 201, National),
            ("Q25036854", "NM", "Important Cultural Property", 202, National),
            ("Q25927309", "DENR", "National Geological Monument", 301, National),
            ("Q9259", "WHC", "World Heritage Site", 401, International),
            ("Q17278671", "WHC", "Tentative World Heritage Site", 402, International),
            ("Q20905436", "RAMSAR", "Ramsar Site", 501, International),
            ("Q4654172", "ASEAN", "ASEAN Heritage Park", 601, International),
        ];

        let mut builder = Self::builder();
        for (id, full_name) in organizations {
            builder = builder.organization(id, full_name);
        }
        for (id, organization, name, sort_order, jurisdiction) in types {
            builder = builder.designation(
                DesignationTypeId::new_unchecked(id),
                organization,
                name,
                sort_order,
                jurisdiction,
            );
        }
        #[allow(clippy::expect_used, reason = "The built-in table is consistent")]
        let catalog = builder.build().expect("built-in catalog is valid");
        catalog
    }

    /// Resolves a type to its canonical type, following at most one alias hop.
    ///
    /// Returns [`None`] for types that are not in the catalog.
    pub fn resolve(&self, type_id: &str) -> Option<&DesignationTypeId> {
        let designation = self.types.get(type_id)?;
        Some(designation.alias_of.as_ref().unwrap_or(&designation.id))
    }

    /// Returns the metadata of a type.
    pub fn metadata(&self, type_id: &str) -> Option<&DesignationType> {
        self.types.get(type_id)
    }

    pub fn organization(&self, organization_id: &str) -> Option<&Organization> {
        self.organizations.get(organization_id)
    }

    /// All organizations, in declaration order.
    pub fn organizations(&self) -> impl Iterator<Item = &Organization> {
        self.organizations.values()
    }

    /// The canonical types, sorted by ascending sort order.
    pub fn canonical_type_ids(&self) -> &[DesignationTypeId] {
        &self.canonical_order
    }

    /// Every type the catalog recognizes, aliases included.
    pub fn recognized_type_ids(&self) -> impl Iterator<Item = &DesignationTypeId> {
        self.types.keys()
    }

    /// Every recognized type with the given jurisdiction, aliases included.
    pub fn types_with_jurisdiction(
        &self,
        jurisdiction: Jurisdiction,
    ) -> impl Iterator<Item = &DesignationType> {
        self.types
            .values()
            .filter(move |t| t.jurisdiction == jurisdiction)
    }

    /// Groups the canonical types for the filter menu.
    ///
    /// A new group starts at every type whose sort order is `1` modulo `100`.
    pub fn groups(&self) -> Vec<CatalogGroup<'_>> {
        let mut groups: Vec<CatalogGroup<'_>> = Vec::new();
        for type_id in &self.canonical_order {
            let designation = &self.types[type_id];
            let organization = &self.organizations[&designation.organization];
            if designation.sort_order % 100 == 1 || groups.is_empty() {
                groups.push(CatalogGroup {
                    organization,
                    types: vec![designation],
                });
            } else if let Some(group) = groups.last_mut() {
                group.types.push(designation);
            }
        }
        groups
    }
}

impl Default for DesignationCatalog {
    fn default() -> Self {
        Self::philippine()
    }
}

/// Builds a validated [`DesignationCatalog`].
#[derive(Debug, Default)]
#[must_use]
pub struct CatalogBuilder {
    organizations: Vec<Organization>,
    types: Vec<DesignationType>,
}

impl CatalogBuilder {
    pub fn organization(mut self, id: impl Into<String>, full_name: impl Into<String>) -> Self {
        self.organizations.push(Organization {
            id: OrganizationId::new(id),
            full_name: full_name.into(),
        });
        self
    }

    pub fn designation(
        mut self,
        id: DesignationTypeId,
        organization: impl Into<String>,
        name: impl Into<String>,
        sort_order: u32,
        jurisdiction: Jurisdiction,
    ) -> Self {
        self.types.push(DesignationType {
            id,
            organization: OrganizationId::new(organization),
            name: name.into(),
            sort_order,
            jurisdiction,
            alias_of: None,
        });
        self
    }

    /// Declares `id` as an alias of `target`. The alias shares the target's organization, name,
    /// sort order and jurisdiction.
    pub fn alias(mut self, id: DesignationTypeId, target: DesignationTypeId) -> Self {
        self.types.push(DesignationType {
            id,
            organization: OrganizationId::new(""),
            name: String::new(),
            sort_order: 0,
            jurisdiction: Jurisdiction::National,
            alias_of: Some(target),
        });
        self
    }

    pub fn build(self) -> Result<DesignationCatalog, CatalogError> {
        let organizations: IndexMap<_, _> = self
            .organizations
            .into_iter()
            .map(|o| (o.id.clone(), o))
            .collect();

        let mut types = IndexMap::with_capacity(self.types.len());
        for designation in self.types {
            if types.contains_key(&designation.id) {
                return Err(CatalogError::DuplicateType(designation.id));
            }
            types.insert(designation.id.clone(), designation);
        }

        let mut inherited = Vec::new();
        for designation in types.values() {
            if let Some(target) = &designation.alias_of {
                match types.get(target) {
                    None => {
                        return Err(CatalogError::UnknownAliasTarget {
                            type_id: designation.id.clone(),
                            target: target.clone(),
                        });
                    }
                    Some(t) if t.alias_of.is_some() => {
                        return Err(CatalogError::ChainedAlias {
                            type_id: designation.id.clone(),
                            target: target.clone(),
                        });
                    }
                    Some(t) => inherited.push((designation.id.clone(), t.clone())),
                }
            } else if !organizations.contains_key(&designation.organization) {
                return Err(CatalogError::UnknownOrganization {
                    type_id: designation.id.clone(),
                    organization: designation.organization.clone(),
                });
            }
        }
        for (alias_id, target) in inherited {
            if let Some(alias) = types.get_mut(&alias_id) {
                alias.organization = target.organization;
                alias.name = target.name;
                alias.sort_order = target.sort_order;
                alias.jurisdiction = target.jurisdiction;
            }
        }

        let mut canonical_order: Vec<_> = types
            .values()
            .filter(|t| t.alias_of.is_none())
            .map(|t| (t.sort_order, t.id.clone()))
            .collect();
        canonical_order.sort_by_key(|(order, _)| *order);

        Ok(DesignationCatalog {
            organizations,
            types,
            canonical_order: canonical_order.into_iter().map(|(_, id)| id).collect(),
        })
    }
}
