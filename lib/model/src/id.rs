use crate::{IdentifierError, LanguageTagError};
use oxrdf::NamedNodeRef;
use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;

/// The IRI prefix of every Wikidata entity.
pub const WIKIDATA_ENTITY_PREFIX: &str = "http://www.wikidata.org/entity/";

/// Extracts the entity token from a Wikidata entity IRI.
///
/// The token is everything after [`WIKIDATA_ENTITY_PREFIX`] and must be of the form `Q<digits>`.
///
/// ```
/// use heritage_map_model::entity_token_from_iri;
///
/// assert_eq!(entity_token_from_iri("http://www.wikidata.org/entity/Q1153")?, "Q1153");
/// assert!(entity_token_from_iri("https://www.wikidata.org/wiki/Q1153").is_err());
/// # Result::<_, Box<dyn std::error::Error>>::Ok(())
/// ```
pub fn entity_token_from_iri(iri: &str) -> Result<&str, IdentifierError> {
    let token = iri
        .strip_prefix(WIKIDATA_ENTITY_PREFIX)
        .ok_or_else(|| IdentifierError::UnexpectedPrefix {
            iri: iri.to_owned(),
        })?;
    validate_entity_token(token)?;
    Ok(token)
}

fn validate_entity_token(token: &str) -> Result<(), IdentifierError> {
    let valid = token
        .strip_prefix('Q')
        .is_some_and(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()));
    if valid {
        Ok(())
    } else {
        Err(IdentifierError::InvalidToken {
            token: token.to_owned(),
        })
    }
}

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(String);

        impl $name {
            /// Creates an identifier from a bare token such as `Q1153`.
            pub fn new(token: impl Into<String>) -> Result<Self, IdentifierError> {
                let token = token.into();
                validate_entity_token(&token)?;
                Ok(Self(token))
            }

            /// Creates an identifier without validating `token`.
            ///
            /// The caller must make sure that `token` is of the form `Q<digits>`.
            pub fn new_unchecked(token: impl Into<String>) -> Self {
                Self(token.into())
            }

            /// Creates an identifier from a full entity IRI.
            pub fn from_iri(iri: &str) -> Result<Self, IdentifierError> {
                entity_token_from_iri(iri).map(|token| Self(token.to_owned()))
            }

            /// Creates an identifier from a named node holding an entity IRI.
            pub fn from_named_node(node: NamedNodeRef<'_>) -> Result<Self, IdentifierError> {
                Self::from_iri(node.as_str())
            }

            #[inline]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// The full entity IRI of this identifier.
            pub fn iri(&self) -> String {
                format!("{WIKIDATA_ENTITY_PREFIX}{}", self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.pad(&self.0)
            }
        }

        impl FromStr for $name {
            type Err = IdentifierError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }
    };
}

entity_id!(
    /// Identifies a heritage site (a Wikidata item).
    SiteId
);

entity_id!(
    /// Identifies a designation type such as "National Historical Landmark" (a Wikidata item).
    DesignationTypeId
);

entity_id!(
    /// Identifies a declaration document backing a designation (a Wikidata item).
    DocumentId
);

/// Identifies an organization that confers designations, e.g. `NHCP`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OrganizationId(String);

impl OrganizationId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrganizationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl Borrow<str> for OrganizationId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// A lowercase language tag such as `en` or `zh-hant`, used in Wikimedia host names and in
/// the label service.
///
/// Only a primary subtag of two or three letters followed by alphanumeric subtags is accepted,
/// so a tag can be embedded in query literals and IRIs as is.
///
/// ```
/// use heritage_map_model::LanguageTag;
///
/// assert_eq!("tl".parse::<LanguageTag>()?.as_str(), "tl");
/// assert!("en\" }".parse::<LanguageTag>().is_err());
/// # Result::<_, Box<dyn std::error::Error>>::Ok(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LanguageTag(String);

impl LanguageTag {
    pub fn new(tag: impl Into<String>) -> Result<Self, LanguageTagError> {
        let tag = tag.into();
        let mut subtags = tag.split('-');
        let primary_valid = subtags.next().is_some_and(|primary| {
            (2..=3).contains(&primary.len()) && primary.bytes().all(|b| b.is_ascii_lowercase())
        });
        let rest_valid = subtags.all(|subtag| {
            !subtag.is_empty()
                && subtag
                    .bytes()
                    .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit())
        });
        if primary_valid && rest_valid {
            Ok(Self(tag))
        } else {
            Err(LanguageTagError(tag))
        }
    }

    /// English, the default language of the map.
    pub fn english() -> Self {
        Self("en".to_owned())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for LanguageTag {
    fn default() -> Self {
        Self::english()
    }
}

impl fmt::Display for LanguageTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl FromStr for LanguageTag {
    type Err = LanguageTagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for LanguageTag {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
