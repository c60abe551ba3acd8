use std::num::ParseFloatError;
use thiserror::Error;

/// An error returned when an entity identifier cannot be extracted from an IRI or a token.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum IdentifierError {
    /// The IRI does not start with the expected entity prefix.
    #[error("'{iri}' is not a Wikidata entity IRI")]
    UnexpectedPrefix { iri: String },
    /// The token after the prefix is not of the form `Q<digits>`.
    #[error("'{token}' is not a valid entity identifier")]
    InvalidToken { token: String },
}

/// An error returned when a `Point(<lon> <lat>)` literal cannot be parsed.
#[derive(Debug, Clone, Error, PartialEq)]
#[non_exhaustive]
pub enum CoordinateParseError {
    /// The literal is not wrapped in `Point(...)`.
    #[error("'{0}' is not a WKT point")]
    NotAPoint(String),
    /// The point does not have exactly two components.
    #[error("expected two coordinate components in '{0}'")]
    ComponentCount(String),
    /// One of the components is not a number.
    #[error("invalid coordinate component: {0}")]
    Component(#[from] ParseFloatError),
    /// A component lies outside of the valid range.
    #[error("coordinate ({lat}, {lon}) is out of range")]
    OutOfRange { lat: f64, lon: f64 },
}

/// An error returned when a time value and its precision cannot be turned into a [`PartialDate`](crate::PartialDate).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum PartialDateError {
    #[error("'{0}' is not a time value of the form [+-]YYYY-MM-DDThh:mm:ssZ")]
    Malformed(String),
    #[error("precision {0} is finer than a day")]
    UnsupportedPrecision(u8),
    #[error("{year}-{month:02}-{day:02} is not a calendar date")]
    InvalidDate { year: i32, month: u32, day: u32 },
}

/// An error returned when a language code is not a plain BCP 47 tag such as `en` or `zh-hant`.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("'{0}' is not a language tag like 'en', 'tl' or 'zh-hant'")]
pub struct LanguageTagError(pub String);
