use crate::CoordinateParseError;
use std::fmt;
use std::str::FromStr;

/// A WGS 84 position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lon: f64) -> Result<Self, CoordinateParseError> {
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
            return Err(CoordinateParseError::OutOfRange { lat, lon });
        }
        Ok(Self { lat, lon })
    }

    /// Parses a WKT point literal as returned by the Wikidata query service.
    ///
    /// WKT lists the longitude first: `Point(121.5 14.6)` is latitude 14.6, longitude 121.5.
    ///
    /// ```
    /// use heritage_map_model::Coordinates;
    ///
    /// let point = Coordinates::from_wkt("Point(121.5 14.6)")?;
    /// assert_eq!(point.lat, 14.6);
    /// assert_eq!(point.lon, 121.5);
    /// # Result::<_, Box<dyn std::error::Error>>::Ok(())
    /// ```
    pub fn from_wkt(text: &str) -> Result<Self, CoordinateParseError> {
        let inner = text
            .trim()
            .strip_prefix("Point(")
            .and_then(|rest| rest.strip_suffix(')'))
            .ok_or_else(|| CoordinateParseError::NotAPoint(text.to_owned()))?;
        let mut components = inner.split_whitespace();
        let (Some(lon), Some(lat), None) =
            (components.next(), components.next(), components.next())
        else {
            return Err(CoordinateParseError::ComponentCount(text.to_owned()));
        };
        Self::new(lat.parse()?, lon.parse()?)
    }
}

impl FromStr for Coordinates {
    type Err = CoordinateParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_wkt(s)
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.5}, {:.5}", self.lat, self.lon)
    }
}
