use crate::PartialDateError;
use chrono::{Month, NaiveDate};
use std::fmt;

/// How much of a [`PartialDate`] is meaningful.
///
/// The discriminants are the Wikidata time precision codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DatePrecision {
    Decade = 8,
    Year = 9,
    Month = 10,
    Day = 11,
}

impl DatePrecision {
    /// Maps a Wikidata precision code. Anything coarser than a decade is shown as a year.
    pub fn from_code(code: u8) -> Result<Self, PartialDateError> {
        match code {
            0..=7 | 9 => Ok(Self::Year),
            8 => Ok(Self::Decade),
            10 => Ok(Self::Month),
            11 => Ok(Self::Day),
            _ => Err(PartialDateError::UnsupportedPrecision(code)),
        }
    }
}

/// A date of which only the components allowed by its [`DatePrecision`] are known.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PartialDate {
    year: i32,
    month: u32,
    day: u32,
    precision: DatePrecision,
}

impl PartialDate {
    /// Parses a Wikidata time value (`[+-]YYYY-MM-DDThh:mm:ssZ`) given its precision code.
    ///
    /// Components finer than the precision are ignored, so `1898-00-00T00:00:00Z` is fine with
    /// year precision.
    ///
    /// ```
    /// use heritage_map_model::PartialDate;
    ///
    /// let date = PartialDate::parse("1972-05-16T00:00:00Z", 11)?;
    /// assert_eq!(date.to_string(), "16 May 1972");
    /// let date = PartialDate::parse("1972-05-16T00:00:00Z", 9)?;
    /// assert_eq!(date.to_string(), "1972");
    /// # Result::<_, Box<dyn std::error::Error>>::Ok(())
    /// ```
    pub fn parse(value: &str, precision_code: u8) -> Result<Self, PartialDateError> {
        let precision = DatePrecision::from_code(precision_code)?;
        let malformed = || PartialDateError::Malformed(value.to_owned());

        let (negative, unsigned) = match value.as_bytes().first() {
            Some(b'-') => (true, &value[1..]),
            Some(b'+') => (false, &value[1..]),
            _ => (false, value),
        };
        let date_part = unsigned.split('T').next().ok_or_else(malformed)?;
        let mut components = date_part.splitn(3, '-');
        let mut next_number = || -> Result<u32, PartialDateError> {
            components
                .next()
                .and_then(|c| c.parse::<u32>().ok())
                .ok_or_else(malformed)
        };
        let year = i32::try_from(next_number()?).map_err(|_| malformed())?;
        let year = if negative { -year } else { year };
        let month = next_number()?;
        let day = next_number()?;

        let (month, day) = match precision {
            DatePrecision::Decade | DatePrecision::Year => (0, 0),
            DatePrecision::Month => {
                if !(1..=12).contains(&month) {
                    return Err(PartialDateError::InvalidDate { year, month, day });
                }
                (month, 0)
            }
            DatePrecision::Day => {
                if NaiveDate::from_ymd_opt(year, month, day).is_none() {
                    return Err(PartialDateError::InvalidDate { year, month, day });
                }
                (month, day)
            }
        };
        Ok(Self {
            year,
            month,
            day,
            precision,
        })
    }

    #[inline]
    pub fn year(&self) -> i32 {
        self.year
    }

    /// The month, if the precision is at least [`DatePrecision::Month`].
    pub fn month(&self) -> Option<u32> {
        (self.precision >= DatePrecision::Month).then_some(self.month)
    }

    /// The day of the month, if the precision is [`DatePrecision::Day`].
    pub fn day(&self) -> Option<u32> {
        (self.precision == DatePrecision::Day).then_some(self.day)
    }

    #[inline]
    pub fn precision(&self) -> DatePrecision {
        self.precision
    }
}

struct DisplayYear(i32);

impl fmt::Display for DisplayYear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 < 0 {
            write!(f, "{} BCE", self.0.unsigned_abs())
        } else {
            write!(f, "{}", self.0)
        }
    }
}

fn month_name(month: u32) -> &'static str {
    u8::try_from(month)
        .ok()
        .and_then(|m| Month::try_from(m).ok())
        .map_or("", |m| m.name())
}

impl fmt::Display for PartialDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.precision {
            DatePrecision::Decade => {
                let decade = self.year - self.year % 10;
                if decade < 0 {
                    write!(f, "{}s BCE", decade.unsigned_abs())
                } else {
                    write!(f, "{decade}s")
                }
            }
            DatePrecision::Year => write!(f, "{}", DisplayYear(self.year)),
            DatePrecision::Month => {
                write!(f, "{} {}", month_name(self.month), DisplayYear(self.year))
            }
            DatePrecision::Day => write!(
                f,
                "{} {} {}",
                self.day,
                month_name(self.month),
                DisplayYear(self.year)
            ),
        }
    }
}
