//! Month/year period selected in the date picker.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};

/// A single calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthYear {
    /// Four-digit year.
    pub year: u16,
    /// Month, 1-12.
    pub month: u8,
}

/// Error returned when a period cannot be built or parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsePeriodError {
    /// The rejected input.
    pub input: String,
}

impl fmt::Display for ParsePeriodError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid period {:?}: expected MM/YYYY, MM-YYYY or YYYY-MM",
            self.input
        )
    }
}

impl std::error::Error for ParsePeriodError {}

impl MonthYear {
    /// Creates a period.
    ///
    /// # Errors
    ///
    /// Returns an error if `month` is not in the range 1-12.
    pub fn new(year: u16, month: u8) -> Result<Self, ParsePeriodError> {
        if (1..=12).contains(&month) {
            Ok(Self { year, month })
        } else {
            Err(ParsePeriodError {
                input: format!("{month}/{year}"),
            })
        }
    }

    /// Period containing `date`.
    ///
    /// # Errors
    ///
    /// Returns an error if the year does not fit a four-digit calendar
    /// year.
    pub fn from_date(date: &impl Datelike) -> Result<Self, ParsePeriodError> {
        let invalid = || ParsePeriodError {
            input: format!("{}-{:02}", date.year(), date.month()),
        };
        let year = u16::try_from(date.year()).map_err(|_| invalid())?;
        let month = u8::try_from(date.month()).map_err(|_| invalid())?;
        Self::new(year, month)
    }

    /// `MM-YYYY`, as used in export file names.
    #[must_use]
    pub fn file_label(&self) -> String {
        format!("{:02}-{:04}", self.month, self.year)
    }
}

impl fmt::Display for MonthYear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}/{:04}", self.month, self.year)
    }
}

impl FromStr for MonthYear {
    type Err = ParsePeriodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let candidates = [
            (format!("01/{s}"), "%d/%m/%Y"),
            (format!("01-{s}"), "%d-%m-%Y"),
            (format!("{s}-01"), "%Y-%m-%d"),
        ];

        let date = candidates
            .iter()
            .find_map(|(candidate, fmt)| NaiveDate::parse_from_str(candidate, fmt).ok())
            .ok_or_else(|| ParsePeriodError {
                input: s.to_string(),
            })?;

        Self::from_date(&date).map_err(|_| ParsePeriodError {
            input: s.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_supported_formats() {
        let june = MonthYear::new(2023, 6).unwrap();
        assert_eq!("06/2023".parse::<MonthYear>().unwrap(), june);
        assert_eq!("6/2023".parse::<MonthYear>().unwrap(), june);
        assert_eq!("06-2023".parse::<MonthYear>().unwrap(), june);
        assert_eq!("2023-06".parse::<MonthYear>().unwrap(), june);
    }

    #[test]
    fn rejects_invalid_periods() {
        assert!("13/2023".parse::<MonthYear>().is_err());
        assert!("junho".parse::<MonthYear>().is_err());
        assert!(MonthYear::new(2023, 0).is_err());
    }

    #[test]
    fn formats_labels() {
        let period = MonthYear::new(2023, 6).unwrap();
        assert_eq!(period.to_string(), "06/2023");
        assert_eq!(period.file_label(), "06-2023");
    }
}
