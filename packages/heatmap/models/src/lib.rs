#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Data types shared across the ViaSegura heat map toolkit.
//!
//! Filter criteria sent to the incident API, the paged response envelope
//! it returns, and the derived types (heat map points and summary
//! statistics) that the front-end renders.
//!
//! The API has served two record layouts over its lifetime: a flat
//! per-incident row and a nested `{ heatmap, coordinates }` aggregate per
//! H3 cell. Both deserialize into the [`HeatmapRecord`] tagged union so
//! nothing downstream of deserialization has to probe raw JSON.

pub mod api_key;
pub mod period;

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

pub use api_key::ApiKeyUsage;
pub use period::{MonthYear, ParsePeriodError};

/// First year of data the export endpoint covers when no range is given.
pub const START_YEAR: u16 = 2015;

/// Last year of data the export endpoint covers when no range is given.
pub const END_YEAR: u16 = 2024;

/// Neighborhood label meaning "every neighborhood". Never sent to the API.
pub const IGNORED_NEIGHBORHOOD: &str = "All";

/// Neighborhood filter.
///
/// The front-end offers [`IGNORED_NEIGHBORHOOD`] as the first option of
/// the neighborhood picker. Parsing that label (or an empty selection)
/// yields [`NeighborhoodFilter::All`], which query builders omit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum NeighborhoodFilter {
    /// No neighborhood restriction.
    #[default]
    All,
    /// Restrict to a single named neighborhood.
    Named(String),
}

impl NeighborhoodFilter {
    /// Builds a filter from a picker label.
    #[must_use]
    pub fn parse(label: &str) -> Self {
        if label.is_empty() || label == IGNORED_NEIGHBORHOOD {
            Self::All
        } else {
            Self::Named(label.to_string())
        }
    }

    /// Returns the value to send as the `neighborhood` query parameter,
    /// or `None` when the parameter must be omitted.
    #[must_use]
    pub fn as_query_value(&self) -> Option<&str> {
        match self {
            Self::All => None,
            Self::Named(name) => Some(name),
        }
    }
}

impl FromStr for NeighborhoodFilter {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl From<&str> for NeighborhoodFilter {
    fn from(label: &str) -> Self {
        Self::parse(label)
    }
}

impl fmt::Display for NeighborhoodFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str(IGNORED_NEIGHBORHOOD),
            Self::Named(name) => f.write_str(name),
        }
    }
}

/// Filters accepted by `GET heatmap`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterCriteria {
    /// Neighborhood restriction.
    pub neighborhood: NeighborhoodFilter,
    /// H3 cell identifier.
    pub h3_cell: Option<String>,
    /// First year of the period.
    pub start_year: Option<u16>,
    /// First month of the period (1-12).
    pub start_month: Option<u8>,
    /// Last year of the period.
    pub end_year: Option<u16>,
    /// Last month of the period (1-12).
    pub end_month: Option<u8>,
    /// Minimum number of casualties.
    pub num_casualties: Option<u32>,
    /// Zero-based page index.
    pub page: Option<u32>,
    /// Page size.
    pub page_size: Option<u32>,
}

impl FilterCriteria {
    /// Restricts the criteria to a single month.
    ///
    /// Start and end are both set to `period`, matching the month picker,
    /// which always selects exactly one month.
    pub fn apply_period(&mut self, period: MonthYear) {
        self.start_year = Some(period.year);
        self.start_month = Some(period.month);
        self.end_year = Some(period.year);
        self.end_month = Some(period.month);
    }

    /// Builder-style variant of [`Self::apply_period`]. `None` leaves the
    /// period fields untouched.
    #[must_use]
    pub fn with_period(mut self, period: Option<MonthYear>) -> Self {
        if let Some(period) = period {
            self.apply_period(period);
        }
        self
    }
}

/// Filters accepted by `GET heatmap/export`.
///
/// `start_year` and `end_year` fall back to [`START_YEAR`] and
/// [`END_YEAR`] when building the query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportCriteria {
    /// Neighborhood restriction.
    pub neighborhood: NeighborhoodFilter,
    /// First year of the period.
    pub start_year: Option<u16>,
    /// First month of the period (1-12).
    pub start_month: Option<u8>,
    /// Last year of the period.
    pub end_year: Option<u16>,
    /// Last month of the period (1-12).
    pub end_month: Option<u8>,
}

impl ExportCriteria {
    /// The month/year filter currently active, if both the start year and
    /// start month are set.
    #[must_use]
    pub fn period(&self) -> Option<MonthYear> {
        MonthYear::new(self.start_year?, self.start_month?).ok()
    }
}

impl From<&FilterCriteria> for ExportCriteria {
    fn from(criteria: &FilterCriteria) -> Self {
        Self {
            neighborhood: criteria.neighborhood.clone(),
            start_year: criteria.start_year,
            start_month: criteria.start_month,
            end_year: criteria.end_year,
            end_month: criteria.end_month,
        }
    }
}

/// Aggregated casualty metric for one H3 cell and month.
///
/// Every field is decoded leniently: a value of the wrong JSON type reads
/// as `None` instead of rejecting the record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HeatmapMetric {
    /// H3 cell identifier.
    #[serde(deserialize_with = "lenient")]
    pub h3_cell: Option<String>,
    /// Year of the aggregate.
    #[serde(deserialize_with = "lenient")]
    pub year: Option<i32>,
    /// Month of the aggregate.
    #[serde(deserialize_with = "lenient")]
    pub month: Option<u32>,
    /// Number of casualties recorded.
    #[serde(deserialize_with = "lenient")]
    pub num_casualties: Option<u64>,
    /// Creation timestamp as sent by the API.
    #[serde(deserialize_with = "lenient")]
    pub created_at: Option<String>,
}

/// A geolocated point inside an H3 cell.
///
/// Latitude and longitude stay as raw JSON until normalization because
/// the API has sent them both as numbers and as numeric strings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeatmapCoordinate {
    /// H3 cell identifier.
    #[serde(default, deserialize_with = "lenient")]
    pub h3_cell: Option<String>,
    /// Latitude (number or numeric string).
    #[serde(default)]
    pub latitude: serde_json::Value,
    /// Longitude (number or numeric string).
    #[serde(default)]
    pub longitude: serde_json::Value,
    /// Neighborhood the point falls in.
    #[serde(default, deserialize_with = "lenient")]
    pub neighborhood: Option<String>,
    /// Creation timestamp as sent by the API.
    #[serde(default, deserialize_with = "lenient")]
    pub created_at: Option<String>,
}

/// Flat record layout: one row per point.
///
/// Only `latitude` and `longitude` decide whether a value is a flat
/// record; the other fields fall back to `None` on a type mismatch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlatRecord {
    /// H3 cell identifier.
    #[serde(default, deserialize_with = "lenient")]
    pub h3_cell: Option<String>,
    /// Latitude (number or numeric string).
    pub latitude: serde_json::Value,
    /// Longitude (number or numeric string).
    pub longitude: serde_json::Value,
    /// Neighborhood the point falls in.
    #[serde(default, deserialize_with = "lenient")]
    pub neighborhood: Option<String>,
    /// Creation timestamp as sent by the API.
    #[serde(default, deserialize_with = "lenient")]
    pub created_at: Option<String>,
    /// Incident count at this point, used as the heat intensity.
    #[serde(default, alias = "numCasualties", deserialize_with = "lenient")]
    pub count: Option<f64>,
}

/// Nested record layout: one metric with the coordinates of its cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NestedRecord {
    /// Cell-level metric.
    #[serde(default, deserialize_with = "lenient")]
    pub heatmap: Option<HeatmapMetric>,
    /// Coordinates belonging to the cell.
    pub coordinates: Vec<HeatmapCoordinate>,
}

/// One element of [`HeatmapResponse::content`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HeatmapRecord {
    /// `{ heatmap, coordinates: [...] }`.
    Nested(NestedRecord),
    /// `{ h3Cell, latitude, longitude, neighborhood, createdAt }`.
    Flat(FlatRecord),
    /// Anything else. Kept so one malformed element does not reject the
    /// whole page; normalization drops it.
    Unknown(serde_json::Value),
}

impl HeatmapRecord {
    /// Neighborhood this record is attributed to.
    ///
    /// Nested records are attributed to their first coordinate. Empty
    /// names count as missing.
    #[must_use]
    pub fn neighborhood(&self) -> Option<&str> {
        let name = match self {
            Self::Flat(record) => record.neighborhood.as_deref(),
            Self::Nested(record) => record
                .coordinates
                .first()
                .and_then(|coord| coord.neighborhood.as_deref()),
            Self::Unknown(_) => None,
        };
        name.filter(|n| !n.is_empty())
    }
}

/// Sort descriptor of a Spring Data page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SortState {
    /// No sort applied.
    pub empty: bool,
    /// Results are sorted.
    pub sorted: bool,
    /// Results are unsorted.
    pub unsorted: bool,
}

/// Paging request echoed back by the API.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Pageable {
    /// Zero-based page index.
    pub page_number: u64,
    /// Requested page size.
    pub page_size: u64,
    /// Sort applied to the page.
    pub sort: SortState,
    /// Offset of the first element.
    pub offset: u64,
    /// Whether paging was disabled.
    pub unpaged: bool,
    /// Whether paging was enabled.
    pub paged: bool,
}

/// Paged response of `GET heatmap`.
///
/// [`Default`] is the empty response substituted whenever the request or
/// its decoding fails.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HeatmapResponse {
    /// Records on this page. `null` or a non-array value reads as empty.
    #[serde(deserialize_with = "lenient")]
    pub content: Vec<HeatmapRecord>,
    /// Paging request. Unpaged responses send a bare string here, which
    /// decodes as the default.
    #[serde(deserialize_with = "lenient")]
    pub pageable: Pageable,
    /// Whether this is the last page.
    pub last: bool,
    /// Total number of incidents matching the filters across all pages.
    pub total_elements: u64,
    /// Number of pages.
    pub total_pages: u64,
    /// Page size.
    pub size: u64,
    /// Zero-based page index.
    pub number: u64,
    /// Sort applied to the page.
    #[serde(deserialize_with = "lenient")]
    pub sort: SortState,
    /// Whether this is the first page.
    pub first: bool,
    /// Number of records on this page.
    pub number_of_elements: u64,
    /// Whether the page has no records.
    pub empty: bool,
}

impl HeatmapResponse {
    /// The empty response: no content, zeroed counts.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            empty: true,
            ..Self::default()
        }
    }
}

/// Decodes `T`, falling back to its default when the JSON has an
/// unexpected shape or type.
fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: serde::de::DeserializeOwned + Default,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

/// `[latitude, longitude, intensity]`, the only shape the heat map layer
/// accepts.
pub type HeatmapPoint = [f64; 3];

/// Summary panel statistics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryStats {
    /// Total incidents reported by the API for the current filters.
    pub total_incidents: u64,
    /// Number of distinct neighborhoods in the response.
    pub affected_regions: usize,
    /// Neighborhood with the most records, title-cased, or `"-"`.
    pub top_region: String,
}

impl Default for SummaryStats {
    fn default() -> Self {
        Self {
            total_incidents: 0,
            affected_regions: 0,
            top_region: "-".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn neighborhood_sentinel_parses_as_all() {
        assert_eq!(NeighborhoodFilter::parse("All"), NeighborhoodFilter::All);
        assert_eq!(NeighborhoodFilter::parse(""), NeighborhoodFilter::All);
        assert_eq!(
            NeighborhoodFilter::parse("Centro"),
            NeighborhoodFilter::Named("Centro".to_string())
        );
        assert_eq!(NeighborhoodFilter::All.as_query_value(), None);
        assert_eq!(NeighborhoodFilter::All.to_string(), "All");
    }

    #[test]
    fn deserializes_nested_records() {
        let body = serde_json::json!({
            "content": [{
                "heatmap": {
                    "h3Cell": "89819b2a0dbffff",
                    "year": 2023,
                    "month": 6,
                    "numCasualties": 2,
                    "createdAt": "2024-01-10T12:00:00"
                },
                "coordinates": [{
                    "h3Cell": "89819b2a0dbffff",
                    "latitude": -8.0631,
                    "longitude": -34.8812,
                    "neighborhood": "CENTRO",
                    "createdAt": "2024-01-10T12:00:00"
                }]
            }],
            "totalElements": 1
        });

        let response: HeatmapResponse = serde_json::from_value(body).unwrap();
        assert_eq!(response.total_elements, 1);
        let HeatmapRecord::Nested(record) = &response.content[0] else {
            panic!("expected nested record, got {:?}", response.content[0]);
        };
        assert_eq!(record.heatmap.as_ref().unwrap().num_casualties, Some(2));
        assert_eq!(response.content[0].neighborhood(), Some("CENTRO"));
    }

    #[test]
    fn deserializes_flat_and_unknown_records() {
        let body = serde_json::json!({
            "content": [
                { "latitude": "-8.05", "longitude": "-34.88", "neighborhood": "Boa Viagem" },
                { "unexpected": true }
            ]
        });

        let response: HeatmapResponse = serde_json::from_value(body).unwrap();
        assert!(matches!(response.content[0], HeatmapRecord::Flat(_)));
        assert!(matches!(response.content[1], HeatmapRecord::Unknown(_)));
        assert_eq!(response.content[0].neighborhood(), Some("Boa Viagem"));
        assert_eq!(response.content[1].neighborhood(), None);
    }

    #[test]
    fn mistyped_metadata_keeps_record_shape() {
        let body = serde_json::json!({
            "content": [
                { "latitude": -8.05, "longitude": -34.88, "count": "3", "h3Cell": 123 },
                { "latitude": -8.06, "longitude": -34.89, "createdAt": [2024, 1, 10, 12, 0] },
                {
                    "heatmap": { "h3Cell": "a", "year": "2023", "numCasualties": 2 },
                    "coordinates": [{ "latitude": -8.07, "longitude": -34.9, "neighborhood": 5 }]
                }
            ]
        });

        let response: HeatmapResponse = serde_json::from_value(body).unwrap();

        let HeatmapRecord::Flat(first) = &response.content[0] else {
            panic!("expected flat record, got {:?}", response.content[0]);
        };
        assert_eq!(first.count, None);
        assert_eq!(first.h3_cell, None);
        assert!(matches!(response.content[1], HeatmapRecord::Flat(_)));

        let HeatmapRecord::Nested(nested) = &response.content[2] else {
            panic!("expected nested record, got {:?}", response.content[2]);
        };
        let metric = nested.heatmap.as_ref().unwrap();
        assert_eq!(metric.year, None);
        assert_eq!(metric.num_casualties, Some(2));
        assert_eq!(response.content[2].neighborhood(), None);
    }

    #[test]
    fn null_content_keeps_total() {
        let response: HeatmapResponse =
            serde_json::from_value(serde_json::json!({ "content": null, "totalElements": 9 }))
                .unwrap();
        assert!(response.content.is_empty());
        assert_eq!(response.total_elements, 9);
    }

    #[test]
    fn unpaged_envelope_still_decodes() {
        let body = serde_json::json!({
            "content": [],
            "pageable": "INSTANCE",
            "totalElements": 0,
            "empty": true
        });

        let response: HeatmapResponse = serde_json::from_value(body).unwrap();
        assert_eq!(response.pageable, Pageable::default());
        assert!(response.empty);
    }

    #[test]
    fn export_criteria_period_needs_year_and_month() {
        let criteria = ExportCriteria {
            start_year: Some(2023),
            start_month: Some(6),
            ..ExportCriteria::default()
        };
        assert_eq!(criteria.period(), Some(MonthYear::new(2023, 6).unwrap()));

        let year_only = ExportCriteria {
            start_year: Some(2023),
            ..ExportCriteria::default()
        };
        assert_eq!(year_only.period(), None);
    }

    #[test]
    fn with_period_sets_start_and_end() {
        let criteria =
            FilterCriteria::default().with_period(Some(MonthYear::new(2023, 6).unwrap()));
        assert_eq!(criteria.start_year, Some(2023));
        assert_eq!(criteria.start_month, Some(6));
        assert_eq!(criteria.end_year, Some(2023));
        assert_eq!(criteria.end_month, Some(6));
    }
}
