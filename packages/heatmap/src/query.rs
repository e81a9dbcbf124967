//! Query string builders for the heat map endpoints.
//!
//! Output is `application/x-www-form-urlencoded` without a leading `?`.
//! Keys are written in a fixed order so identical criteria always produce
//! identical strings.

use std::fmt::Display;

use url::form_urlencoded::Serializer;
use via_segura_heatmap_models::{END_YEAR, ExportCriteria, FilterCriteria, START_YEAR};

/// Builds the query string for `GET heatmap`.
///
/// Returns an empty string for `None`. Unset fields, empty strings, and
/// the "all neighborhoods" filter are omitted; numeric zero is kept.
#[must_use]
pub fn build_heatmap_query(criteria: Option<&FilterCriteria>) -> String {
    let Some(criteria) = criteria else {
        return String::new();
    };

    let mut query = Serializer::new(String::new());

    append_text(
        &mut query,
        "neighborhood",
        criteria.neighborhood.as_query_value(),
    );
    append_text(&mut query, "h3Cell", criteria.h3_cell.as_deref());
    append_number(&mut query, "start_year", criteria.start_year);
    append_number(&mut query, "start_month", criteria.start_month);
    append_number(&mut query, "end_year", criteria.end_year);
    append_number(&mut query, "end_month", criteria.end_month);
    append_number(&mut query, "num_casualties", criteria.num_casualties);
    append_number(&mut query, "page", criteria.page);
    append_number(&mut query, "pageSize", criteria.page_size);

    query.finish()
}

/// Builds the query string for `GET heatmap/export`.
///
/// `start_year` and `end_year` are always present, defaulting to
/// [`START_YEAR`] and [`END_YEAR`]. Months are only sent when set to a
/// non-zero value.
#[must_use]
pub fn build_export_query(criteria: Option<&ExportCriteria>) -> String {
    let default = ExportCriteria::default();
    let criteria = criteria.unwrap_or(&default);

    let mut query = Serializer::new(String::new());

    query.append_pair(
        "start_year",
        &criteria.start_year.unwrap_or(START_YEAR).to_string(),
    );
    query.append_pair(
        "end_year",
        &criteria.end_year.unwrap_or(END_YEAR).to_string(),
    );
    append_text(
        &mut query,
        "neighborhood",
        criteria.neighborhood.as_query_value(),
    );
    append_number(
        &mut query,
        "start_month",
        criteria.start_month.filter(|m| *m != 0),
    );
    append_number(
        &mut query,
        "end_month",
        criteria.end_month.filter(|m| *m != 0),
    );

    query.finish()
}

fn append_text(query: &mut Serializer<'_, String>, key: &str, value: Option<&str>) {
    if let Some(value) = value.filter(|v| !v.is_empty()) {
        query.append_pair(key, value);
    }
}

fn append_number<T: Display>(query: &mut Serializer<'_, String>, key: &str, value: Option<T>) {
    if let Some(value) = value {
        query.append_pair(key, &value.to_string());
    }
}
