//! Conversion of API records into heat map points.

use serde_json::Value;
use via_segura_heatmap_models::{HeatmapPoint, HeatmapRecord, HeatmapResponse};

/// Intensity given to a point when the record carries no count.
pub const DEFAULT_INTENSITY: f64 = 1.0;

/// Flattens a response into `[latitude, longitude, intensity]` points.
///
/// Records without a numeric latitude and longitude are dropped. Output
/// order follows the response; duplicates are kept.
#[must_use]
pub fn normalize(response: &HeatmapResponse) -> Vec<HeatmapPoint> {
    normalize_records(&response.content)
}

/// Same as [`normalize`] for a bare slice of records.
#[must_use]
pub fn normalize_records(records: &[HeatmapRecord]) -> Vec<HeatmapPoint> {
    let points: Vec<HeatmapPoint> = records.iter().filter_map(to_point).collect();

    let dropped = records.len() - points.len();
    if dropped > 0 {
        log::debug!(
            "Dropped {dropped} of {} heatmap records without valid coordinates",
            records.len()
        );
    }

    points
}

fn to_point(record: &HeatmapRecord) -> Option<HeatmapPoint> {
    match record {
        HeatmapRecord::Flat(flat) => {
            let latitude = coerce_coordinate(&flat.latitude)?;
            let longitude = coerce_coordinate(&flat.longitude)?;
            let intensity = flat
                .count
                .filter(|c| c.is_finite())
                .unwrap_or(DEFAULT_INTENSITY);
            Some([latitude, longitude, intensity])
        }
        // Only the first coordinate of a cell is plotted.
        HeatmapRecord::Nested(nested) => {
            let coord = nested.coordinates.first()?;
            let latitude = coerce_coordinate(&coord.latitude)?;
            let longitude = coerce_coordinate(&coord.longitude)?;
            Some([latitude, longitude, DEFAULT_INTENSITY])
        }
        HeatmapRecord::Unknown(_) => None,
    }
}

/// Reads a coordinate sent as a JSON number or numeric string.
///
/// Returns `None` for anything that is not a finite number, including
/// `null` and the empty string.
#[must_use]
pub fn coerce_coordinate(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    number.filter(|n| n.is_finite())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn response(body: &Value) -> HeatmapResponse {
        serde_json::from_value(body.clone()).unwrap()
    }

    #[test]
    fn flat_string_coordinates() {
        let points = normalize(&response(&json!({
            "content": [{ "latitude": "-8.05", "longitude": "-34.88" }]
        })));
        assert_eq!(points, vec![[-8.05, -34.88, 1.0]]);
    }

    #[test]
    fn drops_non_numeric_coordinates() {
        let points = normalize(&response(&json!({
            "content": [
                { "latitude": "abc", "longitude": "-34.88" },
                { "latitude": -8.1, "longitude": -34.9 },
                { "latitude": "", "longitude": "-34.88" },
                { "latitude": null, "longitude": -34.88 },
                { "latitude": "NaN", "longitude": -34.88 }
            ]
        })));
        assert_eq!(points, vec![[-8.1, -34.9, 1.0]]);
    }

    #[test]
    fn flat_count_becomes_intensity() {
        let points = normalize(&response(&json!({
            "content": [{ "latitude": -8.0, "longitude": -34.9, "count": 7 }]
        })));
        assert_eq!(points, vec![[-8.0, -34.9, 7.0]]);
    }

    #[test]
    fn nested_uses_first_coordinate_only() {
        let points = normalize(&response(&json!({
            "content": [
                {
                    "heatmap": { "h3Cell": "a", "numCasualties": 3 },
                    "coordinates": [
                        { "latitude": -8.06, "longitude": -34.88, "neighborhood": "CENTRO" },
                        { "latitude": -8.07, "longitude": -34.89, "neighborhood": "CENTRO" }
                    ]
                },
                { "heatmap": { "h3Cell": "b" }, "coordinates": [] }
            ]
        })));
        assert_eq!(points, vec![[-8.06, -34.88, 1.0]]);
    }

    #[test]
    fn preserves_order_and_duplicates() {
        let points = normalize(&response(&json!({
            "content": [
                { "latitude": 1.0, "longitude": 2.0 },
                { "latitude": 3.0, "longitude": 4.0 },
                { "latitude": 1.0, "longitude": 2.0 }
            ]
        })));
        assert_eq!(
            points,
            vec![[1.0, 2.0, 1.0], [3.0, 4.0, 1.0], [1.0, 2.0, 1.0]]
        );
    }

    #[test]
    fn mistyped_metadata_does_not_drop_points() {
        let points = normalize(&response(&json!({
            "content": [
                { "latitude": -8.01, "longitude": -34.91, "count": "3" },
                { "latitude": -8.02, "longitude": -34.92, "createdAt": [2024, 1, 10, 12, 0] },
                {
                    "heatmap": { "h3Cell": "89819b2a0dbffff", "year": "2023" },
                    "coordinates": [{ "latitude": -8.03, "longitude": -34.93 }]
                },
                { "latitude": "-8.04", "longitude": "-34.94", "h3Cell": 123 }
            ]
        })));
        assert_eq!(
            points,
            vec![
                [-8.01, -34.91, 1.0],
                [-8.02, -34.92, 1.0],
                [-8.03, -34.93, 1.0],
                [-8.04, -34.94, 1.0]
            ]
        );
    }

    #[test]
    fn empty_response_has_no_points() {
        assert!(normalize(&HeatmapResponse::empty()).is_empty());
    }
}
