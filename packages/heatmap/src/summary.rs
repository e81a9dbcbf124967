//! Summary panel statistics.

use std::collections::{HashMap, HashSet};

use via_segura_heatmap_models::{HeatmapRecord, HeatmapResponse, SummaryStats};

/// Placeholder shown when no neighborhood can be named.
pub const NO_REGION: &str = "-";

/// Computes the summary statistics for a response.
///
/// `total_incidents` is the API's `totalElements`, not the number of
/// records on the page.
#[must_use]
pub fn summarize(response: &HeatmapResponse) -> SummaryStats {
    SummaryStats {
        total_incidents: response.total_elements,
        affected_regions: affected_regions(&response.content),
        top_region: top_region(&response.content)
            .map_or_else(|| NO_REGION.to_string(), title_case),
    }
}

/// Number of distinct neighborhood names across `records`.
#[must_use]
pub fn affected_regions(records: &[HeatmapRecord]) -> usize {
    records
        .iter()
        .filter_map(HeatmapRecord::neighborhood)
        .collect::<HashSet<_>>()
        .len()
}

/// Most frequent neighborhood name, as sent by the API.
///
/// Ties go to the name that reached the highest count first.
#[must_use]
pub fn top_region(records: &[HeatmapRecord]) -> Option<&str> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut max_count = 0;
    let mut top = None;

    for name in records.iter().filter_map(HeatmapRecord::neighborhood) {
        let count = counts.entry(name).or_insert(0);
        *count += 1;
        if *count > max_count {
            max_count = *count;
            top = Some(name);
        }
    }

    top
}

/// Lowercases `name` and capitalizes the first letter of each
/// space-separated word: `"BOA VIAGEM"` becomes `"Boa Viagem"`.
#[must_use]
pub fn title_case(name: &str) -> String {
    name.to_lowercase()
        .split(' ')
        .map(|word| {
            let mut chars = word.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_uppercase().chain(chars).collect()
            })
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn response(body: &serde_json::Value) -> HeatmapResponse {
        serde_json::from_value(body.clone()).unwrap()
    }

    fn nested(neighborhood: &str) -> serde_json::Value {
        json!({
            "heatmap": { "h3Cell": "89819b2a0dbffff" },
            "coordinates": [{ "latitude": -8.0, "longitude": -34.9, "neighborhood": neighborhood }]
        })
    }

    #[test]
    fn counts_regions_and_picks_top() {
        let stats = summarize(&response(&json!({
            "content": [nested("Centro"), nested("Boa Viagem"), nested("Centro")],
            "totalElements": 3
        })));
        assert_eq!(stats.total_incidents, 3);
        assert_eq!(stats.affected_regions, 2);
        assert_eq!(stats.top_region, "Centro");
    }

    #[test]
    fn total_comes_from_response_not_page() {
        let stats = summarize(&response(&json!({
            "content": [nested("Centro")],
            "totalElements": 120
        })));
        assert_eq!(stats.total_incidents, 120);
        assert_eq!(stats.affected_regions, 1);
    }

    #[test]
    fn tie_goes_to_first_to_reach_max() {
        let stats = summarize(&response(&json!({
            "content": [
                nested("IMBIRIBEIRA"),
                nested("CENTRO"),
                nested("CENTRO"),
                nested("IMBIRIBEIRA")
            ]
        })));
        assert_eq!(stats.top_region, "Centro");
    }

    #[test]
    fn flat_records_are_counted() {
        let stats = summarize(&response(&json!({
            "content": [
                { "latitude": -8.0, "longitude": -34.9, "neighborhood": "BOA VIAGEM" },
                { "latitude": "x", "longitude": "y", "neighborhood": "BOA VIAGEM" },
                { "latitude": -8.0, "longitude": -34.9, "neighborhood": "" }
            ]
        })));
        assert_eq!(stats.affected_regions, 1);
        assert_eq!(stats.top_region, "Boa Viagem");
    }

    #[test]
    fn mistyped_metadata_still_counts_regions() {
        let stats = summarize(&response(&json!({
            "content": [
                {
                    "latitude": -8.0,
                    "longitude": -34.9,
                    "neighborhood": "CENTRO",
                    "count": "3"
                },
                {
                    "heatmap": { "year": "2023" },
                    "coordinates": [{
                        "latitude": -8.1,
                        "longitude": -34.8,
                        "neighborhood": "IPSEP",
                        "h3Cell": 123
                    }]
                },
                {
                    "latitude": -8.0,
                    "longitude": -34.9,
                    "neighborhood": "CENTRO",
                    "createdAt": [2024, 1, 10]
                }
            ],
            "totalElements": 3
        })));
        assert_eq!(stats.affected_regions, 2);
        assert_eq!(stats.top_region, "Centro");
    }

    #[test]
    fn null_content_keeps_total_incidents() {
        let stats = summarize(&response(&json!({ "content": null, "totalElements": 9 })));
        assert_eq!(stats.total_incidents, 9);
        assert_eq!(stats.affected_regions, 0);
        assert_eq!(stats.top_region, "-");
    }

    #[test]
    fn empty_response_uses_placeholder() {
        let stats = summarize(&HeatmapResponse::empty());
        assert_eq!(stats, SummaryStats::default());
        assert_eq!(stats.top_region, "-");
    }

    #[test]
    fn title_cases_words() {
        assert_eq!(title_case("BOA VIAGEM"), "Boa Viagem");
        assert_eq!(title_case("santo amaro"), "Santo Amaro");
        assert_eq!(title_case("ÁGUA FRIA"), "Água Fria");
    }
}
