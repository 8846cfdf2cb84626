//! Field extraction over the carrier's tracking responses.
//!
//! The vendor schema is not stable: the result list and most fields appear
//! under one of several names depending on API version and shipment kind.
//! Each logical value is therefore an ordered list of candidate paths,
//! evaluated in sequence until one yields a non-blank result.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::Value;

/// Candidate keys for the result list inside a tracking response, tried
/// after checking whether the root itself is an array.
pub const LIST_KEYS: &[&str] = &["items", "shipments", "data"];

/// Raw machine status, the input to the status mapper.
pub const RAW_STATUS_PATHS: &[&[&str]] = &[
    &["trackAndTrace", "lastEventCode"],
    &["status"],
    &["shipmentStatus"],
    &["statusCode"],
    &["state"],
];

/// Human-readable description of the last event.
pub const DESCRIPTION_PATHS: &[&[&str]] = &[
    &["trackAndTrace", "lastEventName"],
    &["statusText"],
    &["statusDescription"],
    &["description"],
    &["statusName"],
];

/// Timestamp of the last event.
pub const EVENT_TIME_PATHS: &[&[&str]] = &[
    &["trackAndTrace", "lastEventDate"],
    &["lastUpdateDate"],
    &["lastEventTime"],
    &["statusDate"],
];

/// Last known hub or location.
pub const HUB_PATHS: &[&[&str]] = &[
    &["deliveryFeature", "hub"],
    &["deliveryFeature", "hubDate"],
    &["actualLocation"],
    &["lastHub"],
    &["branch"],
    &["location"],
];

/// Candidate keys for the shipment's own tracking number.
pub const TRACKING_NUMBER_PATHS: &[&[&str]] = &[&["shipmentNumber"], &["ShipmentNumber"]];

/// Pick the first record out of whichever list shape the response uses.
pub fn first_item(root: &Value) -> Option<&Value> {
    if let Some(arr) = root.as_array() {
        return arr.first();
    }
    for key in LIST_KEYS {
        if let Some(arr) = root.get(*key).and_then(Value::as_array) {
            if let Some(item) = arr.first() {
                return Some(item);
            }
        }
    }
    None
}

/// Resolve an ordered path list against a record; first non-blank string wins.
pub fn first_text<'a>(item: &'a Value, paths: &[&[&str]]) -> Option<&'a str> {
    for path in paths {
        let mut node = item;
        let mut found = true;
        for key in *path {
            match node.get(*key) {
                Some(next) => node = next,
                None => {
                    found = false;
                    break;
                }
            }
        }
        if found {
            if let Some(s) = node.as_str() {
                if !s.trim().is_empty() {
                    return Some(s);
                }
            }
        }
    }
    None
}

/// Parse a vendor timestamp: RFC 3339 first, then a naive local datetime
/// treated as UTC. Anything else is dropped rather than failing the call.
pub fn parse_event_time(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    raw.parse::<NaiveDateTime>().ok().map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_first_item_accepts_all_list_shapes() {
        let top_level = json!([{"status": "A"}]);
        let items = json!({"items": [{"status": "B"}]});
        let shipments = json!({"shipments": [{"status": "C"}]});
        let data = json!({"data": [{"status": "D"}]});

        assert_eq!(first_item(&top_level).unwrap()["status"], "A");
        assert_eq!(first_item(&items).unwrap()["status"], "B");
        assert_eq!(first_item(&shipments).unwrap()["status"], "C");
        assert_eq!(first_item(&data).unwrap()["status"], "D");
    }

    #[test]
    fn test_first_item_skips_empty_lists() {
        let root = json!({"items": [], "shipments": [{"status": "X"}]});
        assert_eq!(first_item(&root).unwrap()["status"], "X");
        assert!(first_item(&json!({"items": []})).is_none());
        assert!(first_item(&json!({})).is_none());
        assert!(first_item(&json!([])).is_none());
    }

    #[test]
    fn test_first_text_respects_priority_and_blanks() {
        let item = json!({
            "trackAndTrace": {"lastEventCode": "  "},
            "status": "IN_TRANSIT",
            "state": "IGNORED"
        });
        // Nested candidate is blank, so the next rule wins.
        assert_eq!(first_text(&item, RAW_STATUS_PATHS), Some("IN_TRANSIT"));

        let nested = json!({"trackAndTrace": {"lastEventCode": "DELIVERED"}});
        assert_eq!(first_text(&nested, RAW_STATUS_PATHS), Some("DELIVERED"));

        assert_eq!(first_text(&json!({}), RAW_STATUS_PATHS), None);
    }

    #[test]
    fn test_hub_fallback_chain() {
        let item = json!({"branch": "Depot 07"});
        assert_eq!(first_text(&item, HUB_PATHS), Some("Depot 07"));

        let feature = json!({"deliveryFeature": {"hub": "HUB-PRG"}, "branch": "ignored"});
        assert_eq!(first_text(&feature, HUB_PATHS), Some("HUB-PRG"));
    }

    #[test]
    fn test_parse_event_time_formats() {
        assert!(parse_event_time("2025-03-01T10:15:00Z").is_some());
        assert!(parse_event_time("2025-03-01T10:15:00+01:00").is_some());
        // Naive datetime is accepted as UTC.
        assert!(parse_event_time("2025-03-01T10:15:00").is_some());
        assert!(parse_event_time("yesterday").is_none());
    }
}
