use crate::model::ShipmentStatus;

/// Map a raw vendor status string onto the internal taxonomy.
///
/// Matching is case-insensitive substring search in fixed priority order,
/// so a string matching several categories resolves to the earliest one.
/// Unknown or empty input defaults to REQUESTED.
pub fn map_raw_status(raw: Option<&str>) -> ShipmentStatus {
    let raw = match raw {
        Some(s) if !s.trim().is_empty() => s.to_uppercase(),
        _ => return ShipmentStatus::Requested,
    };

    if raw.contains("DELIVERED") || raw.contains("DORUČ") || raw.contains("DORUC") {
        ShipmentStatus::Delivered
    } else if raw.contains("CANCEL") {
        ShipmentStatus::Cancelled
    } else if raw.contains("HAND") && raw.contains("OVER") {
        ShipmentStatus::HandedOver
    } else if raw.contains("TRANSIT") || raw.contains("ROUTE") {
        ShipmentStatus::InTransit
    } else if raw.contains("LABEL") || raw.contains("PRINT") {
        ShipmentStatus::LabelReady
    } else if raw.contains("REQUEST")
        || raw.contains("ACCEPT")
        || raw.contains("CREATED")
        || raw.contains("PENDING")
    {
        ShipmentStatus::Requested
    } else {
        ShipmentStatus::Requested
    }
}
