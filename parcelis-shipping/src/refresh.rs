use parcelis_carrier::CarrierError;
use parcelis_core::model::{ShipmentRecord, ShipmentStatus, TrackingStatus};
use parcelis_core::status::map_raw_status;

/// What to do with a shipment record when its tracking query fails.
///
/// The two callers deliberately differ: a manual refresh marks the record
/// `ERROR` so the failure is immediately visible to whoever asked, while
/// the scheduled sweep leaves the status untouched so the record stays in
/// the non-terminal set and is retried on the next pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshFailurePolicy {
    MarkError,
    LeaveUnchanged,
}

/// Apply a tracking query outcome to a record. On success the vendor status
/// is mapped onto the internal taxonomy; on failure the record changes
/// according to the policy and the error is handed back for logging.
pub fn apply_tracking_result(
    record: &mut ShipmentRecord,
    result: Result<TrackingStatus, CarrierError>,
    policy: RefreshFailurePolicy,
) -> Result<(), CarrierError> {
    match result {
        Ok(status) => {
            if !status.tracking_number.trim().is_empty() {
                record.tracking_number = Some(status.tracking_number.clone());
            }
            let mapped = map_raw_status(status.raw_status.as_deref());
            record.set_status(mapped, status.description);
            Ok(())
        }
        Err(err) => {
            match policy {
                RefreshFailurePolicy::MarkError => {
                    record.set_status(
                        ShipmentStatus::Error,
                        Some(format!("Tracking refresh failed: {}", err)),
                    );
                }
                RefreshFailurePolicy::LeaveUnchanged => {
                    record.touch();
                }
            }
            Err(err)
        }
    }
}
