pub mod orchestrator;
pub mod reconcile;
pub mod refresh;
pub mod weight;

pub use orchestrator::{LabelFile, ShipmentOrchestrator, ShippingError};
pub use reconcile::{ReconciliationJob, SweepStats};
pub use refresh::{apply_tracking_result, RefreshFailurePolicy};
