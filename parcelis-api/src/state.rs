use parcelis_shipping::ShipmentOrchestrator;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<ShipmentOrchestrator>,
}
