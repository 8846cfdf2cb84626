use async_trait::async_trait;
use uuid::Uuid;

use crate::model::{OrderSnapshot, ShipmentRecord, ShipmentStatus};

/// Shipment persistence failures that callers branch on.
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    /// A record for this order already exists. The storage layer enforces
    /// order uniqueness, so concurrent duplicate creates surface here and
    /// the caller re-reads the existing record instead of failing.
    #[error("shipment already exists for order {0}")]
    DuplicateOrder(String),

    #[error("shipment not found: {0}")]
    NotFound(String),

    #[error("storage error: {0}")]
    Backend(String),
}

/// Repository trait for shipment record access.
#[async_trait]
pub trait ShipmentRepository: Send + Sync {
    async fn create(&self, record: &ShipmentRecord) -> Result<(), RepoError>;

    async fn update(&self, record: &ShipmentRecord) -> Result<(), RepoError>;

    async fn get(&self, id: Uuid) -> Result<Option<ShipmentRecord>, RepoError>;

    async fn find_by_order(
        &self,
        order_number: &str,
    ) -> Result<Option<ShipmentRecord>, RepoError>;

    async fn find_by_tracking(
        &self,
        tracking_number: &str,
    ) -> Result<Option<ShipmentRecord>, RepoError>;

    /// List records whose status is not in `exclude`, paged by `limit`/`offset`.
    async fn list_unfinished(
        &self,
        exclude: &[ShipmentStatus],
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ShipmentRecord>, RepoError>;
}

/// Read-only access to the order side of the house.
#[async_trait]
pub trait OrderGateway: Send + Sync {
    async fn find_by_number(
        &self,
        order_number: &str,
    ) -> Result<Option<OrderSnapshot>, Box<dyn std::error::Error + Send + Sync>>;
}

/// Write/read contract for stored label documents.
#[async_trait]
pub trait LabelStore: Send + Sync {
    /// Write bytes under `file_name` and return the stored path.
    async fn write(
        &self,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<String, Box<dyn std::error::Error + Send + Sync>>;

    /// Read bytes and MIME type back by stored path.
    async fn read(
        &self,
        path: &str,
    ) -> Result<(Vec<u8>, String), Box<dyn std::error::Error + Send + Sync>>;
}
