//! In-memory collaborator implementations for tests and local development.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;
use uuid::Uuid;

use parcelis_core::model::{OrderSnapshot, ShipmentRecord, ShipmentStatus};
use parcelis_core::repository::{
    LabelStore, OrderGateway, RepoError, ShipmentRepository,
};

use crate::label_store::mime_for_path;

#[derive(Default)]
pub struct InMemoryShipmentRepository {
    records: Mutex<HashMap<Uuid, ShipmentRecord>>,
}

impl InMemoryShipmentRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ShipmentRepository for InMemoryShipmentRepository {
    async fn create(&self, record: &ShipmentRecord) -> Result<(), RepoError> {
        let mut records = self.records.lock().await;
        // Same uniqueness guarantee the Postgres constraint provides.
        if records
            .values()
            .any(|r| r.order_number == record.order_number)
        {
            return Err(RepoError::DuplicateOrder(record.order_number.clone()));
        }
        records.insert(record.id, record.clone());
        Ok(())
    }

    async fn update(&self, record: &ShipmentRecord) -> Result<(), RepoError> {
        let mut records = self.records.lock().await;
        if !records.contains_key(&record.id) {
            return Err(RepoError::NotFound(record.id.to_string()));
        }
        records.insert(record.id, record.clone());
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<ShipmentRecord>, RepoError> {
        Ok(self.records.lock().await.get(&id).cloned())
    }

    async fn find_by_order(
        &self,
        order_number: &str,
    ) -> Result<Option<ShipmentRecord>, RepoError> {
        Ok(self
            .records
            .lock()
            .await
            .values()
            .find(|r| r.order_number == order_number)
            .cloned())
    }

    async fn find_by_tracking(
        &self,
        tracking_number: &str,
    ) -> Result<Option<ShipmentRecord>, RepoError> {
        Ok(self
            .records
            .lock()
            .await
            .values()
            .find(|r| r.tracking_number.as_deref() == Some(tracking_number))
            .cloned())
    }

    async fn list_unfinished(
        &self,
        exclude: &[ShipmentStatus],
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ShipmentRecord>, RepoError> {
        let records = self.records.lock().await;
        let mut matching: Vec<ShipmentRecord> = records
            .values()
            .filter(|r| !exclude.contains(&r.status))
            .cloned()
            .collect();
        matching.sort_by_key(|r| r.created_at);
        Ok(matching
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }
}

#[derive(Default)]
pub struct InMemoryOrderGateway {
    orders: Mutex<HashMap<String, OrderSnapshot>>,
}

impl InMemoryOrderGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, order: OrderSnapshot) {
        self.orders
            .lock()
            .await
            .insert(order.order_number.clone(), order);
    }
}

#[async_trait]
impl OrderGateway for InMemoryOrderGateway {
    async fn find_by_number(
        &self,
        order_number: &str,
    ) -> Result<Option<OrderSnapshot>, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.orders.lock().await.get(order_number).cloned())
    }
}

#[derive(Default)]
pub struct InMemoryLabelStore {
    files: Mutex<HashMap<String, Vec<u8>>>,
}

impl InMemoryLabelStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LabelStore for InMemoryLabelStore {
    async fn write(
        &self,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
        let path = format!("mem/{}", file_name);
        self.files.lock().await.insert(path.clone(), bytes.to_vec());
        Ok(path)
    }

    async fn read(
        &self,
        path: &str,
    ) -> Result<(Vec<u8>, String), Box<dyn std::error::Error + Send + Sync>> {
        let files = self.files.lock().await;
        let bytes = files
            .get(path)
            .cloned()
            .ok_or_else(|| format!("label not found: {}", path))?;
        Ok((bytes, mime_for_path(path).to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_duplicate_order_rejected() {
        let repo = InMemoryShipmentRepository::new();
        let first = ShipmentRecord::new("ORD-1".to_string(), "batch-1".to_string());
        let second = ShipmentRecord::new("ORD-1".to_string(), "batch-2".to_string());

        repo.create(&first).await.unwrap();
        let err = repo.create(&second).await.unwrap_err();
        assert!(matches!(err, RepoError::DuplicateOrder(_)));
    }

    #[tokio::test]
    async fn test_list_unfinished_excludes_terminal() {
        let repo = InMemoryShipmentRepository::new();

        let mut delivered = ShipmentRecord::new("ORD-1".to_string(), "b1".to_string());
        delivered.set_status(ShipmentStatus::Delivered, None);
        let mut moving = ShipmentRecord::new("ORD-2".to_string(), "b2".to_string());
        moving.set_status(ShipmentStatus::InTransit, None);

        repo.create(&delivered).await.unwrap();
        repo.create(&moving).await.unwrap();

        let page = repo
            .list_unfinished(&ShipmentStatus::TERMINAL, 10, 0)
            .await
            .unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].order_number, "ORD-2");
    }
}
