use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

use parcelis_carrier::{CarrierApi, CarrierError};
use parcelis_core::model::{
    CreateShipmentCommand, OrderSnapshot, ShipmentRecord, ShipmentRequest, ShipmentStatus,
    TrackingStatus,
};
use parcelis_core::repository::{LabelStore, OrderGateway, RepoError, ShipmentRepository};

use crate::refresh::{apply_tracking_result, RefreshFailurePolicy};
use crate::weight::total_weight_grams;

#[derive(Debug, thiserror::Error)]
pub enum ShippingError {
    #[error("order not found: {0}")]
    OrderNotFound(String),

    #[error("shipment not found: {0}")]
    ShipmentNotFound(String),

    #[error("shipment {0} has no stored label")]
    NoLabelStored(Uuid),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Carrier(#[from] CarrierError),

    #[error(transparent)]
    Store(#[from] RepoError),

    #[error("order lookup failed: {0}")]
    OrderGateway(String),

    #[error("label storage failed: {0}")]
    LabelStorage(String),
}

/// A stored label ready to be served for download.
pub struct LabelFile {
    pub bytes: Vec<u8>,
    pub mime: String,
    pub file_name: String,
}

/// Turns orders into carrier shipments and keeps their records current.
pub struct ShipmentOrchestrator {
    orders: Arc<dyn OrderGateway>,
    shipments: Arc<dyn ShipmentRepository>,
    labels: Arc<dyn LabelStore>,
    carrier: Arc<dyn CarrierApi>,
}

impl ShipmentOrchestrator {
    pub fn new(
        orders: Arc<dyn OrderGateway>,
        shipments: Arc<dyn ShipmentRepository>,
        labels: Arc<dyn LabelStore>,
        carrier: Arc<dyn CarrierApi>,
    ) -> Self {
        Self {
            orders,
            shipments,
            labels,
            carrier,
        }
    }

    /// Create a shipment for an order and store its label if the carrier
    /// already produced one.
    ///
    /// Idempotent by order: an existing record is returned unchanged without
    /// another carrier call. A missing label is not a failure; the record is
    /// persisted as pending.
    pub async fn create_and_label(
        &self,
        order_number: &str,
        command: &CreateShipmentCommand,
    ) -> Result<ShipmentRecord, ShippingError> {
        if let Some(existing) = self.shipments.find_by_order(order_number).await? {
            return Ok(existing);
        }

        let order = self
            .orders
            .find_by_number(order_number)
            .await
            .map_err(|e| ShippingError::OrderGateway(e.to_string()))?
            .ok_or_else(|| ShippingError::OrderNotFound(order_number.to_string()))?;

        let pieces = command.pieces_count.max(1);
        let request = build_carrier_request(&order, command, pieces);

        let created = self.carrier.create_shipment(&request, command).await?;

        let mut label_path = None;
        let mut label_mime = None;
        if let Some(bytes) = created.label_bytes.as_deref().filter(|b| !b.is_empty()) {
            let ext = if created.label_mime.to_lowercase().contains("png") {
                "png"
            } else {
                "pdf"
            };
            let file_name = format!("shipment-{}.{}", order_number, ext);
            match self.labels.write(&file_name, bytes).await {
                Ok(path) => {
                    label_path = Some(path);
                    label_mime = Some(created.label_mime.clone());
                }
                Err(e) => {
                    // Degrade to a pending record; the label can be fetched
                    // again later.
                    warn!(order = %order_number, error = %e, "storing label failed");
                }
            }
        }

        let mut record = ShipmentRecord::new(order_number.to_string(), created.batch_id.clone());
        record.tracking_number = created.tracking_number.clone();
        record.pieces_count = pieces;
        record.product_type = request.service_code.clone();
        record.depot = command.depot.clone();
        record.label_path = label_path;
        record.label_mime = label_mime;

        if record.label_path.is_some() {
            record.status = ShipmentStatus::LabelReady;
            record.status_text = Some(if record.tracking_number.is_none() {
                "Label stored (tracking pending)".to_string()
            } else {
                "Label stored".to_string()
            });
        } else {
            record.status = ShipmentStatus::Requested;
            record.status_text = Some("Label pending".to_string());
        }

        match self.shipments.create(&record).await {
            Ok(()) => {
                info!(
                    order = %order_number,
                    batch_id = %record.batch_id,
                    status = record.status.as_str(),
                    "shipment created"
                );
                Ok(record)
            }
            Err(RepoError::DuplicateOrder(_)) => {
                // Lost a creation race; the unique constraint caught it.
                // Return the winner's record instead of failing.
                self.shipments
                    .find_by_order(order_number)
                    .await?
                    .ok_or_else(|| ShippingError::ShipmentNotFound(order_number.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Query the carrier and fold the result into the record.
    ///
    /// Without a tracking number there is nothing to ask the carrier for,
    /// so only the update timestamp moves. A query failure is recorded as
    /// `ERROR` on the record and surfaced through it, never raised.
    pub async fn refresh_tracking(&self, id: Uuid) -> Result<ShipmentRecord, ShippingError> {
        let mut record = self
            .shipments
            .get(id)
            .await?
            .ok_or_else(|| ShippingError::ShipmentNotFound(id.to_string()))?;

        let tracking = match record.tracking_number.clone().filter(|t| !t.trim().is_empty()) {
            Some(t) => t,
            None => {
                record.touch();
                self.shipments.update(&record).await?;
                return Ok(record);
            }
        };

        let result = self.carrier.track(&tracking).await;
        if let Err(err) =
            apply_tracking_result(&mut record, result, RefreshFailurePolicy::MarkError)
        {
            error!(tracking = %tracking, error = %err, "tracking refresh failed, recorded on shipment");
        }
        self.shipments.update(&record).await?;
        Ok(record)
    }

    pub async fn get(&self, id: Uuid) -> Result<ShipmentRecord, ShippingError> {
        self.shipments
            .get(id)
            .await?
            .ok_or_else(|| ShippingError::ShipmentNotFound(id.to_string()))
    }

    pub async fn find_by_order(
        &self,
        order_number: &str,
    ) -> Result<Option<ShipmentRecord>, ShippingError> {
        Ok(self.shipments.find_by_order(order_number).await?)
    }

    /// Load the stored label document for download.
    pub async fn load_label(&self, id: Uuid) -> Result<LabelFile, ShippingError> {
        let record = self.get(id).await?;
        let path = record
            .label_path
            .as_deref()
            .ok_or(ShippingError::NoLabelStored(id))?;

        let (bytes, mime) = self
            .labels
            .read(path)
            .await
            .map_err(|e| ShippingError::LabelStorage(e.to_string()))?;

        let file_name = path
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or("label.pdf")
            .to_string();

        Ok(LabelFile {
            bytes,
            mime,
            file_name,
        })
    }

    /// Live tracking straight from the carrier, bypassing any persisted
    /// record.
    pub async fn track_by_number(
        &self,
        tracking_number: &str,
    ) -> Result<TrackingStatus, ShippingError> {
        if tracking_number.trim().is_empty() {
            return Err(ShippingError::InvalidInput(
                "tracking number is empty".to_string(),
            ));
        }
        Ok(self.carrier.track(tracking_number).await?)
    }
}

/// Map the order snapshot plus the admin command onto a carrier request.
fn build_carrier_request(
    order: &OrderSnapshot,
    command: &CreateShipmentCommand,
    pieces: i32,
) -> ShipmentRequest {
    ShipmentRequest {
        order_number: order.order_number.clone(),
        service_code: command.product_type.clone(),
        recipient_name: order.customer_name.clone(),
        recipient_street: order.ship_street.clone(),
        recipient_city: order.ship_city.clone(),
        recipient_zip: order.ship_zip.clone(),
        recipient_country: order.ship_country.clone(),
        recipient_phone: order.customer_phone.clone(),
        recipient_email: order.customer_email.clone(),
        weight_grams: total_weight_grams(order, pieces),
    }
}
