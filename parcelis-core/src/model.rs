use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Shipment lifecycle status.
///
/// Progression is not strictly linear: the carrier may skip intermediate
/// events, so a REQUESTED shipment can jump straight to IN_TRANSIT.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShipmentStatus {
    New,
    Requested,
    LabelReady,
    HandedOver,
    InTransit,
    Delivered,
    Cancelled,
    Error,
}

impl ShipmentStatus {
    /// Terminal statuses are excluded from the reconciliation sweep.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled | Self::Error)
    }

    pub const TERMINAL: [ShipmentStatus; 3] = [Self::Delivered, Self::Cancelled, Self::Error];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "NEW",
            Self::Requested => "REQUESTED",
            Self::LabelReady => "LABEL_READY",
            Self::HandedOver => "HANDED_OVER",
            Self::InTransit => "IN_TRANSIT",
            Self::Delivered => "DELIVERED",
            Self::Cancelled => "CANCELLED",
            Self::Error => "ERROR",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "NEW" => Some(Self::New),
            "REQUESTED" => Some(Self::Requested),
            "LABEL_READY" => Some(Self::LabelReady),
            "HANDED_OVER" => Some(Self::HandedOver),
            "IN_TRANSIT" => Some(Self::InTransit),
            "DELIVERED" => Some(Self::Delivered),
            "CANCELLED" => Some(Self::Cancelled),
            "ERROR" => Some(Self::Error),
            _ => None,
        }
    }
}

/// Persisted shipment record, one active record per order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShipmentRecord {
    pub id: Uuid,
    pub order_number: String,
    pub batch_id: String,
    pub tracking_number: Option<String>,
    pub pieces_count: i32,
    pub product_type: String,
    pub depot: Option<String>,
    /// Set once a label is stored; never cleared except by a new successful
    /// creation.
    pub label_path: Option<String>,
    pub label_mime: Option<String>,
    pub status: ShipmentStatus,
    pub status_text: Option<String>,
    pub last_sync_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ShipmentRecord {
    pub fn new(order_number: String, batch_id: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            order_number,
            batch_id,
            tracking_number: None,
            pieces_count: 1,
            product_type: String::new(),
            depot: None,
            label_path: None,
            label_mime: None,
            status: ShipmentStatus::New,
            status_text: None,
            last_sync_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply a status transition, keeping the audit timestamps current.
    pub fn set_status(&mut self, status: ShipmentStatus, text: Option<String>) {
        self.status = status;
        self.status_text = text;
        self.last_sync_at = Some(Utc::now());
        self.updated_at = Utc::now();
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Live tracking snapshot from the carrier. Transient, never persisted as-is.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackingStatus {
    pub tracking_number: String,
    pub raw_status: Option<String>,
    pub description: Option<String>,
    pub last_event_time: Option<DateTime<Utc>>,
    pub last_hub: Option<String>,
}

impl TrackingStatus {
    /// The carrier returned no record for this number. Not an error.
    pub fn not_found(tracking_number: &str) -> Self {
        Self {
            tracking_number: tracking_number.to_string(),
            raw_status: None,
            description: Some("Shipment not found".to_string()),
            last_event_time: None,
            last_hub: None,
        }
    }
}

/// What the carrier needs to create a shipment. Built per call from the
/// order plus the admin command, never stored.
#[derive(Debug, Clone)]
pub struct ShipmentRequest {
    pub order_number: String,
    pub service_code: String,
    pub recipient_name: String,
    pub recipient_street: String,
    pub recipient_city: String,
    pub recipient_zip: String,
    pub recipient_country: String,
    pub recipient_phone: Option<String>,
    pub recipient_email: Option<String>,
    pub weight_grams: u32,
}

/// Admin request to ship an order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CreateShipmentCommand {
    /// 1 = single parcel, >1 = multi-piece shipment.
    pub pieces_count: i32,
    /// Carrier product/service code per contract.
    pub product_type: String,
    /// Depot code if the carrier account requires one.
    pub depot: Option<String>,
    /// "Pdf" or "Png", case-insensitive.
    pub label_format: String,
    pub label_dpi: Option<i32>,
    /// One combined label URL for multi-piece shipments.
    pub complete_label_requested: bool,
}

impl Default for CreateShipmentCommand {
    fn default() -> Self {
        Self {
            pieces_count: 1,
            product_type: "BUSS".to_string(),
            depot: None,
            label_format: "Pdf".to_string(),
            label_dpi: Some(300),
            complete_label_requested: true,
        }
    }
}

/// Read model of an order as seen by the shipping side.
#[derive(Debug, Clone)]
pub struct OrderSnapshot {
    pub order_number: String,
    pub customer_name: String,
    pub customer_email: Option<String>,
    pub customer_phone: Option<String>,
    pub ship_street: String,
    pub ship_city: String,
    pub ship_zip: String,
    pub ship_country: String,
    pub lines: Vec<OrderLine>,
}

#[derive(Debug, Clone)]
pub struct OrderLine {
    pub weight_grams: u32,
    pub quantity: u32,
}
