use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use uuid::Uuid;

use parcelis_core::model::{CreateShipmentCommand, ShipmentRecord, TrackingStatus};

use crate::error::AppError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/shipping/shipments/{key}",
            post(create_shipment).get(get_shipment),
        )
        .route("/api/shipping/shipments/{id}/label", get(download_label))
        .route("/api/shipping/shipments/{id}/refresh", post(refresh_tracking))
        .route(
            "/api/shipping/shipments/by-order/{order_number}",
            get(by_order),
        )
        .route(
            "/api/shipping/shipments/track/{tracking_number}",
            get(track),
        )
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ShipmentDto {
    shipment_id: Uuid,
    order_number: String,
    batch_id: String,
    tracking_number: Option<String>,
    pieces_count: i32,
    status: String,
    status_text: Option<String>,
    label_download_url: Option<String>,
}

impl From<ShipmentRecord> for ShipmentDto {
    fn from(record: ShipmentRecord) -> Self {
        let label_download_url = record
            .label_path
            .as_ref()
            .map(|_| format!("/api/shipping/shipments/{}/label", record.id));
        Self {
            shipment_id: record.id,
            order_number: record.order_number,
            batch_id: record.batch_id,
            tracking_number: record.tracking_number,
            pieces_count: record.pieces_count,
            status: record.status.as_str().to_string(),
            status_text: record.status_text,
            label_download_url,
        }
    }
}

fn parse_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::Validation(format!("invalid shipment id: {}", raw)))
}

/// Create a shipment at the carrier and store its label.
async fn create_shipment(
    State(state): State<AppState>,
    Path(order_number): Path<String>,
    Json(command): Json<CreateShipmentCommand>,
) -> Result<Json<ShipmentDto>, AppError> {
    let record = state
        .orchestrator
        .create_and_label(&order_number, &command)
        .await?;
    Ok(Json(record.into()))
}

/// Shipment detail; refreshes tracking before answering.
async fn get_shipment(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<ShipmentDto>, AppError> {
    let id = parse_id(&key)?;
    let record = state.orchestrator.refresh_tracking(id).await?;
    Ok(Json(record.into()))
}

/// Download the stored label document.
async fn download_label(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let id = parse_id(&id)?;
    let label = state.orchestrator.load_label(id).await?;

    let headers = [
        (header::CONTENT_TYPE, label.mime),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", label.file_name),
        ),
    ];
    Ok((StatusCode::OK, headers, label.bytes).into_response())
}

/// Force a tracking refresh and return the updated shipment.
async fn refresh_tracking(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ShipmentDto>, AppError> {
    let id = parse_id(&id)?;
    let record = state.orchestrator.refresh_tracking(id).await?;
    Ok(Json(record.into()))
}

/// Find a shipment by order number; 404 when the order has none yet.
async fn by_order(
    State(state): State<AppState>,
    Path(order_number): Path<String>,
) -> Result<Json<ShipmentDto>, AppError> {
    match state.orchestrator.find_by_order(&order_number).await? {
        Some(record) => Ok(Json(record.into())),
        None => Err(AppError::NotFound(format!(
            "no shipment for order {}",
            order_number
        ))),
    }
}

/// Live tracking by number, even when the shipment is not in our store.
async fn track(
    State(state): State<AppState>,
    Path(tracking_number): Path<String>,
) -> Result<Json<TrackingStatus>, AppError> {
    let status = state.orchestrator.track_by_number(&tracking_number).await?;
    Ok(Json(status))
}
