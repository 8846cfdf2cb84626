use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use parcelis_shipping::ShippingError;

#[derive(Debug)]
pub enum AppError {
    NotFound(String),
    Validation(String),
    Upstream(String),
    Internal(String),
}

impl From<ShippingError> for AppError {
    fn from(err: ShippingError) -> Self {
        match err {
            ShippingError::OrderNotFound(_)
            | ShippingError::ShipmentNotFound(_)
            | ShippingError::NoLabelStored(_) => AppError::NotFound(err.to_string()),
            ShippingError::InvalidInput(_) => AppError::Validation(err.to_string()),
            ShippingError::Carrier(_) => AppError::Upstream(err.to_string()),
            ShippingError::Store(_)
            | ShippingError::OrderGateway(_)
            | ShippingError::LabelStorage(_) => AppError::Internal(err.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Upstream(msg) => {
                tracing::error!("Carrier call failed: {}", msg);
                (StatusCode::BAD_GATEWAY, msg)
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}
