use async_trait::async_trait;
use reqwest::header;
use reqwest::StatusCode;
use std::time::Duration;
use tracing::{error, info, warn};

use parcelis_core::model::{CreateShipmentCommand, ShipmentRequest, TrackingStatus};

use crate::config::CarrierConfig;
use crate::extract;
use crate::payload::{build_batch_request, mime_for_format};
use crate::poll::{poll_for_label, LabelPoll, LabelSource, PollPolicy};
use crate::token::{OauthTokenFetcher, TokenCache};

#[derive(Debug, thiserror::Error)]
pub enum CarrierError {
    #[error("carrier auth failed: {0}")]
    Auth(String),

    #[error("carrier request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("carrier rejected request with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("batch creation returned no Location header with a batch id")]
    MissingBatchLocation,

    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// Result of a shipment creation. The label is optional: the carrier
/// renders it asynchronously and polling may run out of attempts.
#[derive(Debug, Clone)]
pub struct ShipmentCreated {
    pub batch_id: String,
    /// Assigned later by the carrier; not part of the batch response.
    pub tracking_number: Option<String>,
    pub label_bytes: Option<Vec<u8>>,
    pub label_mime: String,
}

/// The carrier operations the rest of the system depends on.
#[async_trait]
pub trait CarrierApi: Send + Sync {
    async fn create_shipment(
        &self,
        request: &ShipmentRequest,
        command: &CreateShipmentCommand,
    ) -> Result<ShipmentCreated, CarrierError>;

    async fn track(&self, tracking_number: &str) -> Result<TrackingStatus, CarrierError>;
}

/// Reqwest-backed carrier client with a process-wide token cache.
pub struct HttpCarrierClient {
    http: reqwest::Client,
    cfg: CarrierConfig,
    tokens: TokenCache,
    poll_policy: PollPolicy,
}

impl HttpCarrierClient {
    pub fn new(cfg: CarrierConfig) -> Result<Self, CarrierError> {
        cfg.validate().map_err(CarrierError::InvalidInput)?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        let tokens = TokenCache::new(Box::new(OauthTokenFetcher::new(
            http.clone(),
            cfg.oauth.clone(),
        )));

        Ok(Self {
            http,
            cfg,
            tokens,
            poll_policy: PollPolicy::default(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.cfg.api_base.trim_end_matches('/'), path)
    }

    /// Send a bearer-authorized request. On 401/403 or an `invalid_token`
    /// challenge the token is force-refreshed and the identical request is
    /// retried exactly once.
    async fn send_with_auth<F>(&self, build: F) -> Result<reqwest::Response, CarrierError>
    where
        F: Fn() -> reqwest::RequestBuilder,
    {
        let token = self.tokens.token().await?;
        let resp = build().bearer_auth(&token).send().await?;
        if !token_rejected(&resp) {
            return Ok(resp);
        }

        warn!(
            status = resp.status().as_u16(),
            "carrier rejected bearer token, forcing refresh and retrying once"
        );
        let fresh = self.tokens.force_refresh().await?;
        Ok(build().bearer_auth(&fresh).send().await?)
    }
}

fn token_rejected(resp: &reqwest::Response) -> bool {
    let status = resp.status();
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return true;
    }
    resp.headers()
        .get(header::WWW_AUTHENTICATE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_ascii_lowercase().contains("invalid_token"))
        .unwrap_or(false)
}

/// Trailing path segment of the batch resource Location, ignoring any
/// query string or fragment.
pub fn batch_id_from_location(location: &str) -> Option<String> {
    let path = location.split(['?', '#']).next()?;
    let segment = path.trim_end_matches('/').rsplit('/').next()?;
    if segment.is_empty() {
        None
    } else {
        Some(segment.to_string())
    }
}

#[async_trait]
impl LabelSource for HttpCarrierClient {
    async fn fetch_label(&self, batch_id: &str) -> Result<LabelPoll, CarrierError> {
        let url = self.endpoint(&format!("/shipment/batch/{}/label", batch_id));
        let resp = self
            .send_with_auth(|| {
                self.http.get(&url).query(&[
                    ("pageSize", "A4"),
                    ("position", "1"),
                    ("limit", "200"),
                    ("offset", "0"),
                ])
            })
            .await?;

        let status = resp.status();
        if status.is_success() {
            let mime = resp
                .headers()
                .get(header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            let bytes = resp.bytes().await?.to_vec();
            return Ok(LabelPoll::Ready { bytes, mime });
        }
        if status == StatusCode::NOT_FOUND {
            return Ok(LabelPoll::NotReady);
        }

        let body = resp.text().await.unwrap_or_default();
        Err(CarrierError::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl CarrierApi for HttpCarrierClient {
    async fn create_shipment(
        &self,
        request: &ShipmentRequest,
        command: &CreateShipmentCommand,
    ) -> Result<ShipmentCreated, CarrierError> {
        let payload = build_batch_request(&self.cfg, request, command);
        let url = self.endpoint("/shipment/batch");

        let resp = self
            .send_with_auth(|| self.http.post(&url).json(&payload))
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            error!(
                order = %request.order_number,
                status = status.as_u16(),
                "carrier batch creation rejected: {}",
                body
            );
            return Err(CarrierError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let batch_id = resp
            .headers()
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .and_then(batch_id_from_location)
            .ok_or(CarrierError::MissingBatchLocation)?;

        info!(order = %request.order_number, batch_id = %batch_id, "carrier batch accepted, polling for label");

        let label = poll_for_label(self, &batch_id, self.poll_policy).await?;
        let fallback_mime = mime_for_format(&command.label_format).to_string();
        let (label_bytes, label_mime) = match label {
            Some((bytes, mime)) => (Some(bytes), mime.unwrap_or(fallback_mime)),
            None => {
                info!(batch_id = %batch_id, "label not ready after polling, proceeding as pending");
                (None, fallback_mime)
            }
        };

        Ok(ShipmentCreated {
            batch_id,
            tracking_number: None,
            label_bytes,
            label_mime,
        })
    }

    async fn track(&self, tracking_number: &str) -> Result<TrackingStatus, CarrierError> {
        if tracking_number.trim().is_empty() {
            return Err(CarrierError::InvalidInput(
                "tracking number is empty".to_string(),
            ));
        }

        let url = self.endpoint("/shipment");
        let resp = self
            .send_with_auth(|| {
                self.http.get(&url).query(&[
                    ("ShipmentNumbers", tracking_number),
                    ("Limit", "1"),
                    ("Offset", "0"),
                ])
            })
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(CarrierError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let root: serde_json::Value = resp.json().await?;
        let item = match extract::first_item(&root) {
            Some(item) => item,
            None => return Ok(TrackingStatus::not_found(tracking_number)),
        };

        let number = extract::first_text(item, extract::TRACKING_NUMBER_PATHS)
            .unwrap_or(tracking_number)
            .to_string();

        Ok(TrackingStatus {
            tracking_number: number,
            raw_status: extract::first_text(item, extract::RAW_STATUS_PATHS).map(str::to_string),
            description: extract::first_text(item, extract::DESCRIPTION_PATHS).map(str::to_string),
            last_event_time: extract::first_text(item, extract::EVENT_TIME_PATHS)
                .and_then(extract::parse_event_time),
            last_hub: extract::first_text(item, extract::HUB_PATHS).map(str::to_string),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_id_from_location() {
        assert_eq!(
            batch_id_from_location("/shipment/batch/abc-123"),
            Some("abc-123".to_string())
        );
        assert_eq!(
            batch_id_from_location("https://api.carrier.test/v1/shipment/batch/abc-123"),
            Some("abc-123".to_string())
        );
        assert_eq!(
            batch_id_from_location("/shipment/batch/abc-123?limit=1#frag"),
            Some("abc-123".to_string())
        );
        assert_eq!(
            batch_id_from_location("/shipment/batch/abc-123/"),
            Some("abc-123".to_string())
        );
        assert_eq!(batch_id_from_location(""), None);
        assert_eq!(batch_id_from_location("/"), None);
    }
}
