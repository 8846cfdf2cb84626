use serde::Serialize;
use tracing::{info, warn};

use parcelis_core::model::{CreateShipmentCommand, ShipmentRequest};

use crate::config::CarrierConfig;

/// Minimum billable weight per piece, in kilograms.
const MIN_PIECE_WEIGHT_KG: f64 = 0.01;

/// Per-piece weight in kilograms: the declared total divided evenly across
/// pieces, rounded up to 2 decimals and floored at 0.01 kg. The carrier
/// rejects zero or negative weights.
pub fn weight_per_piece(total_grams: u32, pieces: u32) -> f64 {
    let pieces = pieces.max(1);
    if total_grams == 0 {
        return MIN_PIECE_WEIGHT_KG;
    }
    // Integer ceiling in units of 10 g (= 0.01 kg) avoids float rounding.
    let per_centikg = (u64::from(total_grams)).div_ceil(u64::from(pieces) * 10);
    (per_centikg.max(1)) as f64 / 100.0
}

/// Label MIME type the carrier will produce for a requested format.
pub fn mime_for_format(format: &str) -> &'static str {
    if format.trim().eq_ignore_ascii_case("png") {
        "image/png"
    } else {
        "application/pdf"
    }
}

/// Normalize the configured age-verification code for the wire.
/// Plain numbers get an "A" prefix ("18" -> "A18"); blank falls back to A18.
pub fn age_check_code(cfg: &CarrierConfig) -> Option<String> {
    if !cfg.age_check.enabled {
        return None;
    }
    match cfg.age_check.code.as_deref().map(str::trim) {
        Some(code) if !code.is_empty() => {
            let code = code.to_uppercase();
            if code.chars().all(|c| c.is_ascii_digit()) {
                Some(format!("A{}", code))
            } else {
                Some(code)
            }
        }
        _ => Some("A18".to_string()),
    }
}

// Wire types for the batch-creation endpoint. Optional objects are real
// nulls, never empty objects: the carrier treats `{}` as a request for the
// feature.

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchRequest {
    pub return_channel: ReturnChannel,
    pub label_settings: LabelSettings,
    pub shipments: Vec<Shipment>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReturnChannel {
    #[serde(rename = "type")]
    pub channel_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelSettings {
    pub format: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dpi: Option<i32>,
    pub complete_label_settings: CompleteLabelSettings,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteLabelSettings {
    pub is_complete_label_requested: bool,
    pub page_size: String,
    pub position: i32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Shipment {
    pub product_type: String,
    pub reference_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub depot: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub integrator_id: Option<String>,
    pub shipment_set: ShipmentSet,
    pub sender: Address,
    pub recipient: Address,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age_check: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShipmentSet {
    pub number_of_shipments: u32,
    pub shipment_set_items: Vec<ShipmentSetItem>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShipmentSetItem {
    pub weighed_shipment_info: WeighedShipmentInfo,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeighedShipmentInfo {
    pub weight: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub name: String,
    pub street: String,
    pub city: String,
    pub zip_code: String,
    pub country: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Build the batch payload for a single shipment of one or more pieces.
pub fn build_batch_request(
    cfg: &CarrierConfig,
    req: &ShipmentRequest,
    cmd: &CreateShipmentCommand,
) -> BatchRequest {
    let pieces = cmd.pieces_count.max(1) as u32;

    let mut total_grams = req.weight_grams;
    if total_grams == 0 {
        warn!(
            order = %req.order_number,
            "no declared weight on shipment request, falling back to 10 g"
        );
        total_grams = 10;
    }
    let per_piece = weight_per_piece(total_grams, pieces);

    let items = (0..pieces)
        .map(|_| ShipmentSetItem {
            weighed_shipment_info: WeighedShipmentInfo { weight: per_piece },
        })
        .collect();

    let sender = Address {
        name: cfg.sender.name.clone(),
        street: cfg.sender.street.clone(),
        city: cfg.sender.city.clone(),
        zip_code: cfg.sender.zip_code.clone(),
        country: cfg.sender.country.clone(),
        contact: cfg.sender.contact.clone(),
        phone: cfg.sender.phone.clone(),
        email: cfg.sender.email.clone(),
    };

    let recipient = Address {
        name: req.recipient_name.clone(),
        street: req.recipient_street.clone(),
        city: req.recipient_city.clone(),
        zip_code: req.recipient_zip.clone(),
        country: req.recipient_country.clone(),
        contact: None,
        phone: req.recipient_phone.clone(),
        email: req.recipient_email.clone(),
    };

    let age_check = age_check_code(cfg);

    info!(
        order = %req.order_number,
        pieces,
        total_grams,
        per_piece_kg = per_piece,
        age_check = age_check.as_deref().unwrap_or("-"),
        "building carrier batch payload"
    );

    BatchRequest {
        return_channel: ReturnChannel {
            channel_type: "Email".to_string(),
            address: req.recipient_email.clone(),
        },
        label_settings: LabelSettings {
            format: cmd.label_format.clone(),
            dpi: cmd.label_dpi,
            complete_label_settings: CompleteLabelSettings {
                is_complete_label_requested: cmd.complete_label_requested,
                page_size: "A4".to_string(),
                position: 1,
            },
        },
        shipments: vec![Shipment {
            product_type: req.service_code.clone(),
            reference_id: req.order_number.clone(),
            depot: cmd.depot.clone().or_else(|| cfg.sender.depot.clone()),
            integrator_id: cfg.sender.integrator_id.clone(),
            shipment_set: ShipmentSet {
                number_of_shipments: pieces,
                shipment_set_items: items,
            },
            sender,
            recipient,
            age_check,
        }],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AgeCheckConfig, OauthConfig, SenderConfig};

    fn config(age_check: AgeCheckConfig) -> CarrierConfig {
        CarrierConfig {
            api_base: "https://api.carrier.test/v1".to_string(),
            oauth: OauthConfig {
                token_url: "https://login.carrier.test/token".to_string(),
                client_id: "id".to_string(),
                client_secret: "secret".to_string(),
                scope: None,
            },
            sender: SenderConfig {
                name: "Parcelis s.r.o.".to_string(),
                street: "Skladová 12".to_string(),
                city: "Praha".to_string(),
                zip_code: "11000".to_string(),
                country: "CZ".to_string(),
                contact: None,
                phone: None,
                email: Some("expedice@parcelis.test".to_string()),
                depot: Some("07".to_string()),
                integrator_id: None,
            },
            age_check,
        }
    }

    fn request() -> ShipmentRequest {
        ShipmentRequest {
            order_number: "ORD-1001".to_string(),
            service_code: "BUSS".to_string(),
            recipient_name: "Jana Novak".to_string(),
            recipient_street: "Dlouhá 1".to_string(),
            recipient_city: "Brno".to_string(),
            recipient_zip: "60200".to_string(),
            recipient_country: "CZ".to_string(),
            recipient_phone: Some("+420123456789".to_string()),
            recipient_email: Some("jana@example.com".to_string()),
            weight_grams: 460,
        }
    }

    #[test]
    fn test_weight_divided_and_rounded_up() {
        assert_eq!(weight_per_piece(460, 1), 0.46);
        assert_eq!(weight_per_piece(460, 2), 0.23);
        // 1000 / 3 = 333.33 g -> rounds UP to 0.34 kg.
        assert_eq!(weight_per_piece(1000, 3), 0.34);
    }

    #[test]
    fn test_weight_never_rounds_to_zero() {
        // 25 g over 3 pieces is ~8 g each, still billed as 0.01 kg.
        assert_eq!(weight_per_piece(25, 3), 0.01);
        assert_eq!(weight_per_piece(0, 1), 0.01);
        assert_eq!(weight_per_piece(1, 1), 0.01);
    }

    #[test]
    fn test_mime_for_format() {
        assert_eq!(mime_for_format("Png"), "image/png");
        assert_eq!(mime_for_format("Pdf"), "application/pdf");
        assert_eq!(mime_for_format(""), "application/pdf");
    }

    #[test]
    fn test_age_check_normalization() {
        let on = |code: Option<&str>| {
            age_check_code(&config(AgeCheckConfig {
                enabled: true,
                code: code.map(str::to_string),
            }))
        };
        assert_eq!(on(Some("18")), Some("A18".to_string()));
        assert_eq!(on(Some("a15")), Some("A15".to_string()));
        assert_eq!(on(Some("  ")), Some("A18".to_string()));
        assert_eq!(on(None), Some("A18".to_string()));

        let off = age_check_code(&config(AgeCheckConfig {
            enabled: false,
            code: Some("18".to_string()),
        }));
        assert_eq!(off, None);
    }

    #[test]
    fn test_payload_shape() {
        let cfg = config(AgeCheckConfig {
            enabled: true,
            code: Some("18".to_string()),
        });
        let cmd = CreateShipmentCommand {
            pieces_count: 2,
            ..Default::default()
        };
        let payload = build_batch_request(&cfg, &request(), &cmd);

        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["shipments"][0]["referenceId"], "ORD-1001");
        assert_eq!(json["shipments"][0]["ageCheck"], "A18");
        assert_eq!(json["shipments"][0]["depot"], "07");
        assert_eq!(
            json["shipments"][0]["shipmentSet"]["numberOfShipments"],
            2
        );
        // 460 g over 2 pieces -> 0.23 kg each.
        assert_eq!(
            json["shipments"][0]["shipmentSet"]["shipmentSetItems"][0]["weighedShipmentInfo"]
                ["weight"],
            0.23
        );
        assert_eq!(json["labelSettings"]["completeLabelSettings"]["pageSize"], "A4");
        // Unused optionals must be absent, not null-ish empty objects.
        assert!(json["shipments"][0].get("senderMask").is_none());
    }

    #[test]
    fn test_zero_weight_falls_back_to_minimum() {
        let cfg = config(AgeCheckConfig::default());
        let mut req = request();
        req.weight_grams = 0;
        let payload = build_batch_request(&cfg, &req, &CreateShipmentCommand::default());
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(
            json["shipments"][0]["shipmentSet"]["shipmentSetItems"][0]["weighedShipmentInfo"]
                ["weight"],
            0.01
        );
    }
}
