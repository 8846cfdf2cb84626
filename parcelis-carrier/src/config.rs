use serde::Deserialize;

/// Carrier connection and contract settings, loaded from the app config.
#[derive(Debug, Deserialize, Clone)]
pub struct CarrierConfig {
    /// Base URL of the carrier REST API, e.g. "https://api.carrier.example/v1".
    pub api_base: String,
    pub oauth: OauthConfig,
    pub sender: SenderConfig,
    #[serde(default)]
    pub age_check: AgeCheckConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct OauthConfig {
    pub token_url: String,
    pub client_id: String,
    pub client_secret: String,
    pub scope: Option<String>,
}

/// Sender address, printed on every label. Comes from configuration,
/// never from the order.
#[derive(Debug, Deserialize, Clone)]
pub struct SenderConfig {
    pub name: String,
    pub street: String,
    pub city: String,
    pub zip_code: String,
    pub country: String,
    pub contact: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub depot: Option<String>,
    pub integrator_id: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AgeCheckConfig {
    pub enabled: bool,
    /// E.g. "A18", or "18" which gets an "A" prefix on the wire.
    pub code: Option<String>,
}

impl Default for AgeCheckConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            code: None,
        }
    }
}

impl CarrierConfig {
    /// Reject configurations the client cannot work with. Called once at
    /// startup; failures here are fatal.
    pub fn validate(&self) -> Result<(), String> {
        if !self.api_base.starts_with("http") {
            return Err(format!(
                "carrier.api_base must start with http/https: '{}'",
                self.api_base
            ));
        }
        if !self.oauth.token_url.starts_with("http") {
            return Err(format!(
                "carrier.oauth.token_url must start with http/https: '{}'",
                self.oauth.token_url
            ));
        }
        if self.oauth.client_id.trim().is_empty() || self.oauth.client_secret.trim().is_empty() {
            return Err("carrier.oauth client_id/client_secret must not be blank".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> CarrierConfig {
        CarrierConfig {
            api_base: "https://api.carrier.test/v1".to_string(),
            oauth: OauthConfig {
                token_url: "https://login.carrier.test/oauth/token".to_string(),
                client_id: "client".to_string(),
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
                email: None,
                depot: Some("07".to_string()),
                integrator_id: None,
            },
            age_check: AgeCheckConfig::default(),
        }
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(sample().validate().is_ok());
    }

    #[test]
    fn test_missing_scheme_rejected() {
        let mut cfg = sample();
        cfg.api_base = "api.carrier.test".to_string();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_blank_credentials_rejected() {
        let mut cfg = sample();
        cfg.oauth.client_secret = " ".to_string();
        assert!(cfg.validate().is_err());
    }
}
