use parcelis_carrier::CarrierConfig;
use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub carrier: CarrierConfig,
    pub shipping: ShippingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ShippingConfig {
    /// Directory where downloaded labels are written.
    #[serde(default = "default_labels_dir")]
    pub labels_dir: String,
    /// Seconds between reconciliation sweeps.
    #[serde(default = "default_sync_interval")]
    pub sync_interval_seconds: u64,
}

fn default_labels_dir() -> String {
    "./labels".to_string()
}

fn default_sync_interval() -> u64 {
    120
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            // Start off by merging in the "default" configuration file
            .add_source(config::File::with_name("config/default"))
            // Then the environment-specific file, which is optional
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // A local file not checked into git
            .add_source(config::File::with_name("config/local").required(false))
            // Finally the environment, e.g. PARCELIS_CARRIER__OAUTH__CLIENT_SECRET
            .add_source(config::Environment::with_prefix("PARCELIS").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
