pub mod client;
pub mod config;
pub mod extract;
pub mod payload;
pub mod poll;
pub mod token;

pub use client::{CarrierApi, CarrierError, HttpCarrierClient, ShipmentCreated};
pub use config::CarrierConfig;
pub use token::TokenCache;
