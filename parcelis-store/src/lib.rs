pub mod app_config;
pub mod database;
pub mod label_store;
pub mod memory;
pub mod order_gateway;
pub mod shipment_repo;

pub use database::DbClient;
pub use label_store::FsLabelStore;
pub use order_gateway::PostgresOrderGateway;
pub use shipment_repo::PostgresShipmentRepository;
