pub mod model;
pub mod repository;
pub mod status;

pub use model::{
    CreateShipmentCommand, OrderLine, OrderSnapshot, ShipmentRecord, ShipmentRequest,
    ShipmentStatus, TrackingStatus,
};
pub use repository::{LabelStore, OrderGateway, RepoError, ShipmentRepository};
pub use status::map_raw_status;
