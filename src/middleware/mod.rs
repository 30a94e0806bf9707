pub mod cors;
pub mod extract;

pub use cors::cors_layer;
pub use extract::{ApiJson, ApiPath, ApiQuery};
