//! API endpoint modules.

pub mod health;
pub mod openapi;
pub mod waste;

pub use health::configure_health_routes;
pub use openapi::ApiDoc;
pub use waste::configure_routes as configure_waste_routes;
