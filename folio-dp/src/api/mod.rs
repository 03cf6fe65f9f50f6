//! HTTP API handlers for folio-dp

pub mod deploy;
pub mod health;

pub use deploy::trigger_deploy;
pub use health::health_routes;
