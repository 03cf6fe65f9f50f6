//! HTTP API handlers for folio-rv

pub mod admin;
pub mod auth;
pub mod change_requests;
pub mod health;
pub mod student;
pub mod webhook;

pub use auth::admin_auth_middleware;
pub use health::health_routes;
