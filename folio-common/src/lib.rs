//! # Folio Common Library
//!
//! Shared code for the Folio services including:
//! - Database schema, pool initialization, and queries
//! - Row models and status enums
//! - Tier policy and submission quality gate
//! - Configuration loading
//! - Error types

pub mod config;
pub mod db;
pub mod email;
pub mod error;
pub mod model;
pub mod policy;
pub mod quality;

pub use error::{Error, Result};
