//! Review-side services: intake, lifecycle transitions, and the external
//! provider clients they depend on

pub use folio_common::email;

pub mod lifecycle;
pub mod onboarding;
pub mod payment;
