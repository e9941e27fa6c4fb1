// --- File: crates/appointly_common/src/lib.rs ---

// Declare modules within this crate
pub mod error; // Error handling
pub mod http; // HTTP error rendering
pub mod logging; // Logging utilities
pub mod models; // Shared domain models
pub mod services; // Collaborator abstractions

// Re-export error types and utilities for easier access
pub use error::{
    auth_error, config_error, conflict, external_service_error, internal_error, not_found,
    validation_error, AppointlyError, HttpStatusCode,
};

// Re-export HTTP utilities for easier access
pub use http::IntoHttpResponse;

// Re-export logging utilities for easier access
pub use logging::{init, init_with_level};

// This crate provides common functionality shared by the Appointly crates:
// the error taxonomy, HTTP error rendering, logging setup, the collaborator
// traits (calendar, document store, identity) and the shared domain models.
