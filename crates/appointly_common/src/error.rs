use std::fmt;
use thiserror::Error;

use crate::services::ServiceError;

/// The base error type for all Appointly errors.
///
/// Each crate can extend this by implementing From<SpecificError> for AppointlyError.
#[derive(Error, Debug)]
pub enum AppointlyError {
    /// Error occurred while parsing data
    #[error("Failed to parse data: {0}")]
    ParseError(String),

    /// Error occurred due to missing or invalid configuration
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// The caller could not be identified
    #[error("Authentication error: {0}")]
    AuthError(String),

    /// Missing or malformed required input
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Identity, storage or calendar provider failure
    #[error("External service error: {service_name} - {message}")]
    ExternalServiceError {
        service_name: String,
        message: String,
    },

    /// Error occurred due to a conflict (e.g., slot already claimed)
    #[error("Conflict: {0}")]
    ConflictError(String),

    /// Error occurred due to a resource not being found
    #[error("Not found: {0}")]
    NotFoundError(String),

    /// A collaborator call did not finish in time
    #[error("Timeout: {0}")]
    TimeoutError(String),

    /// Error occurred due to an internal error
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl AppointlyError {
    /// Whether the detail of this error may be shown to the caller.
    ///
    /// Collaborator, timeout, configuration and internal failures are logged
    /// with full detail but surfaced as a generic message.
    pub fn is_public(&self) -> bool {
        !matches!(
            self,
            AppointlyError::ExternalServiceError { .. }
                | AppointlyError::TimeoutError(_)
                | AppointlyError::ConfigError(_)
                | AppointlyError::InternalError(_)
        )
    }
}

/// A trait for converting errors to HTTP status codes.
pub trait HttpStatusCode {
    /// Returns the HTTP status code for this error.
    fn status_code(&self) -> u16;
}

impl HttpStatusCode for AppointlyError {
    fn status_code(&self) -> u16 {
        match self {
            AppointlyError::ParseError(_) => 400,
            AppointlyError::ConfigError(_) => 500,
            AppointlyError::AuthError(_) => 401,
            AppointlyError::ValidationError(_) => 400,
            AppointlyError::ExternalServiceError { .. } => 500,
            AppointlyError::ConflictError(_) => 409,
            AppointlyError::NotFoundError(_) => 404,
            AppointlyError::TimeoutError(_) => 500,
            AppointlyError::InternalError(_) => 500,
        }
    }
}

// Common error conversions
impl From<serde_json::Error> for AppointlyError {
    fn from(err: serde_json::Error) -> Self {
        AppointlyError::ParseError(err.to_string())
    }
}

impl From<ServiceError> for AppointlyError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::AlreadyExists(key) => {
                AppointlyError::ConflictError(format!("{} already exists", key))
            }
            ServiceError::Timeout { service, after } => AppointlyError::TimeoutError(format!(
                "{} did not respond within {}s",
                service,
                after.as_secs()
            )),
            ServiceError::Failed { service, message } => AppointlyError::ExternalServiceError {
                service_name: service.to_string(),
                message,
            },
        }
    }
}

// Utility functions for error handling
pub fn config_error<T: fmt::Display>(message: T) -> AppointlyError {
    AppointlyError::ConfigError(message.to_string())
}

pub fn validation_error<T: fmt::Display>(message: T) -> AppointlyError {
    AppointlyError::ValidationError(message.to_string())
}

pub fn auth_error<T: fmt::Display>(message: T) -> AppointlyError {
    AppointlyError::AuthError(message.to_string())
}

pub fn not_found<T: fmt::Display>(message: T) -> AppointlyError {
    AppointlyError::NotFoundError(message.to_string())
}

pub fn conflict<T: fmt::Display>(message: T) -> AppointlyError {
    AppointlyError::ConflictError(message.to_string())
}

pub fn external_service_error<T: fmt::Display>(service_name: &str, message: T) -> AppointlyError {
    AppointlyError::ExternalServiceError {
        service_name: service_name.to_string(),
        message: message.to_string(),
    }
}

pub fn internal_error<T: fmt::Display>(message: T) -> AppointlyError {
    AppointlyError::InternalError(message.to_string())
}
