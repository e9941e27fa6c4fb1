// --- File: crates/appointly_common/src/http.rs ---
use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::{error, info};

use crate::error::{validation_error, AppointlyError, HttpStatusCode};

/// Message shown to callers when the real cause must stay in the logs.
pub const GENERIC_FAILURE_MESSAGE: &str = "Something went wrong. Please try again later.";

/// Extension trait for AppointlyError to convert it to an Axum HTTP response.
pub trait IntoHttpResponse {
    /// Converts the error into an Axum HTTP response.
    fn into_http_response(self) -> Response;
}

impl IntoHttpResponse for AppointlyError {
    fn into_http_response(self) -> Response {
        let status_code =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let error_message = if self.is_public() {
            info!("Request rejected ({}): {}", status_code.as_u16(), self);
            self.to_string()
        } else {
            error!("Request failed ({}): {}", status_code.as_u16(), self);
            GENERIC_FAILURE_MESSAGE.to_string()
        };

        let body = Json(json!({
            "error": {
                "message": error_message,
                "code": status_code.as_u16(),
            }
        }));

        (status_code, body).into_response()
    }
}

/// Implement IntoResponse for AppointlyError to make it easier to use in Axum handlers.
impl IntoResponse for AppointlyError {
    fn into_response(self) -> Response {
        self.into_http_response()
    }
}

/// Malformed or mistyped JSON bodies are validation failures.
impl From<JsonRejection> for AppointlyError {
    fn from(rejection: JsonRejection) -> Self {
        validation_error(format!("Invalid request body: {}", rejection.body_text()))
    }
}
