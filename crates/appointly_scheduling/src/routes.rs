// --- File: crates/appointly_scheduling/src/routes.rs ---

use crate::handlers::{
    create_appointment_handler, get_availability_handler, get_me_handler, get_seller_handler,
    google_callback_handler, google_connect_handler, health_handler, list_appointments_handler,
    list_sellers_handler, set_availability_handler, set_role_handler, SchedulingState,
};
use axum::{
    routing::{get, put},
    Router,
};
use std::sync::Arc;

/// Creates a router containing all scheduling routes. The backend nests it
/// under `/api`.
pub fn routes(state: Arc<SchedulingState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/sellers", get(list_sellers_handler))
        .route("/sellers/{uid}", get(get_seller_handler))
        .route("/sellers/me/availability", put(set_availability_handler))
        .route("/users/me", get(get_me_handler))
        .route("/users/me/role", put(set_role_handler))
        .route("/availability", get(get_availability_handler))
        .route(
            "/appointments",
            get(list_appointments_handler).post(create_appointment_handler),
        )
        .route("/google/connect", get(google_connect_handler))
        .route("/google/callback", get(google_callback_handler))
        .with_state(state)
}
