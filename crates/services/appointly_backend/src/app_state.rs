// --- File: crates/services/appointly_backend/src/app_state.rs ---
use appointly_config::AppConfig;
use appointly_scheduling::SchedulingState;
use std::sync::Arc;

use crate::service_factory::AppointlyServiceFactory;

/// Application state shared across all routes.
///
/// Provider handles are built once by [`AppointlyServiceFactory`] and passed
/// into the route states; nothing is global.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub scheduling: Arc<SchedulingState>,
}

impl AppState {
    pub fn new(config: Arc<AppConfig>, services: AppointlyServiceFactory) -> Self {
        let scheduling = SchedulingState::new(
            config.clone(),
            services.store,
            services.calendar,
            services.identity,
        );
        Self {
            config,
            scheduling: Arc::new(scheduling),
        }
    }
}
