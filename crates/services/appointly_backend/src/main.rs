// File: services/appointly_backend/src/main.rs
mod app_state;
mod service_factory;

use app_state::AppState;
use appointly_common::{logging, AppointlyError};
use appointly_config::load_config;
use appointly_scheduling::routes as scheduling_routes;
use axum::{routing::get, Router};
use service_factory::AppointlyServiceFactory;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// The full application: the scheduling API under `/api`, plus the Swagger UI
/// at `/api/docs` when built with `openapi`.
fn build_router(state: &AppState) -> Router {
    let api_router = Router::new()
        .route("/", get(|| async { "Welcome to the Appointly API!" }))
        .merge(scheduling_routes(state.scheduling.clone()));

    #[allow(unused_mut)] // only mutated with the openapi feature
    let mut app = Router::new().nest("/api", api_router);

    // Conditionally add Swagger UI and JSON endpoint if openapi feature enabled
    #[cfg(feature = "openapi")]
    {
        use appointly_scheduling::doc::SchedulingApiDoc;
        use utoipa::OpenApi;
        use utoipa_swagger_ui::SwaggerUi;

        #[derive(OpenApi)]
        #[openapi(
            info(
                title = "Appointly API",
                version = "0.1.0",
                description = "Appointment scheduling between buyers and sellers",
                license(name = "MIT", url = "https://opensource.org/licenses/MIT")
            ),
            servers((url = "/api", description = "Main API Prefix")),
        )]
        struct ApiDoc;

        let mut openapi_doc = ApiDoc::openapi();
        openapi_doc.merge(SchedulingApiDoc::openapi());
        info!("Adding Swagger UI at /api/docs");

        app = app.merge(SwaggerUi::new("/api/docs").url("/api/docs/openapi.json", openapi_doc));
    }

    app.layer(TraceLayer::new_for_http())
}

async fn run() -> Result<(), AppointlyError> {
    let config = Arc::new(
        load_config().map_err(|e| AppointlyError::ConfigError(e.to_string()))?,
    );
    let services = AppointlyServiceFactory::new(&config).await?;
    let state = AppState::new(config.clone(), services);
    let app = build_router(&state);

    let addr = format!("{}:{}", state.config.server.host, state.config.server.port);
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| AppointlyError::ConfigError(format!("Cannot bind {}: {}", addr, e)))?;
    info!("Starting server at http://{}", addr);
    info!("API endpoints available at http://{}/api", addr);

    axum::serve(listener, app.into_make_service())
        .await
        .map_err(|e| AppointlyError::InternalError(format!("Server error: {}", e)))
}

#[tokio::main]
async fn main() {
    logging::init();
    if let Err(e) = run().await {
        error!("Appointly backend stopped: {}", e);
        std::process::exit(1);
    }
}
