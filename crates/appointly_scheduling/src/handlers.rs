// File: crates/appointly_scheduling/src/handlers.rs
use appointly_common::models::{Identity, Role};
use appointly_common::services::{
    with_timeout, CalendarService, DocumentStore, IdentityProvider, SessionCredentials,
};
use appointly_common::{auth_error, config_error, not_found, validation_error, AppointlyError};
use appointly_config::AppConfig;
use axum::{
    extract::{FromRequest, FromRequestParts, Path, Query, State},
    http::{header, request::Parts, HeaderMap, StatusCode},
    response::{Json, Redirect},
};
use chrono::Utc;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::booking::BookingService;
use crate::logic::{generate_slots, TimeWindow};
use crate::models::{
    AppointmentsQuery, AppointmentsResponse, AvailabilityQuery, AvailabilityResponse,
    AvailabilitySettings, BookingCreatedResponse, CalendarLink, CallbackQuery, ConnectQuery,
    ConnectResponse, CreateBookingRequest, SellerProfile, SellersResponse, SetRoleRequest,
    UserProfile,
};
use crate::oauth::{consent_url, signing_secret, ConnectState, CALENDAR_SCOPES};
use crate::repository::SchedulingRepository;

/// Upper bound on `days` in availability queries.
pub const MAX_HORIZON_DAYS: i64 = 60;

/// Shared state of the scheduling routes. Collaborators are built once at
/// startup and shared by every request.
pub struct SchedulingState {
    pub config: Arc<AppConfig>,
    pub repository: SchedulingRepository,
    pub calendar: Arc<dyn CalendarService>,
    pub identity: Arc<dyn IdentityProvider>,
}

impl SchedulingState {
    pub fn new(
        config: Arc<AppConfig>,
        store: Arc<dyn DocumentStore>,
        calendar: Arc<dyn CalendarService>,
        identity: Arc<dyn IdentityProvider>,
    ) -> Self {
        let timeout = Duration::from_secs(config.scheduling.collaborator_timeout_secs);
        Self {
            repository: SchedulingRepository::new(store, timeout),
            config,
            calendar,
            identity,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.config.scheduling.collaborator_timeout_secs)
    }

    fn default_availability(&self) -> AvailabilitySettings {
        AvailabilitySettings::from(&self.config.scheduling.default_availability)
    }
}

/// The authenticated caller. Rejects with 401 when the identity provider
/// does not recognise the request.
#[derive(Debug, Clone)]
pub struct CallerIdentity(pub Identity);

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Reads the identity-bearing headers of a request.
pub fn session_credentials(headers: &HeaderMap) -> SessionCredentials {
    let bearer_token = header_value(headers, header::AUTHORIZATION.as_str()).and_then(|v| {
        v.strip_prefix("Bearer ")
            .map(|token| token.trim().to_string())
    });
    SessionCredentials {
        bearer_token,
        user_id: header_value(headers, "x-user-uid"),
        display_name: header_value(headers, "x-user-name"),
        email: header_value(headers, "x-user-email"),
    }
}

impl FromRequestParts<Arc<SchedulingState>> for CallerIdentity {
    type Rejection = AppointlyError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<SchedulingState>,
    ) -> Result<Self, Self::Rejection> {
        let credentials = session_credentials(&parts.headers);
        let identity = with_timeout(
            "identity",
            state.timeout(),
            state.identity.resolve(credentials),
        )
        .await?;
        identity
            .map(CallerIdentity)
            .ok_or_else(|| auth_error("Missing user"))
    }
}

/// A JSON request body. Syntax and type errors are rejected as validation
/// errors with the usual error body.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppointlyError))]
pub struct JsonBody<T>(pub T);

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

// --- Sellers ---

/// Handler to list sellers.
#[axum::debug_handler]
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/sellers",
    responses(
        (status = 200, description = "Users who chose the seller role", body = SellersResponse),
        (status = 500, description = "Storage failure")
    ),
    tag = "Sellers"
))]
pub async fn list_sellers_handler(
    State(state): State<Arc<SchedulingState>>,
) -> Result<Json<SellersResponse>, AppointlyError> {
    let sellers = state.repository.list_sellers().await?;
    debug!("Listing {} sellers", sellers.len());
    Ok(Json(SellersResponse { sellers }))
}

/// Handler to fetch one seller's profile.
#[axum::debug_handler]
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/sellers/{uid}",
    params(("uid" = String, Path, description = "Seller uid")),
    responses(
        (status = 200, description = "Seller profile", body = SellerProfile),
        (status = 404, description = "No such seller")
    ),
    tag = "Sellers"
))]
pub async fn get_seller_handler(
    State(state): State<Arc<SchedulingState>>,
    Path(uid): Path<String>,
) -> Result<Json<SellerProfile>, AppointlyError> {
    state
        .repository
        .get_seller(&uid)
        .await?
        .map(Json)
        .ok_or_else(|| not_found(format!("Seller {}", uid)))
}

/// Handler to replace the caller's availability settings.
#[axum::debug_handler]
#[cfg_attr(feature = "openapi", utoipa::path(
    put,
    path = "/sellers/me/availability",
    request_body = AvailabilitySettings,
    responses(
        (status = 200, description = "Stored settings", body = AvailabilitySettings),
        (status = 400, description = "Invalid working hours, days, duration or time zone"),
        (status = 401, description = "No caller identity")
    ),
    tag = "Sellers"
))]
pub async fn set_availability_handler(
    State(state): State<Arc<SchedulingState>>,
    CallerIdentity(caller): CallerIdentity,
    JsonBody(settings): JsonBody<AvailabilitySettings>,
) -> Result<Json<AvailabilitySettings>, AppointlyError> {
    settings
        .to_config(&state.config.scheduling.default_time_zone)
        .map_err(validation_error)?;
    state
        .repository
        .set_availability(&caller.id, &settings)
        .await?;
    info!("Updated availability of seller {}", caller.id);
    Ok(Json(settings))
}

// --- Users ---

/// Handler to fetch the caller's profile.
#[axum::debug_handler]
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/users/me",
    responses(
        (status = 200, description = "Caller profile; role is absent until chosen", body = UserProfile),
        (status = 401, description = "No caller identity")
    ),
    tag = "Users"
))]
pub async fn get_me_handler(
    State(state): State<Arc<SchedulingState>>,
    CallerIdentity(caller): CallerIdentity,
) -> Result<Json<UserProfile>, AppointlyError> {
    let profile = state.repository.get_user(&caller.id).await?;
    Ok(Json(profile.unwrap_or(UserProfile {
        uid: caller.id,
        name: caller.display_name,
        email: caller.email,
        role: None,
    })))
}

/// Handler to choose the caller's role.
#[axum::debug_handler]
#[cfg_attr(feature = "openapi", utoipa::path(
    put,
    path = "/users/me/role",
    request_body = SetRoleRequest,
    responses(
        (status = 200, description = "Updated profile", body = UserProfile),
        (status = 400, description = "Missing or unknown role"),
        (status = 401, description = "No caller identity")
    ),
    tag = "Users"
))]
pub async fn set_role_handler(
    State(state): State<Arc<SchedulingState>>,
    CallerIdentity(caller): CallerIdentity,
    JsonBody(request): JsonBody<SetRoleRequest>,
) -> Result<Json<UserProfile>, AppointlyError> {
    let role: Role = non_empty(request.role)
        .ok_or_else(|| validation_error("Missing required field 'role'"))?
        .parse()
        .map_err(validation_error)?;
    let profile = state.repository.set_role(&caller, role).await?;
    info!("User {} is now a {}", caller.id, role);
    Ok(Json(profile))
}

// --- Availability ---

/// Handler to get a seller's open slots.
#[axum::debug_handler]
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/availability",
    params(AvailabilityQuery),
    responses(
        (status = 200, description = "Open slots, chronological; empty when the seller has no linked calendar", body = AvailabilityResponse),
        (status = 400, description = "Missing sellerUid or invalid seller settings"),
        (status = 500, description = "Calendar or storage failure")
    ),
    tag = "Availability"
))]
pub async fn get_availability_handler(
    State(state): State<Arc<SchedulingState>>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<AvailabilityResponse>, AppointlyError> {
    let seller_uid =
        non_empty(query.seller_uid).ok_or_else(|| validation_error("Missing sellerUid"))?;
    let scheduling = &state.config.scheduling;

    let Some(link) = state.repository.get_calendar_link(&seller_uid).await? else {
        debug!("Seller {} has no linked calendar", seller_uid);
        return Ok(Json(AvailabilityResponse {
            slots: Vec::new(),
            time_zone: None,
        }));
    };

    let settings = state
        .repository
        .get_seller(&seller_uid)
        .await?
        .and_then(|seller| seller.availability_settings)
        .unwrap_or_else(|| state.default_availability());
    let config = settings
        .to_config(&scheduling.default_time_zone)
        .map_err(|e| validation_error(format!("Seller availability is invalid: {}", e)))?;

    let now = Utc::now();
    let days = query
        .days
        .unwrap_or(scheduling.horizon_days)
        .clamp(1, MAX_HORIZON_DAYS);
    let limit = query
        .limit
        .unwrap_or(scheduling.max_slots)
        .min(scheduling.max_slots);
    let window = TimeWindow::from_now(now, days);

    let mut busy = with_timeout(
        "calendar",
        state.timeout(),
        state
            .calendar
            .get_busy_times(&link.calendar_id, window.start(), window.end()),
    )
    .await?;
    busy.extend(
        state
            .repository
            .seller_booked_intervals(&seller_uid, window.start(), window.end())
            .await?,
    );

    let slots: Vec<_> = generate_slots(&window, &config, &busy, now)
        .into_iter()
        .take(limit)
        .collect();
    info!(
        "{} slots for seller {} over {} days ({} busy intervals)",
        slots.len(),
        seller_uid,
        days,
        busy.len()
    );

    Ok(Json(AvailabilityResponse {
        slots,
        time_zone: Some(config.time_zone().name().to_string()),
    }))
}

// --- Appointments ---

/// Handler to list the caller's appointments.
#[axum::debug_handler]
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/appointments",
    params(AppointmentsQuery),
    responses(
        (status = 200, description = "Bookings the caller takes part in", body = AppointmentsResponse),
        (status = 400, description = "uid does not match the caller"),
        (status = 401, description = "No caller identity")
    ),
    tag = "Appointments"
))]
pub async fn list_appointments_handler(
    State(state): State<Arc<SchedulingState>>,
    CallerIdentity(caller): CallerIdentity,
    Query(query): Query<AppointmentsQuery>,
) -> Result<Json<AppointmentsResponse>, AppointlyError> {
    if let Some(uid) = non_empty(query.uid) {
        if uid != caller.id {
            return Err(validation_error("uid does not match the signed-in user"));
        }
    }
    let appointments = state.repository.bookings_for_participant(&caller.id).await?;
    Ok(Json(AppointmentsResponse { appointments }))
}

/// Handler to book a slot with a seller.
#[axum::debug_handler]
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/appointments",
    request_body = CreateBookingRequest,
    responses(
        (status = 201, description = "Booking stored; calendar outcomes per party", body = BookingCreatedResponse),
        (status = 400, description = "Invalid body, or the interval is not an offered future slot"),
        (status = 401, description = "No caller identity"),
        (status = 404, description = "Unknown seller"),
        (status = 409, description = "Slot already taken"),
        (status = 500, description = "Calendar or storage failure")
    ),
    tag = "Appointments"
))]
pub async fn create_appointment_handler(
    State(state): State<Arc<SchedulingState>>,
    CallerIdentity(caller): CallerIdentity,
    JsonBody(request): JsonBody<CreateBookingRequest>,
) -> Result<(StatusCode, Json<BookingCreatedResponse>), AppointlyError> {
    let service = BookingService {
        repository: &state.repository,
        calendar: state.calendar.as_ref(),
        scheduling: &state.config.scheduling,
        timeout: state.timeout(),
    };
    let created = service.create(&caller, &request, Utc::now()).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

// --- Calendar linking ---

/// Handler returning the Google consent URL for linking the caller's calendar.
#[axum::debug_handler]
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/google/connect",
    params(ConnectQuery),
    responses(
        (status = 200, description = "Consent screen URL", body = ConnectResponse),
        (status = 400, description = "uid does not match the caller"),
        (status = 401, description = "No caller identity"),
        (status = 500, description = "Google OAuth is not configured")
    ),
    tag = "Calendar"
))]
pub async fn google_connect_handler(
    State(state): State<Arc<SchedulingState>>,
    CallerIdentity(caller): CallerIdentity,
    Query(query): Query<ConnectQuery>,
) -> Result<Json<ConnectResponse>, AppointlyError> {
    if let Some(uid) = non_empty(query.uid) {
        if uid != caller.id {
            return Err(validation_error("uid does not match the signed-in user"));
        }
    }
    let oauth = state
        .config
        .google_oauth
        .as_ref()
        .ok_or_else(|| config_error("Missing Google OAuth configuration"))?;
    let url = consent_url(oauth, &caller.id, Utc::now()).map_err(config_error)?;
    Ok(Json(ConnectResponse { url }))
}

/// Handler for Google's redirect after consent.
#[axum::debug_handler]
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/google/callback",
    params(CallbackQuery),
    responses(
        (status = 303, description = "Back to the seller page with connected=1 or err=..."),
        (status = 400, description = "State is malformed, forged or expired")
    ),
    tag = "Calendar"
))]
pub async fn google_callback_handler(
    State(state): State<Arc<SchedulingState>>,
    Query(query): Query<CallbackQuery>,
) -> Result<Redirect, AppointlyError> {
    if let Some(error) = non_empty(query.error) {
        info!("Calendar consent declined: {}", error);
        return Ok(Redirect::to("/seller?err=consent_denied"));
    }
    let (Some(_code), Some(raw_state)) = (non_empty(query.code), non_empty(query.state)) else {
        return Ok(Redirect::to("/seller?err=missing_code"));
    };
    let Some(secret) = state
        .config
        .google_oauth
        .as_ref()
        .and_then(|oauth| signing_secret(oauth).ok())
    else {
        warn!("Calendar callback received without Google OAuth configuration");
        return Ok(Redirect::to("/seller?err=env"));
    };
    let connect = ConnectState::verify(&raw_state, secret, Utc::now()).map_err(|e| {
        warn!("Rejected calendar callback: {}", e);
        validation_error(format!("Invalid state parameter: {}", e))
    })?;

    let user_email = state
        .repository
        .get_user(&connect.uid)
        .await?
        .and_then(|u| u.email);
    let email = match user_email {
        Some(email) => Some(email),
        None => state
            .repository
            .get_seller(&connect.uid)
            .await?
            .and_then(|s| s.email),
    };
    let link = CalendarLink {
        uid: connect.uid.clone(),
        calendar_id: email.unwrap_or_else(|| "primary".to_string()),
        scope: Some(
            non_empty(query.scope).unwrap_or_else(|| CALENDAR_SCOPES.join(" ")),
        ),
        granted_at: Utc::now(),
    };
    state
        .repository
        .link_calendar(&link, &state.default_availability())
        .await?;
    info!("Linked calendar {} for seller {}", link.calendar_id, link.uid);

    Ok(Redirect::to("/seller?connected=1"))
}

// --- Health ---

/// Handler for liveness checks.
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up")),
    tag = "Health"
))]
pub async fn health_handler() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
