// --- File: crates/appointly_scheduling/src/models.rs ---
//! Stored records and the request/response bodies of the scheduling API.
//!
//! Stored records use camelCase field names so documents written by this
//! service and by the web client share one shape.

use appointly_common::models::Role;
use appointly_config::DefaultAvailabilityConfig;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::logic::{parse_time_zone, AvailabilityConfig, Slot, SlotConfigError, WorkingHours};

/// Collection names in the document store.
pub mod collections {
    pub const USERS: &str = "users";
    pub const SELLERS: &str = "sellers";
    pub const APPOINTMENTS: &str = "appointments";
    pub const CALENDAR_TOKENS: &str = "calendarTokens";
}

// --- Stored records ---

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct WorkingHoursSettings {
    #[cfg_attr(feature = "openapi", schema(example = "09:00"))]
    pub start: String,
    #[cfg_attr(feature = "openapi", schema(example = "17:00"))]
    pub end: String,
}

/// A seller's availability as stored under `sellers/{uid}.availabilitySettings`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct AvailabilitySettings {
    pub working_hours: WorkingHoursSettings,
    /// 0 = Sunday .. 6 = Saturday
    pub working_days: Vec<i64>,
    /// Minutes
    #[cfg_attr(feature = "openapi", schema(example = 30))]
    pub slot_duration: i64,
    /// IANA zone the working hours are expressed in
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "openapi", schema(example = "Europe/Zurich"))]
    pub time_zone: Option<String>,
}

impl AvailabilitySettings {
    /// Validates the settings; `default_time_zone` applies when none is stored.
    pub fn to_config(&self, default_time_zone: &str) -> Result<AvailabilityConfig, SlotConfigError> {
        let working_hours = WorkingHours::parse(&self.working_hours.start, &self.working_hours.end)?;
        let time_zone = parse_time_zone(self.time_zone.as_deref().unwrap_or(default_time_zone))?;
        AvailabilityConfig::new(
            working_hours,
            self.working_days.iter().copied(),
            self.slot_duration,
            time_zone,
        )
    }
}

impl From<&DefaultAvailabilityConfig> for AvailabilitySettings {
    fn from(defaults: &DefaultAvailabilityConfig) -> Self {
        Self {
            working_hours: WorkingHoursSettings {
                start: defaults.start.clone(),
                end: defaults.end.clone(),
            },
            working_days: defaults.working_days.iter().map(|d| i64::from(*d)).collect(),
            slot_duration: defaults.slot_duration_minutes,
            time_zone: None,
        }
    }
}

/// `sellers/{uid}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct SellerProfile {
    pub uid: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub calendar_connected: bool,
    #[serde(default)]
    pub availability_settings: Option<AvailabilitySettings>,
}

/// `users/{uid}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub uid: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<Role>,
}

/// `calendarTokens/{uid}`: which calendar a user linked and when.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarLink {
    pub uid: String,
    pub calendar_id: String,
    #[serde(default)]
    pub scope: Option<String>,
    pub granted_at: DateTime<Utc>,
}

/// Appointments written without a status are confirmed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    #[default]
    Confirmed,
}

/// `appointments/{id}` without its id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct BookingRecord {
    pub seller_uid: String,
    pub buyer_uid: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub summary: String,
    /// `[sellerUid, buyerUid]`, for participant queries
    pub participants: Vec<String>,
    #[serde(default)]
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
}

/// A persisted booking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Booking {
    pub id: String,
    #[serde(flatten)]
    pub record: BookingRecord,
}

// --- API bodies ---

#[derive(Debug, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams, utoipa::ToSchema))]
#[cfg_attr(feature = "openapi", into_params(parameter_in = Query))]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityQuery {
    /// Seller whose slots are wanted
    pub seller_uid: Option<String>,
    /// Days ahead to search, default from configuration
    pub days: Option<i64>,
    /// Maximum number of slots, capped by configuration
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityResponse {
    pub slots: Vec<Slot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SellerSummary {
    pub uid: String,
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SellersResponse {
    pub sellers: Vec<SellerSummary>,
}

#[derive(Debug, Default, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingRequest {
    pub seller_uid: Option<String>,
    /// RFC 3339 instant
    #[cfg_attr(feature = "openapi", schema(example = "2025-05-05T09:00:00Z"))]
    pub start: Option<String>,
    /// RFC 3339 instant
    #[cfg_attr(feature = "openapi", schema(example = "2025-05-05T09:30:00Z"))]
    pub end: Option<String>,
    pub summary: Option<String>,
}

/// What happened to one party's calendar event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum CalendarOutcome {
    Created {
        #[serde(rename = "eventId")]
        event_id: Option<String>,
    },
    /// The party has no linked calendar.
    Skipped,
    Failed {
        message: String,
    },
}

#[derive(Debug, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct BookingCreatedResponse {
    pub id: String,
    pub booking: Booking,
    pub seller_calendar: CalendarOutcome,
    pub buyer_calendar: CalendarOutcome,
    #[serde(default)]
    pub warnings: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
#[cfg_attr(feature = "openapi", into_params(parameter_in = Query))]
pub struct AppointmentsQuery {
    /// Must equal the caller's uid when given
    pub uid: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AppointmentsResponse {
    pub appointments: Vec<Booking>,
}

#[derive(Debug, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SetRoleRequest {
    #[cfg_attr(feature = "openapi", schema(example = "seller"))]
    pub role: Option<String>,
}

#[derive(Debug, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
#[cfg_attr(feature = "openapi", into_params(parameter_in = Query))]
pub struct ConnectQuery {
    /// Must equal the caller's uid when given
    pub uid: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ConnectResponse {
    pub url: String,
}

#[derive(Debug, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
#[cfg_attr(feature = "openapi", into_params(parameter_in = Query))]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub scope: Option<String>,
    /// Set by Google when the user declines consent
    pub error: Option<String>,
}
