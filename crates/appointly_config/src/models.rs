// --- File: crates/appointly_config/src/models.rs ---

use serde::{Deserialize, Serialize};

// --- General Server Config ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8086,
        }
    }
}

// --- Caller identity ---
/// How callers are identified.
///
/// `Header` trusts the `x-user-*` headers and is meant for local development
/// only. `Firebase` verifies the bearer ID token against Firebase Auth.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum AuthMode {
    #[default]
    Header,
    Firebase,
}

#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct AuthConfig {
    #[serde(default)]
    pub mode: AuthMode,
}

// --- Google Calendar Config ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct GcalConfig {
    /// Path to the service account key JSON.
    pub key_path: Option<String>,
}

// --- Firebase Config ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct FirebaseConfig {
    pub project_id: String,
    /// Service account key used for Firestore access tokens.
    pub key_path: Option<String>,
    /// Web API key for Identity Toolkit lookups. Usually `secret_from_env`.
    pub api_key: Option<String>,
    /// `host:port` of a Firestore emulator; disables token acquisition.
    pub emulator_host: Option<String>,
}

// --- Google OAuth (calendar linking) ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct GoogleOAuthConfig {
    pub client_id: String,
    pub client_secret: Option<String>,
    pub redirect_uri: String,
}

// --- Scheduling ---
/// Availability written for a seller when they link a calendar and have
/// none configured yet.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct DefaultAvailabilityConfig {
    pub start: String,
    pub end: String,
    /// 0 = Sunday .. 6 = Saturday
    pub working_days: Vec<u8>,
    pub slot_duration_minutes: i64,
}

impl Default for DefaultAvailabilityConfig {
    fn default() -> Self {
        Self {
            start: "09:00".to_string(),
            end: "17:00".to_string(),
            working_days: vec![1, 2, 3, 4, 5],
            slot_duration_minutes: 30,
        }
    }
}

#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SchedulingConfig {
    /// IANA zone used when a seller has not declared one.
    #[serde(default = "default_time_zone")]
    pub default_time_zone: String,
    #[serde(default = "default_horizon_days")]
    pub horizon_days: i64,
    #[serde(default = "default_max_slots")]
    pub max_slots: usize,
    #[serde(default = "default_collaborator_timeout_secs")]
    pub collaborator_timeout_secs: u64,
    #[serde(default)]
    pub default_availability: DefaultAvailabilityConfig,
}

fn default_time_zone() -> String {
    "UTC".to_string()
}

fn default_horizon_days() -> i64 {
    7
}

fn default_max_slots() -> usize {
    50
}

fn default_collaborator_timeout_secs() -> u64 {
    10
}

impl Default for SchedulingConfig {
    fn default() -> Self {
        Self {
            default_time_zone: default_time_zone(),
            horizon_days: default_horizon_days(),
            max_slots: default_max_slots(),
            collaborator_timeout_secs: default_collaborator_timeout_secs(),
            default_availability: DefaultAvailabilityConfig::default(),
        }
    }
}

// --- Unified App Configuration ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,

    // --- Runtime Flags (optional in config file, default to false) ---
    #[serde(default)]
    pub use_gcal: bool,
    #[serde(default)]
    pub use_firestore: bool,

    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub scheduling: SchedulingConfig,

    // --- Optional Provider Configurations ---
    #[serde(default)]
    pub gcal: Option<GcalConfig>,
    #[serde(default)]
    pub firebase: Option<FirebaseConfig>,
    #[serde(default)]
    pub google_oauth: Option<GoogleOAuthConfig>,
}
