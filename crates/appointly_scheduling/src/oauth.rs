// --- File: crates/appointly_scheduling/src/oauth.rs ---
//! Google consent URL and callback state for calendar linking.
//!
//! The authorization code is not exchanged here. The grant is recorded and
//! calendar access goes through the service account the seller shares their
//! calendar with. The `state` parameter is therefore what ties a callback to
//! the seller who asked for the consent screen: it is signed with the OAuth
//! client secret and expires after [`STATE_TTL_MINUTES`].

use appointly_config::GoogleOAuthConfig;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD as base64_engine, Engine};
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;

pub const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";

pub const CALENDAR_SCOPES: [&str; 5] = [
    "https://www.googleapis.com/auth/calendar.events",
    "https://www.googleapis.com/auth/calendar.readonly",
    "openid",
    "email",
    "profile",
];

/// How long a consent round trip may take.
pub const STATE_TTL_MINUTES: i64 = 10;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StateError {
    #[error("state is malformed")]
    Malformed,
    #[error("state signature does not match")]
    BadSignature,
    #[error("state has expired")]
    Expired,
    #[error("Google OAuth client_secret is not configured")]
    MissingSecret,
}

/// Round-tripped through Google in the `state` parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectState {
    pub uid: String,
    /// Unix seconds
    #[serde(rename = "iat")]
    pub issued_at: i64,
}

fn mac(secret: &str) -> Result<HmacSha256, StateError> {
    HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| StateError::MissingSecret)
}

impl ConnectState {
    pub fn new(uid: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            uid: uid.into(),
            issued_at: now.timestamp(),
        }
    }

    /// `base64url(json).hex(hmac_sha256(secret, base64url(json)))`
    pub fn sign(&self, secret: &str) -> Result<String, StateError> {
        let payload = serde_json::to_vec(self).map_err(|_| StateError::Malformed)?;
        let payload = base64_engine.encode(payload);

        let mut mac = mac(secret)?;
        mac.update(payload.as_bytes());
        let signature = hex::encode(mac.finalize().into_bytes());
        Ok(format!("{}.{}", payload, signature))
    }

    /// Checks the signature and age of a signed state.
    pub fn verify(state: &str, secret: &str, now: DateTime<Utc>) -> Result<Self, StateError> {
        let (payload, signature) = state.split_once('.').ok_or(StateError::Malformed)?;
        let signature = hex::decode(signature).map_err(|_| StateError::Malformed)?;

        let mut mac = mac(secret)?;
        mac.update(payload.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| StateError::BadSignature)?;

        let json = base64_engine
            .decode(payload)
            .map_err(|_| StateError::Malformed)?;
        let decoded: ConnectState =
            serde_json::from_slice(&json).map_err(|_| StateError::Malformed)?;

        let age = now.timestamp() - decoded.issued_at;
        if age < 0 || age > Duration::minutes(STATE_TTL_MINUTES).num_seconds() {
            return Err(StateError::Expired);
        }
        Ok(decoded)
    }
}

/// The client secret that signs connect states.
pub fn signing_secret(config: &GoogleOAuthConfig) -> Result<&str, StateError> {
    config
        .client_secret
        .as_deref()
        .filter(|s| !s.is_empty())
        .ok_or(StateError::MissingSecret)
}

/// The consent screen URL for linking `uid`'s calendar.
pub fn consent_url(
    config: &GoogleOAuthConfig,
    uid: &str,
    now: DateTime<Utc>,
) -> Result<String, String> {
    let state = ConnectState::new(uid, now)
        .sign(signing_secret(config).map_err(|e| e.to_string())?)
        .map_err(|e| e.to_string())?;
    let scope = CALENDAR_SCOPES.join(" ");

    let query = serde_urlencoded::to_string([
        ("client_id", config.client_id.as_str()),
        ("redirect_uri", config.redirect_uri.as_str()),
        ("response_type", "code"),
        ("scope", scope.as_str()),
        ("access_type", "offline"),
        ("prompt", "consent"),
        ("state", state.as_str()),
    ])
    .map_err(|e| e.to_string())?;

    Ok(format!("{}?{}", GOOGLE_AUTH_URL, query))
}
