//! Caller identity providers.

use appointly_common::models::Identity;
use appointly_common::services::{BoxFuture, IdentityProvider, ServiceError, SessionCredentials};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

const SERVICE_NAME: &str = "identity";

/// Identity Toolkit endpoint that resolves an ID token to its account.
pub const ACCOUNTS_LOOKUP_URL: &str = "https://identitytoolkit.googleapis.com/v1/accounts:lookup";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LookupUser {
    local_id: String,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LookupResponse {
    #[serde(default)]
    users: Vec<LookupUser>,
}

/// Resolves the caller's Firebase ID token (`Authorization: Bearer ...`).
///
/// Identity Toolkit answers 400 for expired, revoked or malformed tokens;
/// those callers are unauthenticated rather than a provider failure.
pub struct FirebaseIdentityProvider {
    http: Client,
    lookup_url: String,
    api_key: String,
}

impl FirebaseIdentityProvider {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_lookup_url(ACCOUNTS_LOOKUP_URL, api_key)
    }

    pub fn with_lookup_url(lookup_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            lookup_url: lookup_url.into(),
            api_key: api_key.into(),
        }
    }

    async fn lookup(&self, id_token: &str) -> Result<Option<Identity>, reqwest::Error> {
        let response = self
            .http
            .post(&self.lookup_url)
            .query(&[("key", self.api_key.as_str())])
            .json(&json!({ "idToken": id_token }))
            .send()
            .await?;

        if response.status() == StatusCode::BAD_REQUEST {
            debug!("ID token rejected by Identity Toolkit");
            return Ok(None);
        }

        let body: LookupResponse = response.error_for_status()?.json().await?;
        Ok(body.users.into_iter().next().map(|user| Identity {
            id: user.local_id,
            display_name: user.display_name,
            email: user.email,
        }))
    }
}

impl IdentityProvider for FirebaseIdentityProvider {
    fn resolve(
        &self,
        credentials: SessionCredentials,
    ) -> BoxFuture<'_, Option<Identity>, ServiceError> {
        Box::pin(async move {
            let Some(token) = credentials.bearer_token.filter(|t| !t.is_empty()) else {
                return Ok(None);
            };
            self.lookup(&token)
                .await
                .map_err(|e| ServiceError::failed(SERVICE_NAME, e.to_string()))
        })
    }
}

/// Trusts the `x-user-uid`, `x-user-name` and `x-user-email` headers.
///
/// Any client can claim any identity with this provider. Only for local
/// development behind no public network.
#[derive(Debug, Default, Clone)]
pub struct HeaderIdentityProvider;

impl HeaderIdentityProvider {
    pub fn new() -> Self {
        Self
    }
}

impl IdentityProvider for HeaderIdentityProvider {
    fn resolve(
        &self,
        credentials: SessionCredentials,
    ) -> BoxFuture<'_, Option<Identity>, ServiceError> {
        let identity = credentials
            .user_id
            .filter(|uid| !uid.trim().is_empty())
            .map(|id| Identity {
                id,
                display_name: credentials.display_name,
                email: credentials.email,
            });
        Box::pin(async move { Ok(identity) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_header_provider_requires_uid() {
        let provider = HeaderIdentityProvider::new();

        let none = provider.resolve(SessionCredentials::default()).await.unwrap();
        assert!(none.is_none());

        let blank = provider
            .resolve(SessionCredentials {
                user_id: Some("  ".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(blank.is_none());

        let ada = provider
            .resolve(SessionCredentials {
                user_id: Some("u1".to_string()),
                display_name: Some("Ada".to_string()),
                email: Some("ada@example.com".to_string()),
                bearer_token: None,
            })
            .await
            .unwrap()
            .unwrap();
        assert_eq!(ada.id, "u1");
        assert_eq!(ada.display_name.as_deref(), Some("Ada"));
    }

    #[tokio::test]
    async fn test_firebase_provider_without_token_is_anonymous() {
        let provider = FirebaseIdentityProvider::with_lookup_url("http://127.0.0.1:9", "key");
        let resolved = provider.resolve(SessionCredentials::default()).await.unwrap();
        assert!(resolved.is_none());
    }
}
