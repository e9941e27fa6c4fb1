//! Access tokens for the Firestore REST API
//!
//! Production requests carry an OAuth2 token minted from a service account
//! key. The authenticator is built once and caches tokens until they expire.
//! The Firestore emulator accepts the fixed token `owner`, which grants admin
//! access and skips security rules.

use std::{error::Error, fmt, future::Future, path::Path, pin::Pin, sync::Arc};
use tracing::info;
use yup_oauth2::{read_service_account_key, ServiceAccountAuthenticator};

/// OAuth scope for Firestore document access.
pub const DATASTORE_SCOPE: &str = "https://www.googleapis.com/auth/datastore";

/// Token the Firestore emulator treats as an admin credential.
pub const EMULATOR_TOKEN: &str = "owner";

type AuthError = Box<dyn Error + Send + Sync>;
type TokenFuture = Pin<Box<dyn Future<Output = Result<String, AuthError>> + Send>>;

/// A service account authenticator, shared by every clone.
#[derive(Clone)]
pub struct ServiceAccountTokens {
    client_email: String,
    fetch: Arc<dyn Fn() -> TokenFuture + Send + Sync>,
}

impl ServiceAccountTokens {
    /// Reads the key at `key_path` and builds its authenticator.
    ///
    /// # Errors
    ///
    /// This function will return an error if:
    /// * The service account key file cannot be read
    /// * The authenticator cannot be built
    pub async fn from_key_file(key_path: &str) -> Result<Self, AuthError> {
        let sa_key = read_service_account_key(Path::new(key_path)).await?;
        let client_email = sa_key.client_email.clone();
        info!("Firestore authenticates as {}", client_email);

        let auth = Arc::new(ServiceAccountAuthenticator::builder(sa_key).build().await?);
        let fetch = move || -> TokenFuture {
            let auth = auth.clone();
            Box::pin(async move {
                match auth.token(&[DATASTORE_SCOPE]).await {
                    Ok(access_token) => access_token
                        .token()
                        .map(str::to_string)
                        .ok_or_else(|| AuthError::from("No token available")),
                    Err(e) => Err(AuthError::from(e)),
                }
            })
        };
        Ok(Self {
            client_email,
            fetch: Arc::new(fetch),
        })
    }

    /// A bearer token for [`DATASTORE_SCOPE`], from the cache while valid.
    pub async fn token(&self) -> Result<String, AuthError> {
        (self.fetch)().await
    }
}

impl fmt::Debug for ServiceAccountTokens {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccountTokens")
            .field("client_email", &self.client_email)
            .finish_non_exhaustive()
    }
}

/// Where bearer tokens for Firestore requests come from.
#[derive(Debug, Clone)]
pub enum TokenSource {
    ServiceAccount(ServiceAccountTokens),
    /// Send the same token every time (emulator, tests).
    Static(String),
}

impl TokenSource {
    /// Returns a bearer token valid for [`DATASTORE_SCOPE`].
    pub async fn token(&self) -> Result<String, AuthError> {
        match self {
            TokenSource::Static(token) => Ok(token.clone()),
            TokenSource::ServiceAccount(tokens) => tokens.token().await,
        }
    }
}
