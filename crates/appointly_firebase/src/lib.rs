//! Firebase integration for Appointly
//!
//! This crate provides the Firebase-backed collaborators:
//!
//! - [`FirestoreClient`]: a `DocumentStore` over the Firestore REST v1 API,
//!   authenticated with a service account or talking to the emulator
//! - [`FirebaseIdentityProvider`]: resolves a caller's ID token through the
//!   Identity Toolkit `accounts:lookup` endpoint
//! - [`HeaderIdentityProvider`]: trusts `x-user-*` headers, for local
//!   development only
//! - [`MemoryDocumentStore`]: an in-process `DocumentStore` for development
//!   and tests
//!
//! # Example
//!
//! ```rust,no_run
//! use appointly_config::FirebaseConfig;
//! use appointly_firebase::{FirestoreClient, FirestoreError};
//!
//! # async fn build() -> Result<(), FirestoreError> {
//! let config = FirebaseConfig {
//!     project_id: "my-project".to_string(),
//!     key_path: Some("./service_account_key.json".to_string()),
//!     api_key: None,
//!     emulator_host: None,
//! };
//! let store = FirestoreClient::new(&config).await?;
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod firestore;
pub mod firestore_value;
pub mod identity;
pub mod memory;

pub use firestore::{FirestoreClient, FirestoreError};
pub use identity::{FirebaseIdentityProvider, HeaderIdentityProvider};
pub use memory::MemoryDocumentStore;
