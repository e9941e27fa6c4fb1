// --- File: crates/services/appointly_backend/src/service_factory.rs ---
//! Builds the collaborators the scheduling API talks to.
//!
//! Each provider is chosen from the configuration once at startup. Disabled
//! providers fall back to in-process implementations so the server can run
//! locally without Google credentials.
use appointly_common::services::{CalendarService, DocumentStore, IdentityProvider};
use appointly_common::{config_error, AppointlyError};
use appointly_config::{AppConfig, AuthMode};
use appointly_firebase::{
    FirebaseIdentityProvider, FirestoreClient, HeaderIdentityProvider, MemoryDocumentStore,
};
use appointly_gcal::{create_calendar_hub, GoogleCalendarService, MemoryCalendarService};
use std::sync::Arc;
use tracing::{info, warn};

pub struct AppointlyServiceFactory {
    pub calendar: Arc<dyn CalendarService>,
    pub store: Arc<dyn DocumentStore>,
    pub identity: Arc<dyn IdentityProvider>,
}

impl AppointlyServiceFactory {
    pub async fn new(config: &AppConfig) -> Result<Self, AppointlyError> {
        Ok(Self {
            calendar: calendar_service(config).await?,
            store: document_store(config).await?,
            identity: identity_provider(config)?,
        })
    }
}

async fn calendar_service(config: &AppConfig) -> Result<Arc<dyn CalendarService>, AppointlyError> {
    if !config.use_gcal {
        warn!("Google Calendar disabled, using the in-memory calendar");
        return Ok(Arc::new(MemoryCalendarService::new()));
    }
    let gcal = config
        .gcal
        .as_ref()
        .ok_or_else(|| config_error("use_gcal is set but [gcal] is missing"))?;
    info!("Initializing Google Calendar service...");
    let hub = create_calendar_hub(gcal)
        .await
        .map_err(|e| config_error(format!("Failed to create calendar hub: {}", e)))?;
    Ok(Arc::new(GoogleCalendarService::new(Arc::new(hub))))
}

async fn document_store(config: &AppConfig) -> Result<Arc<dyn DocumentStore>, AppointlyError> {
    if !config.use_firestore {
        warn!("Firestore disabled, documents live in memory and are lost on restart");
        return Ok(Arc::new(MemoryDocumentStore::new()));
    }
    let firebase = config
        .firebase
        .as_ref()
        .ok_or_else(|| config_error("use_firestore is set but [firebase] is missing"))?;
    if firebase.emulator_host.is_none() && firebase.key_path.is_none() {
        return Err(config_error("Firestore needs firebase.key_path or firebase.emulator_host"));
    }
    info!("Using Firestore project {}", firebase.project_id);
    let client = FirestoreClient::new(firebase)
        .await
        .map_err(|e| config_error(format!("Failed to create Firestore client: {}", e)))?;
    Ok(Arc::new(client))
}

fn identity_provider(config: &AppConfig) -> Result<Arc<dyn IdentityProvider>, AppointlyError> {
    match config.auth.mode {
        AuthMode::Firebase => {
            let api_key = config
                .firebase
                .as_ref()
                .and_then(|f| f.api_key.clone())
                .ok_or_else(|| config_error("auth.mode = firebase needs firebase.api_key"))?;
            info!("Resolving callers through Firebase Auth");
            Ok(Arc::new(FirebaseIdentityProvider::new(api_key)))
        }
        AuthMode::Header => {
            warn!("auth.mode = header: caller identity is taken from x-user-* headers");
            Ok(Arc::new(HeaderIdentityProvider::new()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use appointly_config::FirebaseConfig;

    #[tokio::test]
    async fn test_defaults_use_in_memory_providers() {
        assert!(AppointlyServiceFactory::new(&AppConfig::default()).await.is_ok());
    }

    #[tokio::test]
    async fn test_enabled_provider_without_section_fails() {
        let config = AppConfig {
            use_gcal: true,
            ..AppConfig::default()
        };
        assert!(AppointlyServiceFactory::new(&config).await.is_err());

        let config = AppConfig {
            use_firestore: true,
            ..AppConfig::default()
        };
        assert!(AppointlyServiceFactory::new(&config).await.is_err());
    }

    #[test]
    fn test_firebase_auth_requires_api_key() {
        let mut config = AppConfig::default();
        config.auth.mode = AuthMode::Firebase;
        assert!(identity_provider(&config).is_err());

        config.firebase = Some(FirebaseConfig {
            project_id: "demo".to_string(),
            key_path: None,
            api_key: Some("key".to_string()),
            emulator_host: None,
        });
        assert!(identity_provider(&config).is_ok());
    }

    #[tokio::test]
    async fn test_firestore_emulator_needs_no_key() {
        let config = AppConfig {
            use_firestore: true,
            firebase: Some(FirebaseConfig {
                project_id: "demo".to_string(),
                key_path: None,
                api_key: None,
                emulator_host: Some("localhost:8080".to_string()),
            }),
            ..AppConfig::default()
        };
        assert!(document_store(&config).await.is_ok());
    }
}
