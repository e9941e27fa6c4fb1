//! Firestore REST client
//!
//! Implements [`DocumentStore`] against the Firestore v1 REST API:
//!
//! | operation | request |
//! |---|---|
//! | `get` | `GET {base}/{collection}/{id}` (404 means absent) |
//! | `set` | `PATCH {base}/{collection}/{id}`, with `updateMask.fieldPaths` per field when merging |
//! | `create` | `POST {base}/{collection}?documentId={id}` (409 means the id is taken) |
//! | `query` | `POST {base}:runQuery` with a single field filter |

use appointly_common::services::{
    BoxFuture, Document, DocumentStore, FieldFilter, Fields, FilterOp, ServiceError,
};
use appointly_config::FirebaseConfig;
use reqwest::{header, Client, Response, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::debug;

use crate::auth::{ServiceAccountTokens, TokenSource, EMULATOR_TOKEN};
use crate::firestore_value::{decode_fields, encode_fields, encode_value};

const SERVICE_NAME: &str = "firestore";

/// Errors that can occur when talking to Firestore
#[derive(Error, Debug)]
pub enum FirestoreError {
    /// Could not obtain an access token
    #[error("Authentication error: {0}")]
    AuthError(String),

    /// Error during HTTP request to Firestore
    #[error("HTTP request error: {0}")]
    RequestError(#[from] reqwest::Error),

    /// A document with the requested id already exists
    #[error("Document {0} already exists")]
    AlreadyExists(String),

    /// Error returned by the Firestore API
    #[error("Firestore API error ({status}): {body}")]
    ApiError { status: u16, body: String },

    /// A response that does not look like a Firestore document
    #[error("Malformed document: {0}")]
    Malformed(String),
}

impl From<FirestoreError> for ServiceError {
    fn from(err: FirestoreError) -> Self {
        match err {
            FirestoreError::AlreadyExists(key) => ServiceError::AlreadyExists(key),
            other => ServiceError::failed(SERVICE_NAME, other.to_string()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawDocument {
    name: String,
    #[serde(default)]
    fields: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct RunQueryItem {
    #[serde(default)]
    document: Option<RawDocument>,
}

/// A Firestore client bound to one project's `(default)` database.
#[derive(Clone)]
pub struct FirestoreClient {
    http: Client,
    base_url: String,
    tokens: TokenSource,
}

impl FirestoreClient {
    /// Client for the project in `config`.
    ///
    /// With `emulator_host` set, requests go to the emulator over plain HTTP
    /// with the emulator's admin token. Otherwise the service account key at
    /// `key_path` is loaded here, once.
    pub async fn new(config: &FirebaseConfig) -> Result<Self, FirestoreError> {
        let database = format!(
            "v1/projects/{}/databases/(default)/documents",
            config.project_id
        );
        if let Some(host) = &config.emulator_host {
            return Ok(Self::with_base_url(
                format!("http://{}/{}", host, database),
                TokenSource::Static(EMULATOR_TOKEN.to_string()),
            ));
        }

        let key_path = config
            .key_path
            .as_deref()
            .ok_or_else(|| FirestoreError::AuthError("Missing key_path in FirebaseConfig".into()))?;
        let tokens = ServiceAccountTokens::from_key_file(key_path)
            .await
            .map_err(|e| FirestoreError::AuthError(e.to_string()))?;
        Ok(Self::with_base_url(
            format!("https://firestore.googleapis.com/{}", database),
            TokenSource::ServiceAccount(tokens),
        ))
    }

    /// Client for an explicit documents root URL.
    pub fn with_base_url(base_url: impl Into<String>, tokens: TokenSource) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            tokens,
        }
    }

    async fn bearer(&self) -> Result<String, FirestoreError> {
        self.tokens
            .token()
            .await
            .map(|token| format!("Bearer {}", token))
            .map_err(|e| FirestoreError::AuthError(e.to_string()))
    }

    fn document_url(&self, collection: &str, id: &str) -> String {
        format!("{}/{}/{}", self.base_url, collection, id)
    }

    async fn check(response: Response) -> Result<Response, FirestoreError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let body = response.text().await?;
        Err(FirestoreError::ApiError { status, body })
    }

    pub async fn get_document(
        &self,
        collection: &str,
        id: &str,
    ) -> Result<Option<Document>, FirestoreError> {
        let response = self
            .http
            .get(self.document_url(collection, id))
            .header(header::AUTHORIZATION, self.bearer().await?)
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let raw: RawDocument = Self::check(response).await?.json().await?;
        to_document(raw).map(Some)
    }

    pub async fn set_document(
        &self,
        collection: &str,
        id: &str,
        fields: Fields,
        merge: bool,
    ) -> Result<(), FirestoreError> {
        let mut request = self
            .http
            .patch(self.document_url(collection, id))
            .header(header::AUTHORIZATION, self.bearer().await?);

        if merge {
            let mask: Vec<(&str, &str)> = fields
                .keys()
                .map(|k| ("updateMask.fieldPaths", k.as_str()))
                .collect();
            request = request.query(&mask);
        }

        let response = request
            .json(&json!({ "fields": encode_fields(&fields) }))
            .send()
            .await?;
        Self::check(response).await?;
        debug!("Wrote {}/{} (merge: {})", collection, id, merge);
        Ok(())
    }

    pub async fn create_document(
        &self,
        collection: &str,
        id: &str,
        fields: Fields,
    ) -> Result<(), FirestoreError> {
        let response = self
            .http
            .post(format!("{}/{}", self.base_url, collection))
            .query(&[("documentId", id)])
            .header(header::AUTHORIZATION, self.bearer().await?)
            .json(&json!({ "fields": encode_fields(&fields) }))
            .send()
            .await?;

        if response.status() == StatusCode::CONFLICT {
            return Err(FirestoreError::AlreadyExists(format!(
                "{}/{}",
                collection, id
            )));
        }
        Self::check(response).await?;
        Ok(())
    }

    pub async fn run_query(
        &self,
        collection: &str,
        filter: FieldFilter,
    ) -> Result<Vec<Document>, FirestoreError> {
        let op = match filter.op {
            FilterOp::Equal => "EQUAL",
            FilterOp::ArrayContains => "ARRAY_CONTAINS",
        };
        let body = json!({
            "structuredQuery": {
                "from": [{ "collectionId": collection }],
                "where": {
                    "fieldFilter": {
                        "field": { "fieldPath": filter.field },
                        "op": op,
                        "value": encode_value(&filter.value),
                    }
                }
            }
        });

        let response = self
            .http
            .post(format!("{}:runQuery", self.base_url))
            .header(header::AUTHORIZATION, self.bearer().await?)
            .json(&body)
            .send()
            .await?;

        let items: Vec<RunQueryItem> = Self::check(response).await?.json().await?;
        // items without a document only carry readTime
        items
            .into_iter()
            .filter_map(|item| item.document)
            .map(to_document)
            .collect()
    }
}

fn document_id(name: &str) -> &str {
    name.rsplit('/').next().unwrap_or(name)
}

fn to_document(raw: RawDocument) -> Result<Document, FirestoreError> {
    let fields = match raw.fields {
        Some(fields) => decode_fields(&fields).map_err(FirestoreError::Malformed)?,
        None => Fields::new(),
    };
    Ok(Document::new(document_id(&raw.name), fields))
}

impl DocumentStore for FirestoreClient {
    fn get(&self, collection: &str, id: &str) -> BoxFuture<'_, Option<Document>, ServiceError> {
        let (collection, id) = (collection.to_string(), id.to_string());
        Box::pin(async move {
            self.get_document(&collection, &id)
                .await
                .map_err(ServiceError::from)
        })
    }

    fn set(
        &self,
        collection: &str,
        id: &str,
        fields: Fields,
        merge: bool,
    ) -> BoxFuture<'_, (), ServiceError> {
        let (collection, id) = (collection.to_string(), id.to_string());
        Box::pin(async move {
            self.set_document(&collection, &id, fields, merge)
                .await
                .map_err(ServiceError::from)
        })
    }

    fn create(
        &self,
        collection: &str,
        id: &str,
        fields: Fields,
    ) -> BoxFuture<'_, (), ServiceError> {
        let (collection, id) = (collection.to_string(), id.to_string());
        Box::pin(async move {
            self.create_document(&collection, &id, fields)
                .await
                .map_err(ServiceError::from)
        })
    }

    fn query(
        &self,
        collection: &str,
        filter: FieldFilter,
    ) -> BoxFuture<'_, Vec<Document>, ServiceError> {
        let collection = collection.to_string();
        Box::pin(async move {
            self.run_query(&collection, filter)
                .await
                .map_err(ServiceError::from)
        })
    }
}
