// --- File: crates/appointly_common/src/services.rs ---
//! Service abstractions for external collaborators.
//!
//! The scheduling code never talks to Google or Firebase directly. It goes
//! through the three traits below, which are implemented by the provider
//! crates (`appointly-gcal`, `appointly-firebase`) and by in-memory stand-ins
//! used in development and tests. All trait objects are constructed once at
//! process start and shared through router state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;
use thiserror::Error;

use crate::models::{BusyInterval, Identity};

/// Type alias for a boxed future that returns a Result
pub type BoxFuture<'a, T, E> = Pin<Box<dyn Future<Output = Result<T, E>> + Send + 'a>>;

/// Failure at a collaborator boundary.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// The collaborator was reached but the operation failed, or it could
    /// not be reached at all (network, credentials, expired token).
    #[error("{service} failed: {message}")]
    Failed {
        service: &'static str,
        message: String,
    },

    /// A conditional create found an existing document under the key.
    #[error("document {0} already exists")]
    AlreadyExists(String),

    /// The call was abandoned after the configured timeout.
    #[error("{service} timed out after {after:?}")]
    Timeout {
        service: &'static str,
        after: Duration,
    },
}

impl ServiceError {
    pub fn failed(service: &'static str, message: impl Into<String>) -> Self {
        ServiceError::Failed {
            service,
            message: message.into(),
        }
    }
}

/// Runs a collaborator call with a deadline.
pub async fn with_timeout<T, F>(
    service: &'static str,
    after: Duration,
    call: F,
) -> Result<T, ServiceError>
where
    F: Future<Output = Result<T, ServiceError>>,
{
    match tokio::time::timeout(after, call).await {
        Ok(result) => result,
        Err(_) => Err(ServiceError::Timeout { service, after }),
    }
}

/// A trait for calendar provider operations.
pub trait CalendarService: Send + Sync {
    /// Busy intervals of `calendar_id` within `[start_time, end_time)`,
    /// sorted by start.
    fn get_busy_times(
        &self,
        calendar_id: &str,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> BoxFuture<'_, Vec<BusyInterval>, ServiceError>;

    /// Create a calendar event.
    fn create_event(
        &self,
        calendar_id: &str,
        event: CalendarEvent,
    ) -> BoxFuture<'_, CalendarEventResult, ServiceError>;
}

/// Raw document fields, as stored.
pub type Fields = Map<String, Value>;

/// A stored document together with its id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub fields: Fields,
}

impl Document {
    pub fn new(id: impl Into<String>, fields: Fields) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }

    /// Deserializes the fields into a typed record.
    pub fn decode<T: serde::de::DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(Value::Object(self.fields.clone()))
    }
}

/// Comparison supported by [`DocumentStore::query`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Equal,
    ArrayContains,
}

/// A single-field query predicate.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldFilter {
    pub field: String,
    pub op: FilterOp,
    pub value: Value,
}

impl FieldFilter {
    pub fn equal(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            op: FilterOp::Equal,
            value: value.into(),
        }
    }

    pub fn array_contains(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            op: FilterOp::ArrayContains,
            value: value.into(),
        }
    }

    /// Evaluates the predicate against a document's fields.
    pub fn matches(&self, fields: &Fields) -> bool {
        match (self.op, fields.get(&self.field)) {
            (FilterOp::Equal, Some(actual)) => actual == &self.value,
            (FilterOp::ArrayContains, Some(Value::Array(items))) => {
                items.iter().any(|item| item == &self.value)
            }
            _ => false,
        }
    }
}

/// A trait for the persistent document store.
pub trait DocumentStore: Send + Sync {
    /// Fetch a document, `None` if absent.
    fn get(&self, collection: &str, id: &str) -> BoxFuture<'_, Option<Document>, ServiceError>;

    /// Write a document. With `merge`, only the given top-level fields are
    /// replaced; otherwise the whole document is overwritten.
    fn set(
        &self,
        collection: &str,
        id: &str,
        fields: Fields,
        merge: bool,
    ) -> BoxFuture<'_, (), ServiceError>;

    /// Create a document only if no document exists under `id`; fails with
    /// [`ServiceError::AlreadyExists`] otherwise.
    fn create(
        &self,
        collection: &str,
        id: &str,
        fields: Fields,
    ) -> BoxFuture<'_, (), ServiceError>;

    /// All documents of `collection` matching `filter`.
    fn query(
        &self,
        collection: &str,
        filter: FieldFilter,
    ) -> BoxFuture<'_, Vec<Document>, ServiceError>;
}

/// What a request carries to identify its caller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionCredentials {
    /// `Authorization: Bearer <token>` value.
    pub bearer_token: Option<String>,
    /// `x-user-uid` header.
    pub user_id: Option<String>,
    /// `x-user-name` header.
    pub display_name: Option<String>,
    /// `x-user-email` header.
    pub email: Option<String>,
}

/// A trait for the identity provider.
pub trait IdentityProvider: Send + Sync {
    /// Resolve the caller, `None` when unauthenticated.
    fn resolve(
        &self,
        credentials: SessionCredentials,
    ) -> BoxFuture<'_, Option<Identity>, ServiceError>;
}

/// An event to create in a calendar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub title: String,
    pub description: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// Attendee email addresses.
    pub attendees: Vec<String>,
}

/// Represents the result of a calendar event operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarEventResult {
    /// The ID of the event.
    pub event_id: Option<String>,
    /// The status of the event.
    pub status: String,
}
