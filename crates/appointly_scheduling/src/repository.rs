// --- File: crates/appointly_scheduling/src/repository.rs ---
//! Typed access to the scheduling collections.
//!
//! Every call goes through the shared [`DocumentStore`] with the configured
//! collaborator timeout.

use appointly_common::models::{BusyInterval, Identity, Role};
use appointly_common::services::{with_timeout, DocumentStore, FieldFilter, Fields, ServiceError};
use appointly_common::{internal_error, AppointlyError};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::models::{
    collections, AvailabilitySettings, Booking, BookingRecord, CalendarLink,
    SellerProfile, SellerSummary, UserProfile,
};

const STORE: &str = "firestore";

/// Converts a serializable record into document fields.
pub fn to_fields<T: Serialize>(record: &T) -> Result<Fields, AppointlyError> {
    match serde_json::to_value(record)? {
        Value::Object(fields) => Ok(fields),
        other => Err(internal_error(format!(
            "record serialized to a non-object: {}",
            other
        ))),
    }
}

fn object(value: Value) -> Fields {
    match value {
        Value::Object(fields) => fields,
        _ => Fields::new(),
    }
}

/// Id of the booking of a seller's slot starting at `start`.
pub fn booking_key(seller_uid: &str, start: DateTime<Utc>) -> String {
    format!("{}_{}", seller_uid, start.timestamp())
}

#[derive(Clone)]
pub struct SchedulingRepository {
    store: Arc<dyn DocumentStore>,
    timeout: Duration,
}

impl SchedulingRepository {
    pub fn new(store: Arc<dyn DocumentStore>, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    async fn get<T: DeserializeOwned>(
        &self,
        collection: &str,
        id: &str,
    ) -> Result<Option<T>, AppointlyError> {
        let doc = with_timeout(STORE, self.timeout, self.store.get(collection, id)).await?;
        doc.map(|d| d.decode::<T>())
            .transpose()
            .map_err(|e| internal_error(format!("{}/{} is malformed: {}", collection, id, e)))
    }

    async fn merge(&self, collection: &str, id: &str, fields: Fields) -> Result<(), AppointlyError> {
        with_timeout(STORE, self.timeout, self.store.set(collection, id, fields, true)).await?;
        Ok(())
    }

    // --- users ---

    pub async fn get_user(&self, uid: &str) -> Result<Option<UserProfile>, AppointlyError> {
        self.get(collections::USERS, uid).await
    }

    /// Records the caller's role. Sellers also get a `sellers/{uid}` profile.
    pub async fn set_role(&self, identity: &Identity, role: Role) -> Result<UserProfile, AppointlyError> {
        let profile = UserProfile {
            uid: identity.id.clone(),
            name: identity.display_name.clone(),
            email: identity.email.clone(),
            role: Some(role),
        };
        self.merge(collections::USERS, &identity.id, to_fields(&profile)?)
            .await?;

        if role == Role::Seller {
            let seller = object(json!({
                "uid": identity.id,
                "name": identity.display_name,
                "email": identity.email,
                "role": Role::Seller,
            }));
            self.merge(collections::SELLERS, &identity.id, seller).await?;
        }
        Ok(profile)
    }

    /// Users whose role is seller, named "Seller" when they have no name.
    pub async fn list_sellers(&self) -> Result<Vec<SellerSummary>, AppointlyError> {
        let docs = with_timeout(
            STORE,
            self.timeout,
            self.store
                .query(collections::USERS, FieldFilter::equal("role", Role::Seller.as_str())),
        )
        .await?;

        Ok(docs
            .into_iter()
            .map(|doc| {
                let name = doc
                    .fields
                    .get("name")
                    .and_then(Value::as_str)
                    .filter(|n| !n.is_empty())
                    .unwrap_or("Seller")
                    .to_string();
                SellerSummary { uid: doc.id, name }
            })
            .collect())
    }

    // --- sellers ---

    pub async fn get_seller(&self, uid: &str) -> Result<Option<SellerProfile>, AppointlyError> {
        self.get(collections::SELLERS, uid).await
    }

    pub async fn set_availability(
        &self,
        uid: &str,
        settings: &AvailabilitySettings,
    ) -> Result<(), AppointlyError> {
        let fields = object(json!({
            "uid": uid,
            "availabilitySettings": to_fields(settings)?,
        }));
        self.merge(collections::SELLERS, uid, fields).await
    }

    /// Links `link.calendar_id` to the seller and fills in default
    /// availability if the seller has none yet.
    pub async fn link_calendar(
        &self,
        link: &CalendarLink,
        defaults: &AvailabilitySettings,
    ) -> Result<(), AppointlyError> {
        self.merge(collections::CALENDAR_TOKENS, &link.uid, to_fields(link)?)
            .await?;

        let existing = self.get_seller(&link.uid).await?;
        let mut fields = object(json!({
            "uid": link.uid,
            "role": Role::Seller,
            "calendarConnected": true,
        }));
        if existing
            .as_ref()
            .and_then(|s| s.availability_settings.as_ref())
            .is_none()
        {
            fields.insert("availabilitySettings".into(), Value::Object(to_fields(defaults)?));
        }
        self.merge(collections::SELLERS, &link.uid, fields).await?;
        // the sellers listing reads users/{uid}.role
        self.merge(
            collections::USERS,
            &link.uid,
            object(json!({"uid": link.uid, "role": Role::Seller})),
        )
        .await
    }

    pub async fn get_calendar_link(&self, uid: &str) -> Result<Option<CalendarLink>, AppointlyError> {
        self.get(collections::CALENDAR_TOKENS, uid).await
    }

    // --- bookings ---

    /// Stores the booking under its slot key. The create is conditional, so
    /// of two bookings for the same slot only the first is stored; the other
    /// fails with a conflict. Returns the booking id.
    pub async fn insert_booking(&self, record: &BookingRecord) -> Result<String, AppointlyError> {
        let id = booking_key(&record.seller_uid, record.start);
        match with_timeout(
            STORE,
            self.timeout,
            self.store
                .create(collections::APPOINTMENTS, &id, to_fields(record)?),
        )
        .await
        {
            Ok(()) => {
                debug!("Stored booking {}", id);
                Ok(id)
            }
            Err(ServiceError::AlreadyExists(_)) => Err(AppointlyError::ConflictError(
                "This slot has already been booked".to_string(),
            )),
            Err(other) => Err(other.into()),
        }
    }

    /// Bookings the user takes part in, oldest start first.
    pub async fn bookings_for_participant(&self, uid: &str) -> Result<Vec<Booking>, AppointlyError> {
        let docs = with_timeout(
            STORE,
            self.timeout,
            self.store.query(
                collections::APPOINTMENTS,
                FieldFilter::array_contains("participants", uid),
            ),
        )
        .await?;

        let mut bookings: Vec<Booking> = docs
            .into_iter()
            .filter_map(|doc| match doc.decode::<BookingRecord>() {
                Ok(record) => Some(Booking { id: doc.id, record }),
                Err(e) => {
                    warn!("Skipping malformed appointment {}: {}", doc.id, e);
                    None
                }
            })
            .collect();
        bookings.sort_by_key(|b| b.record.start);
        Ok(bookings)
    }

    /// Bookings of a seller overlapping `[from, to)`, as busy time.
    pub async fn seller_booked_intervals(
        &self,
        seller_uid: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<BusyInterval>, AppointlyError> {
        let docs = with_timeout(
            STORE,
            self.timeout,
            self.store
                .query(collections::APPOINTMENTS, FieldFilter::equal("sellerUid", seller_uid)),
        )
        .await?;

        Ok(docs
            .iter()
            .filter_map(|doc| doc.decode::<BookingRecord>().ok())
            .map(|record| BusyInterval::new(record.start, record.end))
            .filter(|busy| busy.overlaps(from, to))
            .collect())
    }
}
