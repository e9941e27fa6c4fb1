// --- File: crates/appointly_gcal/src/service.rs ---
//! Google Calendar service implementation.
//!
//! This module provides an implementation of the CalendarService trait for Google Calendar.

use appointly_common::models::BusyInterval;
use appointly_common::services::{
    BoxFuture, CalendarEvent, CalendarEventResult, CalendarService, ServiceError,
};
use chrono::{DateTime, Utc};
use google_calendar3::api::{
    Event, EventAttendee, EventDateTime, FreeBusyRequest, FreeBusyRequestItem,
};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

use crate::auth::HubType;

const SERVICE_NAME: &str = "calendar";

/// Errors that can occur when interacting with Google Calendar.
#[derive(Error, Debug)]
pub enum GcalServiceError {
    #[error("Google API Error: {0}")]
    ApiError(#[from] google_calendar3::Error),
    #[error("Calendar {calendar_id} rejected the freebusy query: {reason}")]
    CalendarUnavailable { calendar_id: String, reason: String },
    #[error("Invalid event: {0}")]
    InvalidEvent(String),
}

impl From<GcalServiceError> for ServiceError {
    fn from(err: GcalServiceError) -> Self {
        ServiceError::failed(SERVICE_NAME, err.to_string())
    }
}

/// Google Calendar service implementation.
pub struct GoogleCalendarService {
    calendar_hub: Arc<HubType>,
}

impl GoogleCalendarService {
    /// Create a new Google Calendar service.
    pub fn new(calendar_hub: Arc<HubType>) -> Self {
        Self { calendar_hub }
    }

    async fn query_busy(
        &self,
        calendar_id: String,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> Result<Vec<BusyInterval>, GcalServiceError> {
        let req = FreeBusyRequest {
            time_min: Some(start_time),
            time_max: Some(end_time),
            time_zone: Some("UTC".to_string()),
            items: Some(vec![FreeBusyRequestItem {
                id: Some(calendar_id.clone()),
                ..Default::default()
            }]),
            ..Default::default()
        };

        let (_response, freebusy_response) =
            self.calendar_hub.freebusy().query(req).doit().await?;

        let Some(cal_info) = freebusy_response
            .calendars
            .and_then(|mut calendars| calendars.remove(&calendar_id))
        else {
            return Ok(Vec::new());
        };

        // Google reports per-calendar failures (notFound, forbidden) inline
        if let Some(errors) = cal_info.errors.filter(|errors| !errors.is_empty()) {
            let reason = errors
                .iter()
                .filter_map(|e| e.reason.clone())
                .collect::<Vec<_>>()
                .join(", ");
            return Err(GcalServiceError::CalendarUnavailable {
                calendar_id,
                reason,
            });
        }

        let mut busy_periods: Vec<BusyInterval> = cal_info
            .busy
            .unwrap_or_default()
            .into_iter()
            .filter_map(|period| match (period.start, period.end) {
                (Some(start), Some(end)) => Some(BusyInterval::new(start, end)),
                _ => {
                    warn!("Skipping busy period with missing start/end: {:?}", period);
                    None
                }
            })
            .collect();

        busy_periods.sort_by_key(|b| b.start);
        debug!(
            "{} busy periods for {} between {} and {}",
            busy_periods.len(),
            calendar_id,
            start_time,
            end_time
        );
        Ok(busy_periods)
    }

    async fn insert_event(
        &self,
        calendar_id: String,
        event: CalendarEvent,
    ) -> Result<CalendarEventResult, GcalServiceError> {
        if event.end_time <= event.start_time {
            return Err(GcalServiceError::InvalidEvent(
                "End time must be after start time".to_string(),
            ));
        }

        let attendees = (!event.attendees.is_empty()).then(|| {
            event
                .attendees
                .iter()
                .map(|email| EventAttendee {
                    email: Some(email.clone()),
                    ..Default::default()
                })
                .collect()
        });

        let new_event = Event {
            summary: Some(event.title),
            description: event.description,
            start: Some(EventDateTime {
                date_time: Some(event.start_time),
                time_zone: Some("UTC".to_string()),
                ..Default::default()
            }),
            end: Some(EventDateTime {
                date_time: Some(event.end_time),
                time_zone: Some("UTC".to_string()),
                ..Default::default()
            }),
            attendees,
            ..Default::default()
        };

        let (_response, created_event) = self
            .calendar_hub
            .events()
            .insert(new_event, &calendar_id)
            .send_updates("all")
            .doit()
            .await?;

        Ok(CalendarEventResult {
            event_id: created_event.id,
            status: created_event
                .status
                .unwrap_or_else(|| "confirmed".to_string()),
        })
    }
}

impl CalendarService for GoogleCalendarService {
    /// Busy periods from the freebusy endpoint, sorted by start.
    ///
    /// Periods missing either bound are skipped with a warning. A calendar
    /// the service account cannot read is an error, not an empty list.
    fn get_busy_times(
        &self,
        calendar_id: &str,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> BoxFuture<'_, Vec<BusyInterval>, ServiceError> {
        let calendar_id = calendar_id.to_string();
        Box::pin(async move {
            self.query_busy(calendar_id, start_time, end_time)
                .await
                .map_err(ServiceError::from)
        })
    }

    /// Inserts the event and notifies the attendees.
    ///
    /// No conflict check happens here; callers decide whether the slot is
    /// free before calling.
    fn create_event(
        &self,
        calendar_id: &str,
        event: CalendarEvent,
    ) -> BoxFuture<'_, CalendarEventResult, ServiceError> {
        let calendar_id = calendar_id.to_string();
        Box::pin(async move {
            self.insert_event(calendar_id, event)
                .await
                .map_err(ServiceError::from)
        })
    }
}
