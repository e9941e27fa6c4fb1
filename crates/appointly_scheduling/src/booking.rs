// --- File: crates/appointly_scheduling/src/booking.rs ---
//! Booking creation.
//!
//! Order of operations:
//! 1. validate the request (400)
//! 2. load the seller (404) and their calendar link
//! 3. check that the interval is a slot the seller offers (400)
//! 4. check the seller's calendar and stored bookings for overlap (409)
//! 5. store the booking under its slot key with a conditional create (409
//!    when taken)
//! 6. create the seller's and, if linked, the buyer's calendar events
//!
//! Offered slots of one seller never partially overlap, so two overlapping
//! requests that pass step 3 share a slot key and step 5 admits only one.
//! Calendar failures in step 6 do not undo the booking; they are returned as
//! [`CalendarOutcome::Failed`] and logged at warn.

use appointly_common::models::Identity;
use appointly_common::services::{with_timeout, CalendarEvent, CalendarService};
use appointly_common::{conflict, validation_error, AppointlyError};
use appointly_config::SchedulingConfig;
use chrono::{DateTime, Utc};
use std::time::Duration;
use tracing::{info, warn};

use crate::logic::{is_offered, Slot};
use crate::models::{
    AvailabilitySettings, Booking, BookingCreatedResponse, BookingRecord, BookingStatus,
    CalendarLink, CalendarOutcome, CreateBookingRequest,
};
use crate::repository::SchedulingRepository;

pub const DEFAULT_SUMMARY: &str = "Appointment";

/// A booking request that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedBooking {
    pub seller_uid: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub summary: String,
}

fn required<'a>(value: &'a Option<String>, name: &str) -> Result<&'a str, AppointlyError> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| validation_error(format!("Missing required field '{}'", name)))
}

fn parse_instant(value: &str, name: &str) -> Result<DateTime<Utc>, AppointlyError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| validation_error(format!("'{}' must be an RFC 3339 timestamp", name)))
}

/// Checks required fields and the interval.
pub fn validate_request(
    request: &CreateBookingRequest,
    now: DateTime<Utc>,
) -> Result<ValidatedBooking, AppointlyError> {
    let seller_uid = required(&request.seller_uid, "sellerUid")?;
    let start = parse_instant(required(&request.start, "start")?, "start")?;
    let end = parse_instant(required(&request.end, "end")?, "end")?;

    if end <= start {
        return Err(validation_error("'end' must be after 'start'"));
    }
    if start < now {
        return Err(validation_error("Cannot book a slot in the past"));
    }

    let summary = request
        .summary
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(DEFAULT_SUMMARY)
        .to_string();

    Ok(ValidatedBooking {
        seller_uid: seller_uid.to_string(),
        start,
        end,
        summary,
    })
}

/// Collaborators a booking needs.
pub struct BookingService<'a> {
    pub repository: &'a SchedulingRepository,
    pub calendar: &'a dyn CalendarService,
    pub scheduling: &'a SchedulingConfig,
    pub timeout: Duration,
}

impl BookingService<'_> {
    pub async fn create(
        &self,
        buyer: &Identity,
        request: &CreateBookingRequest,
        now: DateTime<Utc>,
    ) -> Result<BookingCreatedResponse, AppointlyError> {
        let booking = validate_request(request, now)?;

        let seller = self
            .repository
            .get_seller(&booking.seller_uid)
            .await?
            .ok_or_else(|| {
                AppointlyError::NotFoundError(format!("Seller {} not found", booking.seller_uid))
            })?;
        let seller_link = self
            .repository
            .get_calendar_link(&seller.uid)
            .await?
            .ok_or_else(|| validation_error("Seller has not connected a calendar"))?;

        let availability = seller
            .availability_settings
            .unwrap_or_else(|| AvailabilitySettings::from(&self.scheduling.default_availability))
            .to_config(&self.scheduling.default_time_zone)
            .map_err(|e| validation_error(format!("Seller availability is invalid: {}", e)))?;
        let slot = Slot {
            start: booking.start,
            end: booking.end,
        };
        if !is_offered(&availability, slot, now) {
            return Err(validation_error(
                "The requested interval is not an offered slot of this seller",
            ));
        }

        self.ensure_free(&booking, &seller_link).await?;

        let record = BookingRecord {
            seller_uid: booking.seller_uid.clone(),
            buyer_uid: buyer.id.clone(),
            start: booking.start,
            end: booking.end,
            summary: booking.summary.clone(),
            participants: vec![booking.seller_uid.clone(), buyer.id.clone()],
            status: BookingStatus::Confirmed,
            created_at: now,
        };
        let id = self.repository.insert_booking(&record).await?;

        let attendees: Vec<String> = [seller.email.clone(), buyer.email.clone()]
            .into_iter()
            .flatten()
            .collect();
        let event = CalendarEvent {
            title: booking.summary.clone(),
            description: Some(format!(
                "Booked by {}",
                buyer.display_name.as_deref().unwrap_or(&buyer.id)
            )),
            start_time: booking.start,
            end_time: booking.end,
            attendees,
        };

        let buyer_link = match self.repository.get_calendar_link(&buyer.id).await {
            Ok(link) => link,
            Err(e) => {
                warn!("Could not look up buyer {} calendar: {}", buyer.id, e);
                None
            }
        };

        let (seller_calendar, buyer_calendar) = tokio::join!(
            self.create_event(Some(&seller_link), event.clone()),
            self.create_event(buyer_link.as_ref(), event),
        );

        let mut warnings = Vec::new();
        for (party, outcome) in [("seller", &seller_calendar), ("buyer", &buyer_calendar)] {
            if let CalendarOutcome::Failed { message } = outcome {
                warn!(
                    "Booking {} stands without {} calendar event: {}",
                    id, party, message
                );
                warnings.push(format!("The {} calendar event could not be created", party));
            }
        }

        info!(
            "Booked {} with {} at {} as {}",
            record.buyer_uid, record.seller_uid, record.start, id
        );

        Ok(BookingCreatedResponse {
            id: id.clone(),
            booking: Booking { id, record },
            seller_calendar,
            buyer_calendar,
            warnings,
        })
    }

    async fn ensure_free(
        &self,
        booking: &ValidatedBooking,
        seller_link: &CalendarLink,
    ) -> Result<(), AppointlyError> {
        let busy = with_timeout(
            "calendar",
            self.timeout,
            self.calendar
                .get_busy_times(&seller_link.calendar_id, booking.start, booking.end),
        )
        .await?;
        if busy.iter().any(|b| b.overlaps(booking.start, booking.end)) {
            return Err(conflict("The seller is no longer available at this time"));
        }

        let booked = self
            .repository
            .seller_booked_intervals(&booking.seller_uid, booking.start, booking.end)
            .await?;
        if !booked.is_empty() {
            return Err(conflict("This slot has already been booked"));
        }
        Ok(())
    }

    async fn create_event(&self, link: Option<&CalendarLink>, event: CalendarEvent) -> CalendarOutcome {
        let Some(link) = link else {
            return CalendarOutcome::Skipped;
        };
        match with_timeout(
            "calendar",
            self.timeout,
            self.calendar.create_event(&link.calendar_id, event),
        )
        .await
        {
            Ok(result) => CalendarOutcome::Created {
                event_id: result.event_id,
            },
            Err(e) => CalendarOutcome::Failed {
                message: e.to_string(),
            },
        }
    }
}
