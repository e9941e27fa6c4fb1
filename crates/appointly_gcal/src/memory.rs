// --- File: crates/appointly_gcal/src/memory.rs ---
//! In-process calendar used when Google Calendar is disabled and in tests.

use appointly_common::models::BusyInterval;
use appointly_common::services::{
    BoxFuture, CalendarEvent, CalendarEventResult, CalendarService, ServiceError,
};
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use tracing::debug;

#[derive(Default)]
struct Calendars {
    busy: HashMap<String, Vec<BusyInterval>>,
    events: HashMap<String, Vec<(String, CalendarEvent)>>,
    failing: HashSet<String>,
}

/// A calendar provider backed by a map of calendar id to events.
///
/// Created events occupy their interval, so a later insert over the same
/// interval is rejected like a real calendar conflict.
#[derive(Default)]
pub struct MemoryCalendarService {
    state: Mutex<Calendars>,
}

impl MemoryCalendarService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `calendar_id` busy over `[start, end)` without creating an event.
    pub fn add_busy(&self, calendar_id: &str, start: DateTime<Utc>, end: DateTime<Utc>) {
        if let Ok(mut state) = self.state.lock() {
            state
                .busy
                .entry(calendar_id.to_string())
                .or_default()
                .push(BusyInterval::new(start, end));
        }
    }

    /// Makes every call against `calendar_id` fail.
    pub fn fail_calendar(&self, calendar_id: &str) {
        if let Ok(mut state) = self.state.lock() {
            state.failing.insert(calendar_id.to_string());
        }
    }

    /// Events created in `calendar_id`, in insertion order.
    pub fn events(&self, calendar_id: &str) -> Vec<CalendarEvent> {
        self.state
            .lock()
            .map(|state| {
                state
                    .events
                    .get(calendar_id)
                    .map(|events| events.iter().map(|(_, e)| e.clone()).collect())
                    .unwrap_or_default()
            })
            .unwrap_or_default()
    }

    fn busy_for(
        state: &Calendars,
        calendar_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Vec<BusyInterval> {
        let seeded = state.busy.get(calendar_id).into_iter().flatten().copied();
        let booked = state
            .events
            .get(calendar_id)
            .into_iter()
            .flatten()
            .map(|(_, e)| BusyInterval::new(e.start_time, e.end_time));

        let mut busy: Vec<BusyInterval> = seeded
            .chain(booked)
            .filter(|b| b.overlaps(start, end))
            .collect();
        busy.sort_by_key(|b| b.start);
        busy
    }
}

fn poisoned() -> ServiceError {
    ServiceError::failed("calendar", "memory calendar lock poisoned")
}

impl CalendarService for MemoryCalendarService {
    fn get_busy_times(
        &self,
        calendar_id: &str,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> BoxFuture<'_, Vec<BusyInterval>, ServiceError> {
        let calendar_id = calendar_id.to_string();
        Box::pin(async move {
            let state = self.state.lock().map_err(|_| poisoned())?;
            if state.failing.contains(&calendar_id) {
                return Err(ServiceError::failed(
                    "calendar",
                    format!("calendar {} is unavailable", calendar_id),
                ));
            }
            Ok(Self::busy_for(&state, &calendar_id, start_time, end_time))
        })
    }

    fn create_event(
        &self,
        calendar_id: &str,
        event: CalendarEvent,
    ) -> BoxFuture<'_, CalendarEventResult, ServiceError> {
        let calendar_id = calendar_id.to_string();
        Box::pin(async move {
            let mut state = self.state.lock().map_err(|_| poisoned())?;
            if state.failing.contains(&calendar_id) {
                return Err(ServiceError::failed(
                    "calendar",
                    format!("calendar {} is unavailable", calendar_id),
                ));
            }
            if event.end_time <= event.start_time {
                return Err(ServiceError::failed(
                    "calendar",
                    "End time must be after start time",
                ));
            }
            if !Self::busy_for(&state, &calendar_id, event.start_time, event.end_time).is_empty()
            {
                return Err(ServiceError::failed(
                    "calendar",
                    format!("{} already has an event in that interval", calendar_id),
                ));
            }

            let event_id = uuid::Uuid::new_v4().to_string();
            debug!("Created memory event {} in {}", event_id, calendar_id);
            state
                .events
                .entry(calendar_id)
                .or_default()
                .push((event_id.clone(), event));

            Ok(CalendarEventResult {
                event_id: Some(event_id),
                status: "confirmed".to_string(),
            })
        })
    }
}
