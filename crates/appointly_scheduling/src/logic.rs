// --- File: crates/appointly_scheduling/src/logic.rs ---
use appointly_common::models::BusyInterval;
use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Utc, Weekday};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

// --- Error Handling ---
use thiserror::Error;

/// Rejections for a seller's availability configuration.
///
/// The generator never sees an invalid config; these are raised when the
/// stored settings are turned into an [`AvailabilityConfig`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SlotConfigError {
    #[error("working hours start {start} must be before end {end}")]
    InvalidWorkingHours { start: NaiveTime, end: NaiveTime },
    #[error("working day {0} is not a weekday index (0 = Sunday .. 6 = Saturday)")]
    InvalidWeekday(i64),
    #[error("at least one working day is required")]
    NoWorkingDays,
    #[error("slot duration must be positive, got {0} minutes")]
    NonPositiveSlotDuration(i64),
    #[error("unknown time zone '{0}'")]
    UnknownTimeZone(String),
    #[error("cannot parse time '{0}', expected HH:MM")]
    InvalidTime(String),
    #[error("time window start {start} must be before end {end}")]
    InvalidWindow {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
}

// --- Data Structures ---

/// Half-open span `[start, end)` over which slots are searched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl TimeWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, SlotConfigError> {
        if start >= end {
            return Err(SlotConfigError::InvalidWindow { start, end });
        }
        Ok(Self { start, end })
    }

    /// `[now, now + days)`; `days` below one is treated as one.
    pub fn from_now(now: DateTime<Utc>, days: i64) -> Self {
        Self {
            start: now,
            end: now + Duration::days(days.max(1)),
        }
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }
}

/// A bookable appointment interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Slot {
    #[cfg_attr(feature = "openapi", schema(example = "2025-05-05T09:00:00Z"))]
    pub start: DateTime<Utc>,
    #[cfg_attr(feature = "openapi", schema(example = "2025-05-05T09:30:00Z"))]
    pub end: DateTime<Utc>,
}

/// Daily working hours in the seller's local time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkingHours {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl WorkingHours {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Result<Self, SlotConfigError> {
        if start >= end {
            return Err(SlotConfigError::InvalidWorkingHours { start, end });
        }
        Ok(Self { start, end })
    }

    /// Parses `"HH:MM"` (or `"HH:MM:SS"`) bounds.
    pub fn parse(start: &str, end: &str) -> Result<Self, SlotConfigError> {
        Self::new(parse_time(start)?, parse_time(end)?)
    }
}

impl fmt::Display for WorkingHours {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start.format("%H:%M"), self.end.format("%H:%M"))
    }
}

fn parse_time(value: &str) -> Result<NaiveTime, SlotConfigError> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
        .map_err(|_| SlotConfigError::InvalidTime(value.to_string()))
}

/// A validated availability configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct AvailabilityConfig {
    working_hours: WorkingHours,
    /// 0 = Sunday .. 6 = Saturday
    working_days: BTreeSet<u8>,
    slot_duration: Duration,
    time_zone: Tz,
}

impl AvailabilityConfig {
    pub fn new(
        working_hours: WorkingHours,
        working_days: impl IntoIterator<Item = i64>,
        slot_duration_minutes: i64,
        time_zone: Tz,
    ) -> Result<Self, SlotConfigError> {
        let working_days = working_days
            .into_iter()
            .map(|day| {
                u8::try_from(day)
                    .ok()
                    .filter(|d| *d <= 6)
                    .ok_or(SlotConfigError::InvalidWeekday(day))
            })
            .collect::<Result<BTreeSet<u8>, _>>()?;
        if working_days.is_empty() {
            return Err(SlotConfigError::NoWorkingDays);
        }
        if slot_duration_minutes <= 0 {
            return Err(SlotConfigError::NonPositiveSlotDuration(
                slot_duration_minutes,
            ));
        }
        Ok(Self {
            working_hours,
            working_days,
            slot_duration: Duration::minutes(slot_duration_minutes),
            time_zone,
        })
    }

    pub fn working_hours(&self) -> WorkingHours {
        self.working_hours
    }

    pub fn slot_duration(&self) -> Duration {
        self.slot_duration
    }

    pub fn time_zone(&self) -> Tz {
        self.time_zone
    }

    pub fn is_working_day(&self, weekday: Weekday) -> bool {
        let index = weekday.num_days_from_sunday() as u8;
        self.working_days.contains(&index)
    }

    /// The working-hours span of `day` as instants.
    ///
    /// `None` when a bound falls into a daylight-saving gap. An ambiguous
    /// bound resolves to its earlier instant.
    pub fn working_span(&self, day: NaiveDate) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let start = self
            .time_zone
            .from_local_datetime(&day.and_time(self.working_hours.start))
            .earliest()?;
        let end = self
            .time_zone
            .from_local_datetime(&day.and_time(self.working_hours.end))
            .earliest()?;
        Some((start.with_timezone(&Utc), end.with_timezone(&Utc)))
    }
}

/// Parses an IANA time zone name.
pub fn parse_time_zone(name: &str) -> Result<Tz, SlotConfigError> {
    name.parse::<Tz>()
        .map_err(|_| SlotConfigError::UnknownTimeZone(name.to_string()))
}

// --- Availability Logic ---

/// Sorts busy intervals and merges overlapping or touching ones.
///
/// Inverted intervals (end before start) are dropped.
pub fn merge_busy_periods(busy: &[BusyInterval]) -> Vec<BusyInterval> {
    let mut sorted: Vec<BusyInterval> = busy.iter().copied().filter(|b| b.start <= b.end).collect();
    sorted.sort_by_key(|b| b.start);

    let mut merged: Vec<BusyInterval> = Vec::with_capacity(sorted.len());
    for interval in sorted {
        match merged.last_mut() {
            Some(last) if interval.start <= last.end => {
                last.end = last.end.max(interval.end);
            }
            _ => merged.push(interval),
        }
    }
    merged
}

/// Computes the open slots of `config` within `window`.
///
/// Walks every local calendar day the window touches. On working days the
/// working-hours span is cut into `slot_duration` pieces from its start; a
/// trailing piece shorter than the duration is dropped. A candidate survives
/// when it starts at or after `now`, lies inside the window and does not
/// strictly intersect any busy interval (touching endpoints are free).
///
/// The result is chronological and uncapped.
pub fn generate_slots(
    window: &TimeWindow,
    config: &AvailabilityConfig,
    busy: &[BusyInterval],
    now: DateTime<Utc>,
) -> Vec<Slot> {
    let busy = merge_busy_periods(busy);
    let tz = config.time_zone;
    let first_day = window.start.with_timezone(&tz).date_naive();
    let last_day = window.end.with_timezone(&tz).date_naive();

    let mut slots = Vec::new();
    // candidates come out in order, so busy intervals ending before the
    // current candidate never matter again
    let mut next_busy = 0;

    for day in first_day.iter_days().take_while(|d| *d <= last_day) {
        if !config.is_working_day(day.weekday()) {
            continue;
        }
        let Some((span_start, span_end)) = config.working_span(day) else {
            continue;
        };

        let mut start = span_start;
        while start + config.slot_duration <= span_end {
            let end = start + config.slot_duration;
            if start >= now && start >= window.start && end <= window.end {
                while next_busy < busy.len() && busy[next_busy].end <= start {
                    next_busy += 1;
                }
                let blocked = busy[next_busy..]
                    .iter()
                    .take_while(|b| b.start < end)
                    .any(|b| b.overlaps(start, end));
                if !blocked {
                    slots.push(Slot { start, end });
                }
            }
            start = end;
        }
    }
    slots
}

/// Whether `slot` is one of the slots `config` offers at `now`, ignoring
/// busy time.
pub fn is_offered(config: &AvailabilityConfig, slot: Slot, now: DateTime<Utc>) -> bool {
    match TimeWindow::new(slot.start, slot.end) {
        Ok(window) => generate_slots(&window, config, &[], now) == [slot],
        Err(_) => false,
    }
}
