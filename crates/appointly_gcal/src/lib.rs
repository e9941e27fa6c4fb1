// --- File: crates/appointly_gcal/src/lib.rs ---
// Declare modules within this crate
pub mod auth;
pub mod memory;
pub mod service;

pub use auth::{create_calendar_hub, HubType};
pub use memory::MemoryCalendarService;
pub use service::{GcalServiceError, GoogleCalendarService};
