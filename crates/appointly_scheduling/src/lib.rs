// --- File: crates/appointly_scheduling/src/lib.rs ---
// Declare modules within this crate
pub mod booking;
pub mod doc;
pub mod handlers;
pub mod logic;
#[cfg(test)]
mod logic_proptest;
#[cfg(test)]
mod logic_test;
pub mod models;
pub mod oauth;
pub mod repository;
pub mod routes;

pub use handlers::SchedulingState;
pub use routes::routes;
