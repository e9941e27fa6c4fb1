// File: crates/appointly_scheduling/src/doc.rs

#![cfg(feature = "openapi")]
use utoipa::OpenApi;

use crate::logic::Slot;
use crate::models::{
    AppointmentsResponse, AvailabilityResponse, AvailabilitySettings, Booking,
    BookingCreatedResponse, BookingRecord, BookingStatus, CalendarOutcome, ConnectResponse,
    CreateBookingRequest, SellerProfile, SellerSummary, SellersResponse, SetRoleRequest,
    UserProfile, WorkingHoursSettings,
};
use appointly_common::models::Role;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::health_handler,
        crate::handlers::list_sellers_handler,
        crate::handlers::get_seller_handler,
        crate::handlers::set_availability_handler,
        crate::handlers::get_me_handler,
        crate::handlers::set_role_handler,
        crate::handlers::get_availability_handler,
        crate::handlers::list_appointments_handler,
        crate::handlers::create_appointment_handler,
        crate::handlers::google_connect_handler,
        crate::handlers::google_callback_handler
    ),
    components(
        schemas(
            Slot,
            Role,
            WorkingHoursSettings,
            AvailabilitySettings,
            AvailabilityResponse,
            SellerProfile,
            SellerSummary,
            SellersResponse,
            UserProfile,
            SetRoleRequest,
            CreateBookingRequest,
            BookingStatus,
            BookingRecord,
            Booking,
            CalendarOutcome,
            BookingCreatedResponse,
            AppointmentsResponse,
            ConnectResponse
        )
    ),
    tags(
        (name = "Sellers", description = "Seller directory and availability settings"),
        (name = "Users", description = "Caller profile and role"),
        (name = "Availability", description = "Open slots of a seller"),
        (name = "Appointments", description = "Booking and listing appointments"),
        (name = "Calendar", description = "Linking a seller's Google Calendar"),
        (name = "Health", description = "Liveness")
    ),
    servers(
        (url = "/api", description = "Appointly API")
    )
)]
pub struct SchedulingApiDoc;
