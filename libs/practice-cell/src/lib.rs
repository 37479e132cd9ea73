//! Adapter for the clinic's external practice-management system.
//!
//! The upstream speaks a JSON:API-like dialect where every record is an
//! attribute bag. This crate maps those bags onto typed patient and
//! appointment records and owns the ordered appointment lookup chain.

pub mod error;
pub mod mapping;
pub mod models;
pub mod services;

pub use error::PracticeError;
pub use models::{Appointment, PracticePatient};
pub use services::appointments::{
    AppointmentFilter, AppointmentLookup, AppointmentSource, DEFAULT_STRATEGIES,
};
pub use services::practice::PracticeClient;
