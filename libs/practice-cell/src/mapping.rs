//! Field-name tables between the practice API's attribute bags and our records.
//!
//! Each internal field lists the external attribute keys it may arrive under,
//! in order of preference. A field whose keys are all absent or null maps to
//! an empty string, or 0 for durations.

use crate::models::{Appointment, PracticePatient, Resource};

#[derive(Debug, Clone, Copy)]
pub struct PatientFields {
    pub first_name: &'static [&'static str],
    pub last_name: &'static [&'static str],
    pub email: &'static [&'static str],
    pub phone: &'static [&'static str],
    pub street_address: &'static [&'static str],
    pub postal_code: &'static [&'static str],
    pub city: &'static [&'static str],
}

pub const PATIENT_FIELDS: PatientFields = PatientFields {
    first_name: &["first-name", "firstname", "given-name"],
    last_name: &["last-name", "lastname", "family-name"],
    email: &["email", "email-address"],
    phone: &["phone-number", "mobile-phone", "phone"],
    street_address: &["street-address", "address-line-1", "address"],
    postal_code: &["postal-code", "zip-code"],
    city: &["city", "postal-town"],
};

#[derive(Debug, Clone, Copy)]
pub struct AppointmentFields {
    pub date: &'static [&'static str],
    pub time: &'static [&'static str],
    pub duration_minutes: &'static [&'static str],
    pub clinician: &'static [&'static str],
    pub location: &'static [&'static str],
    pub status: &'static [&'static str],
}

pub const APPOINTMENT_FIELDS: AppointmentFields = AppointmentFields {
    date: &["date", "start-date", "starts-at"],
    time: &["start-time", "time"],
    duration_minutes: &["duration", "length-minutes"],
    clinician: &["practitioner-name", "clinician-name", "clinician"],
    location: &["clinic-name", "location-name", "location"],
    status: &["status", "state"],
};

pub fn map_patient(resource: &Resource) -> PracticePatient {
    let attrs = &resource.attributes;
    let fields = PATIENT_FIELDS;

    PracticePatient {
        id: resource.id.clone(),
        first_name: attrs.text(fields.first_name),
        last_name: attrs.text(fields.last_name),
        email: attrs.text(fields.email),
        phone: attrs.text(fields.phone),
        street_address: attrs.text(fields.street_address),
        postal_code: attrs.text(fields.postal_code),
        city: attrs.text(fields.city),
        appointments: Vec::new(),
    }
}

pub fn map_appointment(resource: &Resource) -> Appointment {
    let attrs = &resource.attributes;
    let fields = APPOINTMENT_FIELDS;

    Appointment {
        id: resource.id.clone(),
        date: attrs.text(fields.date),
        time: attrs.text(fields.time),
        duration_minutes: attrs.count(fields.duration_minutes),
        clinician: attrs.text(fields.clinician),
        location: attrs.text(fields.location),
        status: attrs.text(fields.status),
    }
}
