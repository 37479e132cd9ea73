use serde::{Deserialize, Serialize};

use practice_cell::{Appointment, AppointmentSource, PracticePatient};
use shared_identity::{Locale, NotificationPrefs};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyPatientRequest {
    pub email: Option<String>,
}

/// What the public verify route discloses about a matched patient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerifiedPatient {
    pub patient_id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

impl From<&PracticePatient> for VerifiedPatient {
    fn from(patient: &PracticePatient) -> Self {
        Self {
            patient_id: patient.id.clone(),
            first_name: patient.first_name.clone(),
            last_name: patient.last_name.clone(),
            email: patient.email.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerifyPatientResponse {
    pub found: bool,
    pub patient: VerifiedPatient,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateProfileRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub street_address: Option<String>,
    pub postal_code: Option<String>,
    pub city: Option<String>,
    pub locale: Option<String>,
    pub notifications: Option<NotificationPrefs>,
}

/// Which upstream records fed a [`ProfileView`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileSources {
    /// False when the auth provider was unreachable and token claims were used.
    pub identity: bool,
    pub practice: bool,
}

/// Per-request merge of the identity and practice records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileView {
    pub user_id: String,
    pub email: String,
    pub practice_patient_id: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub street_address: String,
    pub postal_code: String,
    pub city: String,
    pub locale: Locale,
    pub notifications: NotificationPrefs,
    pub sources: ProfileSources,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppointmentsResponse {
    pub appointments: Vec<Appointment>,
    pub total: usize,
    pub sources: Vec<AppointmentSource>,
    pub failed_sources: Vec<AppointmentSource>,
}
