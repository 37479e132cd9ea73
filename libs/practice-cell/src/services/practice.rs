use tracing::{debug, info, warn};

use shared_config::{AppConfig, AppointmentSelection};
use shared_http::{ApiClient, RetryPolicy};

use crate::error::PracticeError;
use crate::mapping::{map_appointment, map_patient, PATIENT_FIELDS};
use crate::models::{Appointment, Document, PracticePatient};
use crate::services::appointments::{AppointmentFilter, AppointmentLookup, AppointmentSource};

const APPOINTMENT_TYPE: &str = "appointments";

/// Client for the external practice-management API. Read-only: nothing in
/// this system writes patient or appointment data back upstream.
#[derive(Debug, Clone)]
pub struct PracticeClient {
    api: ApiClient,
    api_token: String,
}

impl PracticeClient {
    pub fn new(config: &AppConfig) -> Result<Self, PracticeError> {
        if !config.is_practice_configured() {
            return Err(PracticeError::NotConfigured);
        }

        let api = ApiClient::with_timeout(
            config.practice_api_url.clone(),
            RetryPolicy::from_config(config),
            config.http_timeout(),
        )?
        .with_header("accept", "application/vnd.api+json, application/json")?;

        Ok(Self {
            api,
            api_token: config.practice_api_token.clone(),
        })
    }

    async fn fetch(&self, path: &str, query: &[(&str, &str)]) -> Result<Document, PracticeError> {
        Ok(self.api.get(path, query, Some(&self.api_token)).await?)
    }

    /// Finds the patient whose email attribute equals `email` exactly.
    ///
    /// The search endpoint may return loose matches, so results are scanned in
    /// upstream order and the first exact match wins. No case folding.
    pub async fn verify_patient(&self, email: &str) -> Result<Option<PracticePatient>, PracticeError> {
        debug!("Looking up practice record for {}", email);

        let document = self
            .fetch("/patients", &[("filter[email]", email), ("include", APPOINTMENT_TYPE)])
            .await?;

        let Some(resource) = document
            .resources()
            .into_iter()
            .find(|r| r.attributes.raw_str(PATIENT_FIELDS.email) == Some(email))
        else {
            info!("No practice record matches {}", email);
            return Ok(None);
        };

        let mut patient = map_patient(resource);
        patient.appointments = document
            .included_for(APPOINTMENT_TYPE, &resource.id)
            .map(map_appointment)
            .collect();

        debug!(
            "Matched practice patient {} with {} embedded appointments",
            patient.id,
            patient.appointments.len()
        );
        Ok(Some(patient))
    }

    pub async fn get_patient(&self, email: &str) -> Result<PracticePatient, PracticeError> {
        self.verify_patient(email)
            .await?
            .ok_or_else(|| PracticeError::PatientNotFound(email.to_string()))
    }

    pub async fn get_appointments(&self, patient_id: &str) -> Result<Vec<Appointment>, PracticeError> {
        let path = format!("/patients/{}/appointments", urlencoding::encode(patient_id));
        let document = self.fetch(&path, &[]).await?;
        Ok(appointments_of(&document))
    }

    pub async fn get_appointments_direct(
        &self,
        patient_id: &str,
    ) -> Result<Vec<Appointment>, PracticeError> {
        let document = self
            .fetch("/appointments", &[("filter[patient_id]", patient_id)])
            .await?;
        Ok(appointments_of(&document))
    }

    pub async fn get_upcoming_appointments(
        &self,
        patient_id: &str,
    ) -> Result<Vec<Appointment>, PracticeError> {
        let document = self
            .fetch("/appointments/upcoming", &[("patient_id", patient_id)])
            .await?;
        Ok(appointments_of(&document))
    }

    async fn run_strategy(
        &self,
        source: AppointmentSource,
        patient: &PracticePatient,
    ) -> Result<Vec<Appointment>, PracticeError> {
        match source {
            AppointmentSource::Embedded => Ok(patient.appointments.clone()),
            AppointmentSource::PatientAppointments => self.get_appointments(&patient.id).await,
            AppointmentSource::DirectEndpoint => self.get_appointments_direct(&patient.id).await,
            AppointmentSource::Upcoming => self.get_upcoming_appointments(&patient.id).await,
        }
    }

    /// Walks `strategies` in order. A failing strategy is logged and skipped;
    /// `policy` decides whether the first non-empty result ends the walk.
    /// `filter` runs on each strategy's result before that decision.
    pub async fn resolve_appointments(
        &self,
        patient: &PracticePatient,
        strategies: &[AppointmentSource],
        policy: AppointmentSelection,
        filter: AppointmentFilter,
    ) -> AppointmentLookup {
        let mut lookup = AppointmentLookup::default();

        for &source in strategies {
            match self.run_strategy(source, patient).await {
                Ok(mut appointments) => {
                    let fetched = appointments.len();
                    appointments.retain(|a| filter.keeps(a));
                    debug!(
                        "Strategy {} returned {} appointments ({} kept) for patient {}",
                        source.name(),
                        fetched,
                        appointments.len(),
                        patient.id
                    );
                    if lookup.absorb(source, appointments, policy) {
                        break;
                    }
                }
                Err(e) => {
                    warn!("Strategy {} failed for patient {}: {}", source.name(), patient.id, e);
                    lookup.record_failure(source);
                }
            }
        }

        lookup
    }

    /// Patient lookup followed by [`PracticeClient::resolve_appointments`].
    pub async fn lookup_appointments(
        &self,
        email: &str,
        strategies: &[AppointmentSource],
        policy: AppointmentSelection,
        filter: AppointmentFilter,
    ) -> Result<(PracticePatient, AppointmentLookup), PracticeError> {
        let patient = self.get_patient(email).await?;
        let lookup = self.resolve_appointments(&patient, strategies, policy, filter).await;
        Ok((patient, lookup))
    }
}

fn appointments_of(document: &Document) -> Vec<Appointment> {
    document
        .resources()
        .into_iter()
        .filter(|r| r.kind.is_empty() || r.kind == APPOINTMENT_TYPE)
        .map(map_appointment)
        .collect()
}
