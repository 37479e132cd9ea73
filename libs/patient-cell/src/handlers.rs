use axum::{
    extract::{rejection::JsonRejection, Extension, State},
    Json,
};
use axum_extra::TypedHeader;
use chrono::Local;
use headers::{authorization::Bearer, Authorization};
use tracing::{debug, info, warn};

use practice_cell::{
    models::sort_chronologically, AppointmentFilter, AppointmentLookup, DEFAULT_STRATEGIES,
};
use shared_identity::IdentityError;
use shared_models::auth::User;
use shared_models::error::AppError;
use shared_utils::validation::validate_email;

use crate::models::{
    AppointmentsResponse, ProfileView, UpdateProfileRequest, VerifyPatientRequest,
    VerifyPatientResponse,
};
use crate::services::reconcile::{apply_update, identity_from_claims, reconcile};
use crate::state::PatientState;

fn session_email(user: &User) -> Result<String, AppError> {
    user.session_email()
        .map(str::to_string)
        .ok_or_else(|| AppError::BadRequest("Session has no email address".to_string()))
}

/// Public check used during sign-up: is this email registered at the clinic?
pub async fn verify_patient(
    State(state): State<PatientState>,
    payload: Result<Json<VerifyPatientRequest>, JsonRejection>,
) -> Result<Json<VerifyPatientResponse>, AppError> {
    let Json(request) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let email = validate_email(request.email.as_deref())?;

    debug!("Verifying patient {}", email);

    let patient = state
        .practice
        .verify_patient(&email)
        .await?
        .ok_or_else(|| AppError::NotInSystem(format!("No patient registered with email {}", email)))?;

    Ok(Json(VerifyPatientResponse {
        found: true,
        patient: (&patient).into(),
    }))
}

pub async fn get_profile(
    State(state): State<PatientState>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<ProfileView>, AppError> {
    debug!("Building profile for user: {}", user.id);

    let (identity, fresh) = match state.identity.get_user(auth.token()).await {
        Ok(record) => (record, true),
        Err(IdentityError::Unauthorized) => {
            return Err(AppError::Auth("Session rejected by auth provider".to_string()))
        }
        Err(e) => {
            warn!("Auth provider unavailable, using token claims for {}: {}", user.id, e);
            (identity_from_claims(&user), false)
        }
    };

    let email = if identity.email.is_empty() {
        session_email(&user)?
    } else {
        identity.email.clone()
    };

    let practice = match state.practice.verify_patient(&email).await {
        Ok(patient) => patient,
        Err(e) => {
            warn!("Practice lookup failed for {}, serving identity data only: {}", email, e);
            None
        }
    };

    Ok(Json(reconcile(&identity, practice.as_ref(), fresh)))
}

/// Writes profile edits to the identity record only; the practice record is read-only.
pub async fn update_profile(
    State(state): State<PatientState>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    payload: Result<Json<UpdateProfileRequest>, JsonRejection>,
) -> Result<Json<ProfileView>, AppError> {
    let Json(update) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let current = state.identity.get_user(auth.token()).await?;
    let metadata = apply_update(&current.user_metadata, update)?;

    let updated = state
        .identity
        .update_user_metadata(auth.token(), &metadata)
        .await?;

    info!("Updated profile metadata for user: {}", user.id);

    let practice = match state.practice.verify_patient(&updated.email).await {
        Ok(patient) => patient,
        Err(e) => {
            warn!("Practice lookup failed after profile update for {}: {}", user.id, e);
            None
        }
    };

    Ok(Json(reconcile(&updated, practice.as_ref(), true)))
}

async fn lookup_for_session(
    state: &PatientState,
    user: &User,
    filter: AppointmentFilter,
) -> Result<AppointmentLookup, AppError> {
    let email = session_email(user)?;

    let (patient, mut lookup) = state
        .practice
        .lookup_appointments(
            &email,
            &DEFAULT_STRATEGIES,
            state.config.appointment_selection,
            filter,
        )
        .await?;

    if lookup.is_empty() {
        debug!("No appointments found for practice patient {}", patient.id);
    }

    sort_chronologically(&mut lookup.appointments);
    Ok(lookup)
}

fn into_response(lookup: AppointmentLookup) -> AppointmentsResponse {
    AppointmentsResponse {
        total: lookup.appointments.len(),
        appointments: lookup.appointments,
        sources: lookup.sources,
        failed_sources: lookup.failed,
    }
}

pub async fn list_appointments(
    State(state): State<PatientState>,
    Extension(user): Extension<User>,
) -> Result<Json<AppointmentsResponse>, AppError> {
    let lookup = lookup_for_session(&state, &user, AppointmentFilter::All).await?;
    Ok(Json(into_response(lookup)))
}

pub async fn list_upcoming_appointments(
    State(state): State<PatientState>,
    Extension(user): Extension<User>,
) -> Result<Json<AppointmentsResponse>, AppError> {
    let filter = AppointmentFilter::UpcomingFrom(Local::now().naive_local());
    let lookup = lookup_for_session(&state, &user, filter).await?;

    Ok(Json(into_response(lookup)))
}
