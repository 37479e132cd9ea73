use axum::{routing::get, Router};

use auth_cell::{auth_routes, AuthState};
use patient_cell::{patient_routes, PatientState};

pub fn create_router(auth: AuthState, patients: PatientState) -> Router {
    Router::new()
        .route("/", get(|| async { "Tandvård patient portal API is running!" }))
        .nest("/auth", auth_routes(auth))
        .nest("/patients", patient_routes(patients))
}
