use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use shared_utils::extractor::auth_middleware;

use crate::handlers;
use crate::state::PatientState;

pub fn patient_routes(state: PatientState) -> Router {
    let public_routes = Router::new().route("/verify", post(handlers::verify_patient));

    let protected_routes = Router::new()
        .route(
            "/profile",
            get(handlers::get_profile).put(handlers::update_profile),
        )
        .route("/appointments", get(handlers::list_appointments))
        .route(
            "/appointments/upcoming",
            get(handlers::list_upcoming_appointments),
        )
        .layer(middleware::from_fn_with_state(
            state.config.clone(),
            auth_middleware,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}
