use axum::{
    extract::{rejection::JsonRejection, Extension, Json, State},
    http::HeaderMap,
};
use tracing::{debug, info};

use shared_identity::{IdentityRecord, Session};
use shared_models::auth::{TokenResponse, User};
use shared_models::error::AppError;
use shared_utils::extractor::extract_bearer_token;
use shared_utils::jwt;
use shared_utils::validation::validate_email;

use crate::models::{LoginRequest, MagicLinkRequest, MagicLinkResponse, VerifyResponse};
use crate::state::AuthState;

pub async fn validate_token(
    State(state): State<AuthState>,
    headers: HeaderMap,
) -> Result<Json<TokenResponse>, AppError> {
    debug!("Validating token");

    let token = extract_bearer_token(&headers)?;

    let user = jwt::validate_token(&token, &state.config.supabase_jwt_secret)
        .map_err(|e| AppError::Auth(e.to_string()))?;

    Ok(Json(TokenResponse {
        valid: true,
        user_id: user.id,
        email: user.email,
        role: user.role,
    }))
}

/// Like [`validate_token`] but reports a bad token as `valid: false`.
pub async fn verify_token(
    State(state): State<AuthState>,
    headers: HeaderMap,
) -> Result<Json<VerifyResponse>, AppError> {
    debug!("Verifying token");

    let token = extract_bearer_token(&headers)?;
    let valid = jwt::validate_token(&token, &state.config.supabase_jwt_secret).is_ok();

    Ok(Json(VerifyResponse { valid }))
}

pub async fn login(
    State(state): State<AuthState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<Session>, AppError> {
    let Json(request) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let email = validate_email(request.email.as_deref())?;
    let password = request
        .password
        .filter(|p| !p.is_empty())
        .ok_or_else(|| AppError::BadRequest("Password is required".to_string()))?;

    let session = state.identity.sign_in_with_password(&email, &password).await?;

    info!("User signed in: {}", session.user.id);
    Ok(Json(session))
}

/// Passwordless sign-in. The redirect must stay on the portal's own site.
pub async fn send_magic_link(
    State(state): State<AuthState>,
    payload: Result<Json<MagicLinkRequest>, JsonRejection>,
) -> Result<Json<MagicLinkResponse>, AppError> {
    let Json(request) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let email = validate_email(request.email.as_deref())?;
    let site_url = state.config.site_url.trim_end_matches('/');

    let redirect_to = match request.redirect_to {
        Some(target) if target == site_url || target.starts_with(&format!("{}/", site_url)) => target,
        Some(target) => {
            return Err(AppError::BadRequest(format!("Redirect not allowed: {}", target)));
        }
        None => site_url.to_string(),
    };

    state.identity.send_magic_link(&email, &redirect_to).await?;

    info!("Magic link sent to {}", email);
    Ok(Json(MagicLinkResponse { sent: true }))
}

pub async fn get_session(
    State(state): State<AuthState>,
    Extension(user): Extension<User>,
    headers: HeaderMap,
) -> Result<Json<IdentityRecord>, AppError> {
    debug!("Getting session for user: {}", user.id);

    let token = extract_bearer_token(&headers)?;
    let record = state.identity.get_user(&token).await?;

    Ok(Json(record))
}
