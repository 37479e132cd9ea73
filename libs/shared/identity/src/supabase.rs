use serde_json::{json, Value};
use thiserror::Error;
use tracing::debug;

use shared_config::AppConfig;
use shared_http::{ApiClient, ApiError, Method, RetryPolicy};
use shared_models::error::AppError;

use crate::models::{IdentityMetadata, IdentityRecord, Session};

#[derive(Error, Debug)]
pub enum IdentityError {
    #[error("Auth provider is not configured")]
    NotConfigured,

    #[error("Invalid credentials or session")]
    Unauthorized,

    #[error("Auth provider error: {0}")]
    Upstream(#[from] ApiError),
}

impl From<IdentityError> for AppError {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::Unauthorized => AppError::Auth(err.to_string()),
            IdentityError::NotConfigured => AppError::Internal(err.to_string()),
            IdentityError::Upstream(e) => AppError::ExternalService(e.to_string()),
        }
    }
}

/// Client for the Supabase Auth REST API, which owns identity records.
#[derive(Debug, Clone)]
pub struct SupabaseClient {
    api: ApiClient,
}

impl SupabaseClient {
    pub fn new(config: &AppConfig) -> Result<Self, IdentityError> {
        if config.supabase_url.is_empty() {
            return Err(IdentityError::NotConfigured);
        }

        let api = ApiClient::with_timeout(
            config.supabase_url.clone(),
            RetryPolicy::from_config(config),
            config.http_timeout(),
        )?
        .with_header("apikey", &config.supabase_anon_key)?;

        Ok(Self { api })
    }

    pub fn get_base_url(&self) -> &str {
        self.api.base_url()
    }

    /// Fetches the identity record behind an access token.
    pub async fn get_user(&self, auth_token: &str) -> Result<IdentityRecord, IdentityError> {
        debug!("Fetching identity record");

        self.api
            .get("/auth/v1/user", &[], Some(auth_token))
            .await
            .map_err(map_auth_failure)
    }

    /// Replaces the caller's `user_metadata` with `metadata`.
    pub async fn update_user_metadata(
        &self,
        auth_token: &str,
        metadata: &IdentityMetadata,
    ) -> Result<IdentityRecord, IdentityError> {
        debug!("Updating identity metadata");

        let body = json!({ "data": metadata });

        self.api
            .put("/auth/v1/user", &body, Some(auth_token))
            .await
            .map_err(map_auth_failure)
    }

    pub async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, IdentityError> {
        debug!("Password sign-in for {}", email);

        let body = json!({
            "email": email,
            "password": password,
        });

        self.api
            .post("/auth/v1/token?grant_type=password", &body, None)
            .await
            .map_err(|e| match e.status() {
                Some(400) | Some(401) => IdentityError::Unauthorized,
                _ => IdentityError::Upstream(e),
            })
    }

    /// Sends a passwordless sign-in link. Only existing accounts receive one.
    /// The provider reads the redirect target from the `redirect_to` query
    /// parameter, not from the body.
    pub async fn send_magic_link(
        &self,
        email: &str,
        redirect_to: &str,
    ) -> Result<(), IdentityError> {
        debug!("Sending magic link to {}", email);

        let body = json!({
            "email": email,
            "create_user": false,
        });

        let _: Value = self
            .api
            .request(
                Method::POST,
                "/auth/v1/otp",
                &[("redirect_to", redirect_to)],
                Some(&body),
                None,
            )
            .await?;
        Ok(())
    }
}

fn map_auth_failure(err: ApiError) -> IdentityError {
    if err.is_auth_failure() {
        IdentityError::Unauthorized
    } else {
        IdentityError::Upstream(err)
    }
}
