use thiserror::Error;

use shared_http::ApiError;
use shared_models::error::AppError;

#[derive(Error, Debug)]
pub enum PracticeError {
    #[error("Practice management API is not configured")]
    NotConfigured,

    #[error("No patient registered with email {0}")]
    PatientNotFound(String),

    #[error("Practice management API error: {0}")]
    Upstream(#[from] ApiError),
}

impl From<PracticeError> for AppError {
    fn from(err: PracticeError) -> Self {
        match err {
            PracticeError::PatientNotFound(_) => AppError::NotInSystem(err.to_string()),
            PracticeError::NotConfigured => AppError::Internal(err.to_string()),
            PracticeError::Upstream(e) => AppError::ExternalService(e.to_string()),
        }
    }
}
