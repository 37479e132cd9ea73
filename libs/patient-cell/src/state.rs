use std::sync::Arc;

use practice_cell::PracticeClient;
use shared_config::AppConfig;
use shared_identity::SupabaseClient;

/// Upstream clients shared by every patient route. Built once at startup.
#[derive(Clone)]
pub struct PatientState {
    pub config: Arc<AppConfig>,
    pub identity: Arc<SupabaseClient>,
    pub practice: Arc<PracticeClient>,
}

impl PatientState {
    pub fn new(
        config: Arc<AppConfig>,
        identity: Arc<SupabaseClient>,
        practice: Arc<PracticeClient>,
    ) -> Self {
        Self {
            config,
            identity,
            practice,
        }
    }
}
