use std::sync::Arc;

use shared_config::AppConfig;
use shared_identity::SupabaseClient;

#[derive(Clone)]
pub struct AuthState {
    pub config: Arc<AppConfig>,
    pub identity: Arc<SupabaseClient>,
}

impl AuthState {
    pub fn new(config: Arc<AppConfig>, identity: Arc<SupabaseClient>) -> Self {
        Self { config, identity }
    }
}
