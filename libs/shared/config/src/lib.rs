use std::env;
use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

/// How appointment lookups combine results from their fallback strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AppointmentSelection {
    /// Stop at the first strategy that yields at least one appointment.
    #[default]
    FirstNonEmpty,
    /// Run every strategy and keep the first occurrence of each appointment id.
    Merge,
}

impl FromStr for AppointmentSelection {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "first_non_empty" | "first-non-empty" | "first" => Ok(Self::FirstNonEmpty),
            "merge" | "merge_dedup" | "merge-dedup" => Ok(Self::Merge),
            other => Err(format!("unknown appointment selection policy: {}", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub supabase_jwt_secret: String,
    pub practice_api_url: String,
    pub practice_api_token: String,
    pub http_max_retries: u32,
    pub http_retry_base_ms: u64,
    pub http_retry_max_ms: u64,
    pub http_retry_jitter_ms: u64,
    pub http_timeout_secs: u64,
    pub appointment_selection: AppointmentSelection,
    pub site_url: String,
    pub port: u16,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            supabase_url: String::new(),
            supabase_anon_key: String::new(),
            supabase_jwt_secret: String::new(),
            practice_api_url: String::new(),
            practice_api_token: String::new(),
            http_max_retries: 3,
            http_retry_base_ms: 500,
            http_retry_max_ms: 8_000,
            http_retry_jitter_ms: 250,
            http_timeout_secs: 30,
            appointment_selection: AppointmentSelection::FirstNonEmpty,
            site_url: "http://localhost:3000".to_string(),
            port: 3000,
        }
    }
}

fn required(key: &str) -> String {
    env::var(key).unwrap_or_else(|_| {
        warn!("{} not set, using empty value", key);
        String::new()
    })
}

fn parsed<T: FromStr + ToString>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            warn!("{} has invalid value {:?}, using default {}", key, raw, default.to_string());
            default
        }),
        Err(_) => default,
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let appointment_selection = match env::var("APPOINTMENT_SELECTION") {
            Ok(raw) => raw.parse().unwrap_or_else(|e: String| {
                warn!("{}, falling back to first_non_empty", e);
                AppointmentSelection::FirstNonEmpty
            }),
            Err(_) => defaults.appointment_selection,
        };

        let config = Self {
            supabase_url: required("SUPABASE_URL"),
            supabase_anon_key: required("SUPABASE_ANON_PUBLIC_KEY"),
            supabase_jwt_secret: required("SUPABASE_JWT_SECRET"),
            practice_api_url: required("PRACTICE_API_URL"),
            practice_api_token: required("PRACTICE_API_TOKEN"),
            http_max_retries: parsed("HTTP_MAX_RETRIES", defaults.http_max_retries),
            http_retry_base_ms: parsed("HTTP_RETRY_BASE_MS", defaults.http_retry_base_ms),
            http_retry_max_ms: parsed("HTTP_RETRY_MAX_MS", defaults.http_retry_max_ms),
            http_retry_jitter_ms: parsed("HTTP_RETRY_JITTER_MS", defaults.http_retry_jitter_ms),
            http_timeout_secs: parsed("HTTP_TIMEOUT_SECS", defaults.http_timeout_secs),
            appointment_selection,
            site_url: env::var("SITE_URL").unwrap_or_else(|_| {
                warn!("SITE_URL not set, using default");
                defaults.site_url.clone()
            }),
            port: parsed("PORT", defaults.port),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        if !config.is_practice_configured() {
            warn!("Practice management API not configured - patient lookups will fail");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.supabase_url.is_empty()
            && !self.supabase_anon_key.is_empty()
            && !self.supabase_jwt_secret.is_empty()
    }

    pub fn is_practice_configured(&self) -> bool {
        !self.practice_api_url.is_empty() && !self.practice_api_token.is_empty()
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selection_parsing() {
        assert_eq!("merge".parse::<AppointmentSelection>(), Ok(AppointmentSelection::Merge));
        assert_eq!(
            "FIRST_NON_EMPTY".parse::<AppointmentSelection>(),
            Ok(AppointmentSelection::FirstNonEmpty)
        );
        assert!("random".parse::<AppointmentSelection>().is_err());
    }

    #[test]
    fn test_default_config_is_not_configured() {
        let config = AppConfig::default();
        assert!(!config.is_configured());
        assert!(!config.is_practice_configured());
        assert_eq!(config.http_max_retries, 3);
        assert_eq!(config.http_timeout(), Duration::from_secs(30));
    }
}
