use std::sync::Arc;

use base64::{engine::general_purpose, Engine as _};
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use serde_json::{json, Value};
use sha2::Sha256;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::User;

pub struct TestConfig {
    pub jwt_secret: String,
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub practice_api_url: String,
    pub practice_api_token: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "test-secret-key-for-jwt-validation-must-be-long-enough".to_string(),
            supabase_url: "http://localhost:54321".to_string(),
            supabase_anon_key: "test-anon-key".to_string(),
            practice_api_url: "http://localhost:54322".to_string(),
            practice_api_token: "test-practice-token".to_string(),
        }
    }
}

impl TestConfig {
    /// Points both upstreams at mock servers.
    pub fn with_upstreams(supabase_url: &str, practice_api_url: &str) -> Self {
        Self {
            supabase_url: supabase_url.to_string(),
            practice_api_url: practice_api_url.to_string(),
            ..Self::default()
        }
    }

    /// Retries are kept but delays shrink to a few milliseconds.
    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            supabase_url: self.supabase_url.clone(),
            supabase_anon_key: self.supabase_anon_key.clone(),
            supabase_jwt_secret: self.jwt_secret.clone(),
            practice_api_url: self.practice_api_url.clone(),
            practice_api_token: self.practice_api_token.clone(),
            http_max_retries: 2,
            http_retry_base_ms: 1,
            http_retry_max_ms: 5,
            http_retry_jitter_ms: 1,
            http_timeout_secs: 5,
            ..AppConfig::default()
        }
    }

    pub fn to_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.to_app_config())
    }
}

pub struct TestUser {
    pub id: String,
    pub email: String,
    pub role: String,
}

impl Default for TestUser {
    fn default() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            email: "test@example.com".to_string(),
            role: "authenticated".to_string(),
        }
    }
}

impl TestUser {
    pub fn new(email: &str, role: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            email: email.to_string(),
            role: role.to_string(),
        }
    }

    pub fn patient(email: &str) -> Self {
        Self::new(email, "authenticated")
    }

    pub fn to_user(&self) -> User {
        User {
            id: self.id.clone(),
            email: Some(self.email.clone()),
            role: Some(self.role.clone()),
            metadata: None,
            created_at: Some(Utc::now()),
        }
    }
}

pub struct JwtTestUtils;

impl JwtTestUtils {
    pub fn create_test_token(user: &TestUser, secret: &str, exp_hours: Option<i64>) -> String {
        Self::create_token_with_metadata(user, secret, exp_hours, json!({}))
    }

    pub fn create_token_with_metadata(
        user: &TestUser,
        secret: &str,
        exp_hours: Option<i64>,
        user_metadata: Value,
    ) -> String {
        let now = Utc::now();
        let exp = now + Duration::hours(exp_hours.unwrap_or(24));

        let header = json!({
            "alg": "HS256",
            "typ": "JWT"
        });

        let payload = json!({
            "sub": user.id,
            "email": user.email,
            "role": user.role,
            "user_metadata": user_metadata,
            "iat": now.timestamp(),
            "exp": exp.timestamp()
        });

        let header_encoded = general_purpose::URL_SAFE_NO_PAD.encode(header.to_string());
        let payload_encoded = general_purpose::URL_SAFE_NO_PAD.encode(payload.to_string());

        let signing_input = format!("{}.{}", header_encoded, payload_encoded);

        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(signing_input.as_bytes());
        let signature = mac.finalize().into_bytes();
        let signature_encoded = general_purpose::URL_SAFE_NO_PAD.encode(signature);

        format!("{}.{}", signing_input, signature_encoded)
    }

    pub fn create_expired_token(user: &TestUser, secret: &str) -> String {
        Self::create_test_token(user, secret, Some(-1))
    }

    pub fn create_invalid_signature_token(user: &TestUser) -> String {
        Self::create_test_token(user, "wrong-secret", Some(24))
    }

    pub fn create_malformed_token() -> String {
        "invalid.token.format".to_string()
    }
}

pub struct MockSupabaseResponses;

impl MockSupabaseResponses {
    pub fn user_response(user: &TestUser, user_metadata: Value) -> Value {
        json!({
            "id": user.id,
            "aud": "authenticated",
            "role": "authenticated",
            "email": user.email,
            "user_metadata": user_metadata,
            "created_at": "2024-01-01T00:00:00Z"
        })
    }

    pub fn session_response(user: &TestUser) -> Value {
        json!({
            "access_token": "session-access-token",
            "refresh_token": "session-refresh-token",
            "expires_in": 3600,
            "token_type": "bearer",
            "user": Self::user_response(user, json!({}))
        })
    }

    pub fn error_response(message: &str, code: &str) -> Value {
        json!({
            "error": code,
            "error_description": message
        })
    }
}

/// Payloads in the practice-management API's attribute-bag shape.
pub struct MockPracticeResponses;

impl MockPracticeResponses {
    pub fn patient_resource(id: &str, email: &str) -> Value {
        json!({
            "id": id,
            "type": "patients",
            "attributes": {
                "first-name": "Anna",
                "last-name": "Svensson",
                "email": email,
                "phone-number": "0701234567",
                "street-address": "Storgatan 1",
                "postal-code": "11122",
                "city": "Stockholm"
            }
        })
    }

    pub fn appointment_resource(id: &str, date: &str, status: &str) -> Value {
        json!({
            "id": id,
            "type": "appointments",
            "attributes": {
                "date": date,
                "start-time": "09:30",
                "duration": 45,
                "practitioner-name": "Dr. Lindqvist",
                "clinic-name": "Tandvård Södermalm",
                "status": status
            }
        })
    }

    pub fn collection(data: Vec<Value>) -> Value {
        json!({ "data": data })
    }

    pub fn collection_with_included(data: Vec<Value>, included: Vec<Value>) -> Value {
        json!({ "data": data, "included": included })
    }

    pub fn error_response(message: &str) -> Value {
        json!({ "errors": [{ "detail": message }] })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_creation() {
        let config = TestConfig::default();
        let app_config = config.to_app_config();

        assert_eq!(app_config.supabase_url, "http://localhost:54321");
        assert_eq!(app_config.supabase_anon_key, "test-anon-key");
        assert!(!app_config.supabase_jwt_secret.is_empty());
        assert!(app_config.is_practice_configured());
    }

    #[test]
    fn test_user_creation() {
        let user = TestUser::patient("anna@example.se");
        assert_eq!(user.email, "anna@example.se");

        let user_model = user.to_user();
        assert_eq!(user_model.email, Some(user.email.clone()));
        assert_eq!(user_model.id, user.id);
    }

    #[test]
    fn test_jwt_token_creation() {
        let user = TestUser::default();
        let token = JwtTestUtils::create_test_token(&user, "test-secret", Some(1));

        assert_eq!(token.split('.').count(), 3);
    }
}
