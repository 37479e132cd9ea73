use std::sync::OnceLock;

use regex::Regex;

use shared_models::error::AppError;

fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles")
    })
}

fn phone_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^\+?[0-9][0-9 \-]{5,18}[0-9]$").expect("phone pattern compiles"))
}

fn postal_code_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[0-9]{3} ?[0-9]{2}$").expect("postal code pattern compiles"))
}

/// Trims `email` and checks its shape. Case is preserved: practice lookups
/// match emails exactly.
pub fn validate_email(email: Option<&str>) -> Result<String, AppError> {
    let email = email
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .ok_or_else(|| AppError::BadRequest("Email is required".to_string()))?;

    if !email_pattern().is_match(email) {
        return Err(AppError::BadRequest(format!("Invalid email address: {}", email)));
    }

    Ok(email.to_string())
}

pub fn validate_phone(phone: &str) -> Result<(), AppError> {
    if phone.is_empty() || phone_pattern().is_match(phone) {
        Ok(())
    } else {
        Err(AppError::ValidationError(format!("Invalid phone number: {}", phone)))
    }
}

/// Swedish postal codes, `NNN NN` with optional space.
pub fn validate_postal_code(postal_code: &str) -> Result<(), AppError> {
    if postal_code.is_empty() || postal_code_pattern().is_match(postal_code) {
        Ok(())
    } else {
        Err(AppError::ValidationError(format!("Invalid postal code: {}", postal_code)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_email_validation() {
        assert_eq!(validate_email(Some(" Anna@Example.se ")).unwrap(), "Anna@Example.se");
        assert_matches!(validate_email(None), Err(AppError::BadRequest(_)));
        assert_matches!(validate_email(Some("   ")), Err(AppError::BadRequest(_)));
        assert_matches!(validate_email(Some("anna.example.se")), Err(AppError::BadRequest(_)));
        assert_matches!(validate_email(Some("anna@localhost")), Err(AppError::BadRequest(_)));
    }

    #[test]
    fn test_phone_validation() {
        assert!(validate_phone("").is_ok());
        assert!(validate_phone("070-123 45 67").is_ok());
        assert!(validate_phone("+46701234567").is_ok());
        assert_matches!(validate_phone("call me"), Err(AppError::ValidationError(_)));
    }

    #[test]
    fn test_postal_code_validation() {
        assert!(validate_postal_code("11122").is_ok());
        assert!(validate_postal_code("111 22").is_ok());
        assert!(validate_postal_code("").is_ok());
        assert_matches!(validate_postal_code("1112"), Err(AppError::ValidationError(_)));
    }
}
