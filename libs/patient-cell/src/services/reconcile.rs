use practice_cell::PracticePatient;
use shared_identity::{IdentityMetadata, IdentityRecord, Locale};
use shared_models::auth::User;
use shared_models::error::AppError;
use shared_utils::validation::{validate_phone, validate_postal_code};

use crate::models::{ProfileSources, ProfileView, UpdateProfileRequest};

fn prefer(practice: Option<&str>, identity: &str) -> String {
    match practice.map(str::trim) {
        Some(value) if !value.is_empty() => value.to_string(),
        _ => identity.to_string(),
    }
}

/// Identity record rebuilt from token claims when the auth provider is unreachable.
pub fn identity_from_claims(user: &User) -> IdentityRecord {
    IdentityRecord {
        id: user.id.clone(),
        email: user.email.clone().unwrap_or_default(),
        user_metadata: IdentityMetadata::from_value(user.metadata.as_ref()),
    }
}

/// Merges both records field by field. A non-empty practice value wins,
/// otherwise the identity metadata is used. Locale and notification flags
/// only exist on the identity side.
pub fn reconcile(
    identity: &IdentityRecord,
    practice: Option<&PracticePatient>,
    identity_is_fresh: bool,
) -> ProfileView {
    let meta = &identity.user_metadata;

    ProfileView {
        user_id: identity.id.clone(),
        email: identity.email.clone(),
        practice_patient_id: practice.map(|p| p.id.clone()),
        first_name: prefer(practice.map(|p| p.first_name.as_str()), &meta.first_name),
        last_name: prefer(practice.map(|p| p.last_name.as_str()), &meta.last_name),
        phone: prefer(practice.map(|p| p.phone.as_str()), &meta.phone),
        street_address: prefer(practice.map(|p| p.street_address.as_str()), &meta.address.street),
        postal_code: prefer(practice.map(|p| p.postal_code.as_str()), &meta.address.postal_code),
        city: prefer(practice.map(|p| p.city.as_str()), &meta.address.city),
        locale: meta.locale,
        notifications: meta.notifications,
        sources: ProfileSources {
            identity: identity_is_fresh,
            practice: practice.is_some(),
        },
    }
}

/// Validates `update` and applies it on top of `metadata`. Unset fields are left alone.
pub fn apply_update(
    metadata: &IdentityMetadata,
    update: UpdateProfileRequest,
) -> Result<IdentityMetadata, AppError> {
    let mut next = metadata.clone();

    if let Some(first_name) = update.first_name {
        next.first_name = first_name.trim().to_string();
    }
    if let Some(last_name) = update.last_name {
        next.last_name = last_name.trim().to_string();
    }
    if let Some(phone) = update.phone {
        let phone = phone.trim().to_string();
        validate_phone(&phone)?;
        next.phone = phone;
    }
    if let Some(street) = update.street_address {
        next.address.street = street.trim().to_string();
    }
    if let Some(postal_code) = update.postal_code {
        let postal_code = postal_code.trim().to_string();
        validate_postal_code(&postal_code)?;
        next.address.postal_code = postal_code;
    }
    if let Some(city) = update.city {
        next.address.city = city.trim().to_string();
    }
    if let Some(locale) = update.locale {
        next.locale = Locale::parse(&locale)
            .ok_or_else(|| AppError::ValidationError(format!("Unsupported locale: {}", locale)))?;
    }
    if let Some(notifications) = update.notifications {
        next.notifications = notifications;
    }

    Ok(next)
}
