use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Portal language preference stored in the identity metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    Sv,
    En,
}

impl Locale {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "sv" | "sv-se" => Some(Locale::Sv),
            "en" | "en-gb" | "en-us" => Some(Locale::En),
            _ => None,
        }
    }
}

/// Text field that tolerates `null`, numbers and other stray types.
fn lenient_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    })
}

/// Falls back to `T::default()` when the value has the wrong shape.
fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

fn lenient_locale<'de, D>(deserializer: D) -> Result<Locale, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Locale::parse(&s).unwrap_or_default(),
        _ => Locale::default(),
    })
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Address {
    #[serde(deserialize_with = "lenient_text")]
    pub street: String,
    #[serde(deserialize_with = "lenient_text")]
    pub postal_code: String,
    #[serde(deserialize_with = "lenient_text")]
    pub city: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NotificationPrefs {
    pub email: bool,
    pub sms: bool,
}

impl Default for NotificationPrefs {
    fn default() -> Self {
        Self { email: true, sms: false }
    }
}

/// Each flag falls back to its own default unless it holds a boolean.
impl<'de> Deserialize<'de> for NotificationPrefs {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let defaults = Self::default();
        let value = Value::deserialize(deserializer)?;
        let flag = |key: &str, default: bool| value.get(key).and_then(Value::as_bool).unwrap_or(default);

        Ok(Self {
            email: flag("email", defaults.email),
            sms: flag("sms", defaults.sms),
        })
    }
}

/// Free-form `user_metadata` bag kept by the auth provider.
///
/// Known keys are typed; anything else survives a read/modify/write cycle
/// through `extra`. A known key holding `null` or a value of the wrong type
/// reads as that field's default instead of failing the whole record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityMetadata {
    #[serde(deserialize_with = "lenient_text")]
    pub first_name: String,
    #[serde(deserialize_with = "lenient_text")]
    pub last_name: String,
    #[serde(deserialize_with = "lenient_text")]
    pub phone: String,
    #[serde(deserialize_with = "lenient")]
    pub address: Address,
    #[serde(deserialize_with = "lenient_locale")]
    pub locale: Locale,
    #[serde(deserialize_with = "lenient")]
    pub notifications: NotificationPrefs,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl IdentityMetadata {
    /// Lenient parse of a raw metadata value, e.g. from token claims.
    pub fn from_value(value: Option<&Value>) -> Self {
        value
            .and_then(|v| serde_json::from_value(v.clone()).ok())
            .unwrap_or_default()
    }
}

/// User account as returned by the auth provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentityRecord {
    pub id: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub email: String,
    #[serde(default, deserialize_with = "lenient")]
    pub user_metadata: IdentityMetadata,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: String,
    #[serde(default)]
    pub expires_in: u64,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    pub user: IdentityRecord,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_metadata_defaults_for_missing_keys() {
        let metadata: IdentityMetadata = serde_json::from_value(json!({"phone": "0701234567"})).unwrap();
        assert_eq!(metadata.phone, "0701234567");
        assert_eq!(metadata.locale, Locale::Sv);
        assert_eq!(metadata.address, Address::default());
        assert!(metadata.notifications.email);
        assert!(!metadata.notifications.sms);
    }

    #[test]
    fn test_metadata_preserves_unknown_keys() {
        let raw = json!({"locale": "en", "marketing_source": "instagram"});
        let metadata: IdentityMetadata = serde_json::from_value(raw).unwrap();
        assert_eq!(metadata.locale, Locale::En);
        assert_eq!(metadata.extra["marketing_source"], "instagram");

        let back = serde_json::to_value(&metadata).unwrap();
        assert_eq!(back["marketing_source"], "instagram");
    }

    #[test]
    fn test_metadata_tolerates_null_and_wrong_types() {
        let raw = json!({
            "first_name": "Anna",
            "last_name": null,
            "phone": 701234567,
            "address": "Storgatan 1",
            "locale": "sv-SE",
            "notifications": {"email": null, "sms": true},
            "referral": "friend"
        });
        let metadata: IdentityMetadata = serde_json::from_value(raw).unwrap();

        assert_eq!(metadata.first_name, "Anna");
        assert_eq!(metadata.last_name, "");
        assert_eq!(metadata.phone, "701234567");
        assert_eq!(metadata.address, Address::default());
        assert_eq!(metadata.locale, Locale::Sv);
        assert!(metadata.notifications.email);
        assert!(metadata.notifications.sms);
        assert_eq!(metadata.extra["referral"], "friend");
    }

    #[test]
    fn test_metadata_from_value_keeps_good_keys() {
        let metadata = IdentityMetadata::from_value(Some(&json!({
            "first_name": "Anna",
            "locale": "fi",
            "phone": null
        })));
        assert_eq!(metadata.first_name, "Anna");
        assert_eq!(metadata.locale, Locale::Sv);
        assert_eq!(metadata.phone, "");

        assert_eq!(IdentityMetadata::from_value(Some(&json!("not an object"))), IdentityMetadata::default());
        assert_eq!(IdentityMetadata::from_value(None), IdentityMetadata::default());
    }

    #[test]
    fn test_identity_record_with_null_metadata() {
        let record: IdentityRecord = serde_json::from_value(json!({
            "id": "user-1",
            "email": "anna@example.se",
            "user_metadata": {"first_name": "Anna", "phone": null, "locale": "EN"}
        }))
        .unwrap();
        assert_eq!(record.user_metadata.first_name, "Anna");
        assert_eq!(record.user_metadata.locale, Locale::En);

        let record: IdentityRecord = serde_json::from_value(json!({
            "id": "user-1",
            "email": null,
            "user_metadata": null
        }))
        .unwrap();
        assert_eq!(record.email, "");
        assert_eq!(record.user_metadata, IdentityMetadata::default());
    }

    #[test]
    fn test_locale_parse() {
        assert_eq!(Locale::parse("SV"), Some(Locale::Sv));
        assert_eq!(Locale::parse("en-GB"), Some(Locale::En));
        assert_eq!(Locale::parse("de"), None);
    }
}
