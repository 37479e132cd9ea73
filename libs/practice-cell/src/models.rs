use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

// Wire format

/// Top-level response envelope of the practice-management API.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Document {
    #[serde(default)]
    pub data: Option<OneOrMany>,
    #[serde(default)]
    pub included: Vec<Resource>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
    Many(Vec<Resource>),
    One(Box<Resource>),
}

impl Document {
    pub fn resources(&self) -> Vec<&Resource> {
        match &self.data {
            Some(OneOrMany::Many(items)) => items.iter().collect(),
            Some(OneOrMany::One(item)) => vec![item.as_ref()],
            None => Vec::new(),
        }
    }

    /// Included resources of `kind` that belong to `owner_id`, or carry no owner link.
    pub fn included_for<'a>(&'a self, kind: &'a str, owner_id: &'a str) -> impl Iterator<Item = &'a Resource> {
        self.included.iter().filter(move |r| {
            r.kind == kind
                && r.related_id("patient").map_or(true, |id| id == owner_id)
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Resource {
    #[serde(deserialize_with = "string_or_number", default)]
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub attributes: AttributeBag,
    #[serde(default)]
    pub relationships: Map<String, Value>,
}

impl Resource {
    /// Id of a to-one relationship, e.g. `relationships.patient.data.id`.
    pub fn related_id(&self, name: &str) -> Option<String> {
        match self.relationships.get(name)?.get("data")?.get("id")? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    })
}

/// Loosely typed `attributes` object of a resource.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct AttributeBag(pub Map<String, Value>);

impl AttributeBag {
    /// Value of the first candidate key that is present and not null.
    pub fn first(&self, keys: &[&str]) -> Option<&Value> {
        keys.iter()
            .filter_map(|key| self.0.get(*key))
            .find(|value| !value.is_null())
    }

    /// Untrimmed string value of the first present key.
    pub fn raw_str(&self, keys: &[&str]) -> Option<&str> {
        self.first(keys).and_then(Value::as_str)
    }

    /// Text of the first present key; numbers and booleans are rendered, anything
    /// else (including absence) yields an empty string.
    pub fn text(&self, keys: &[&str]) -> String {
        match self.first(keys) {
            Some(Value::String(s)) => s.trim().to_string(),
            Some(Value::Number(n)) => n.to_string(),
            Some(Value::Bool(b)) => b.to_string(),
            _ => String::new(),
        }
    }

    /// Non-negative integer of the first present key; numeric strings are
    /// accepted, anything else yields 0.
    pub fn count(&self, keys: &[&str]) -> u32 {
        match self.first(keys) {
            Some(Value::Number(n)) => n
                .as_u64()
                .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f.round() as u64))
                .map_or(0, |v| v.min(u32::MAX as u64) as u32),
            Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
            _ => 0,
        }
    }
}

// Domain records

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: String,
    pub date: String,
    pub time: String,
    pub duration_minutes: u32,
    pub clinician: String,
    pub location: String,
    pub status: String,
}

impl Appointment {
    pub fn starts_on(&self) -> Option<NaiveDate> {
        parse_date(&self.date)
    }

    /// Start as local clinic time, when both date and time are parseable.
    pub fn starts_at(&self) -> Option<NaiveDateTime> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(&self.date) {
            return Some(dt.naive_local());
        }
        let date = parse_date(&self.date)?;
        let time = parse_time(&self.time)?;
        Some(date.and_time(time))
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(
            self.status.to_ascii_lowercase().as_str(),
            "cancelled" | "canceled" | "avbokad" | "no_show" | "no-show"
        )
    }

    /// Not cancelled and starting at or after `now`. Without a usable time
    /// the whole day of the appointment counts.
    pub fn is_upcoming(&self, now: NaiveDateTime) -> bool {
        if self.is_cancelled() {
            return false;
        }
        match (self.starts_at(), self.starts_on()) {
            (Some(start), _) => start >= now,
            (None, Some(day)) => day >= now.date(),
            (None, None) => false,
        }
    }

    /// Identity used to drop duplicates when several sources are merged.
    pub fn dedup_key(&self) -> String {
        if self.id.is_empty() {
            format!("{}|{}|{}", self.date, self.time, self.clinician)
        } else {
            self.id.clone()
        }
    }
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(value).ok().map(|dt| dt.date_naive()))
}

fn parse_time(value: &str) -> Option<NaiveTime> {
    let value = value.trim();
    NaiveTime::parse_from_str(value, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M"))
        .ok()
}

/// Sorts by start, appointments without a parseable start last.
pub fn sort_chronologically(appointments: &mut [Appointment]) {
    appointments.sort_by_key(|a| (a.starts_at().is_none(), a.starts_at(), a.starts_on()));
}

/// Patient as registered in the practice-management system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PracticePatient {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub street_address: String,
    pub postal_code: String,
    pub city: String,
    /// Appointments embedded in the lookup response, possibly empty.
    #[serde(default)]
    pub appointments: Vec<Appointment>,
}

impl PracticePatient {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }
}
