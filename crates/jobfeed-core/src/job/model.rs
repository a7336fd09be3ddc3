use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// A point in time as stored in the job list.
///
/// The stored JSON value is kept verbatim so records written by other tools
/// survive a load/save cycle unchanged, including values that are not
/// recognisable dates at all.
#[derive(Debug, Clone, PartialEq)]
pub struct Timestamp {
    raw: Value,
    at: Option<DateTime<Utc>>,
}

impl Timestamp {
    /// The parsed instant, or `None` when the stored value is not a date
    pub fn at(&self) -> Option<DateTime<Utc>> {
        self.at
    }

    pub fn raw(&self) -> &Value {
        &self.raw
    }

    fn from_value(raw: Value) -> Self {
        let at = match &raw {
            Value::String(s) => parse_date(s),
            Value::Number(n) => n.as_i64().and_then(|ms| Utc.timestamp_millis_opt(ms).single()),
            _ => None,
        };
        Self { raw, at }
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(at: DateTime<Utc>) -> Self {
        Self {
            raw: Value::String(at.to_rfc3339_opts(SecondsFormat::Millis, true)),
            at: Some(at),
        }
    }
}

fn parse_date(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    DateTime::parse_from_rfc3339(s)
        .or_else(|_| DateTime::parse_from_rfc2822(s))
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.raw.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(Self::from_value)
    }
}

/// A job listing, the only record kept in the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: String,
    // Older writers dropped keys whose value was undefined; such records
    // load with an empty string rather than failing the whole file.
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub source: String,
    #[serde(rename = "date", alias = "publishedAt")]
    pub published_at: Timestamp,
    #[serde(rename = "expires", alias = "expiresAt")]
    pub expires_at: Timestamp,
}

impl Job {
    /// A job is expired once `now` has reached its expiry.
    /// Jobs whose expiry cannot be read are never considered expired.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        matches!(self.expires_at.at(), Some(expires) if expires <= now)
    }

    /// Whole days until expiry, rounded up
    pub fn days_left(&self, now: DateTime<Utc>) -> Option<i64> {
        let secs = (self.expires_at.at()? - now).num_seconds();
        Some(secs.div_euclid(86_400) + i64::from(secs.rem_euclid(86_400) != 0))
    }
}
