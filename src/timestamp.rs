//! Serde helpers for `DateTime<Utc>` fields.
//!
//! Timestamps travel as RFC 3339 text. An empty field, which is what a
//! missing value looks like on the wire, decodes to the Unix epoch.
//!
//! ```rust
//! use chrono::{DateTime, Utc};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize, Deserialize)]
//! struct Event {
//!     name: String,
//!     #[serde(with = "serde_tt::timestamp")]
//!     at: DateTime<Utc>,
//! }
//!
//! let events: Vec<Event> = serde_tt::from_str("`*`\tapp\tEvent\tname\tat\nboot\t\n").unwrap();
//! assert_eq!(events[0].at, DateTime::<Utc>::default());
//! ```

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{de, Deserialize, Deserializer, Serializer};

pub fn serialize<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::AutoSi, true))
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let text = String::deserialize(deserializer)?;
    if text.is_empty() {
        return Ok(DateTime::<Utc>::default());
    }
    DateTime::parse_from_rfc3339(&text)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| de::Error::custom(format!("invalid timestamp {text:?}: {e}")))
}
