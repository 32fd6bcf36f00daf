use crate::execution::errors::ConvertError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Timestamp layouts accepted besides RFC 3339, matching how Postgres prints
/// `timestamptz` values (`2024-07-19 11:45:01.050000 +00:00`).
const CUTOFF_FORMATS: [&str; 3] = [
    "%Y-%m-%d %H:%M:%S%.f %:z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%#z",
];

/// A user whose operations older than `cutoff` are to be migrated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkItem {
    pub user_id: String,
    /// Raw cutoff as configured; parsed when the item is fetched.
    pub cutoff: String,
}

impl WorkItem {
    pub fn new(user_id: impl Into<String>, cutoff: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            cutoff: cutoff.into(),
        }
    }

    pub fn cutoff_time(&self) -> Result<DateTime<Utc>, ConvertError> {
        parse_cutoff(&self.cutoff)
    }

    pub fn validate(&self) -> Result<(), ConvertError> {
        if self.user_id.trim().is_empty() {
            return Err(ConvertError::EmptyUserId);
        }
        self.cutoff_time().map(|_| ())
    }
}

pub fn parse_cutoff(raw: &str) -> Result<DateTime<Utc>, ConvertError> {
    let raw = raw.trim();

    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }

    CUTOFF_FORMATS
        .iter()
        .find_map(|fmt| DateTime::parse_from_str(raw, fmt).ok())
        .map(|ts| ts.with_timezone(&Utc))
        .ok_or_else(|| ConvertError::Cutoff(raw.to_string()))
}
