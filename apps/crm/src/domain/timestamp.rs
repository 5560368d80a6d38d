use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// A record timestamp as read from the store
///
/// Values that do not parse as RFC 3339 are kept verbatim rather than
/// rejected, so a corrupt row still loads, still exports its raw text and is
/// never hidden by the date filter.
///
/// # Example
/// ```
/// use leaddesk_crm::domain::Timestamp;
///
/// let ts = Timestamp::parse("2024-01-01T09:30:00Z");
/// assert!(ts.as_datetime().is_some());
///
/// let broken = Timestamp::parse("yesterday-ish");
/// assert!(broken.is_malformed());
/// assert_eq!(broken.to_string(), "yesterday-ish");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Timestamp {
    /// A well-formed instant
    Valid(DateTime<Utc>),
    /// Raw text that could not be parsed
    Malformed(String),
}

impl Timestamp {
    /// Parses stored text, falling back to [`Timestamp::Malformed`]
    pub fn parse(raw: &str) -> Self {
        match DateTime::parse_from_rfc3339(raw.trim()) {
            Ok(parsed) => Timestamp::Valid(parsed.with_timezone(&Utc)),
            Err(_) => Timestamp::Malformed(raw.to_string()),
        }
    }

    /// Returns the instant if the value parsed
    pub fn as_datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            Timestamp::Valid(at) => Some(*at),
            Timestamp::Malformed(_) => None,
        }
    }

    /// Returns true if the stored text could not be parsed
    pub fn is_malformed(&self) -> bool {
        matches!(self, Timestamp::Malformed(_))
    }

    /// Formats the instant in `tz` as `dd.mm.yyyy HH:MM:SS`
    ///
    /// Malformed values are returned as stored.
    pub fn display_in<Tz>(&self, tz: &Tz) -> String
    where
        Tz: TimeZone,
        Tz::Offset: fmt::Display,
    {
        match self {
            Timestamp::Valid(at) => at.with_timezone(tz).format("%d.%m.%Y %H:%M:%S").to_string(),
            Timestamp::Malformed(raw) => raw.clone(),
        }
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(at: DateTime<Utc>) -> Self {
        Timestamp::Valid(at)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Timestamp::Valid(at) => f.write_str(&at.to_rfc3339_opts(SecondsFormat::Millis, true)),
            Timestamp::Malformed(raw) => f.write_str(raw),
        }
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Timestamp::parse(&raw))
    }
}
