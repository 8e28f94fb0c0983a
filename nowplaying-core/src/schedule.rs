//! Schedule service client
//!
//! The schedule service answers with the station's time zone, the show on air
//! (if any) and a list of upcoming shows. Timestamps are naive local times in
//! the station's zone.

use std::time::Duration;

use chrono::{DateTime, LocalResult, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::ScheduleError;

/// Timestamp format used by the schedule service
pub const SCHEDULE_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Live-info payload of the schedule service
#[derive(Debug, Clone, Deserialize)]
pub struct ScheduleResponse {
    pub station: Station,
    pub shows: Shows,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Station {
    pub timezone: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Shows {
    #[serde(default, deserialize_with = "deserialize_current")]
    pub current: Option<ScheduleEntry>,
    /// First upcoming show, later ones are never consulted
    #[serde(default, deserialize_with = "deserialize_next")]
    pub next: Option<ScheduleEntry>,
}

/// A single show record
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ScheduleEntry {
    #[serde(default, deserialize_with = "deserialize_text")]
    pub name: String,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub starts: String,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub ends: String,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub url: String,
}

impl ScheduleResponse {
    /// Resolve the station's time zone
    pub fn timezone(&self) -> Result<Tz, ScheduleError> {
        self.station
            .timezone
            .parse::<Tz>()
            .map_err(|_| ScheduleError::InvalidTimezone(self.station.timezone.clone()))
    }
}

/// Parse a naive schedule timestamp in `tz` and convert it to UTC
///
/// Ambiguous local times resolve to the later instant. Local times skipped by
/// a daylight saving change are rejected.
pub fn parse_schedule_time(value: &str, tz: Tz) -> Result<DateTime<Utc>, ScheduleError> {
    let naive = NaiveDateTime::parse_from_str(value, SCHEDULE_DATETIME_FORMAT).map_err(|e| {
        ScheduleError::InvalidTimestamp {
            value: value.to_string(),
            reason: e.to_string(),
        }
    })?;

    match tz.from_local_datetime(&naive) {
        LocalResult::Single(t) => Ok(t.with_timezone(&Utc)),
        LocalResult::Ambiguous(_, later) => Ok(later.with_timezone(&Utc)),
        LocalResult::None => Err(ScheduleError::InvalidTimestamp {
            value: value.to_string(),
            reason: format!("does not exist in {tz}"),
        }),
    }
}

/// Something that can fetch the live schedule
pub trait ScheduleSource {
    fn fetch(&self) -> Result<ScheduleResponse, ScheduleError>;
}

/// Blocking HTTP schedule source
#[derive(Debug, Clone)]
pub struct HttpScheduleSource {
    client: reqwest::blocking::Client,
    url: String,
}

impl HttpScheduleSource {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, ScheduleError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ScheduleError::Unavailable(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl ScheduleSource for HttpScheduleSource {
    fn fetch(&self) -> Result<ScheduleResponse, ScheduleError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|e| ScheduleError::Unavailable(e.to_string()))?;

        response.json::<ScheduleResponse>().map_err(|e| {
            if e.is_decode() {
                ScheduleError::Malformed(e.to_string())
            } else {
                ScheduleError::Unavailable(e.to_string())
            }
        })
    }
}

fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
        Value::Number(_) => false,
    }
}

fn deserialize_current<'de, D>(deserializer: D) -> Result<Option<ScheduleEntry>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    if is_empty_value(&value) {
        return Ok(None);
    }
    serde_json::from_value(value)
        .map(Some)
        .map_err(serde::de::Error::custom)
}

fn deserialize_next<'de, D>(deserializer: D) -> Result<Option<ScheduleEntry>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    match value {
        Value::Array(items) => match items.into_iter().next() {
            Some(first) if !is_empty_value(&first) => serde_json::from_value(first)
                .map(Some)
                .map_err(serde::de::Error::custom),
            _ => Ok(None),
        },
        other if is_empty_value(&other) => Ok(None),
        other => Err(serde::de::Error::custom(format!(
            "expected a list of shows, got {other}"
        ))),
    }
}

fn deserialize_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}
