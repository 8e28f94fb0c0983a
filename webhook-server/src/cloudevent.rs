//! CloudEvents envelope in structured JSON mode

use chrono::{DateTime, Utc};
use nowplaying_core::{EventKind, TrackEvent, TrackEventData};
use serde::Deserialize;
use serde_json::Value;

use crate::error::EnvelopeError;

/// The only CloudEvents version accepted
pub const SPEC_VERSION: &str = "1.0";

#[derive(Debug, Deserialize)]
struct RawCloudEvent {
    specversion: Option<String>,
    id: Option<String>,
    source: Option<String>,
    #[serde(rename = "type")]
    event_type: Option<String>,
    time: Option<String>,
    #[serde(default)]
    data: Option<Value>,
}

/// A validated CloudEvent
#[derive(Debug, Clone, PartialEq)]
pub struct CloudEvent {
    pub id: String,
    pub source: String,
    pub event_type: String,
    pub time: Option<DateTime<Utc>>,
    pub data: Option<Value>,
}

impl CloudEvent {
    /// Decode and validate a structured-mode JSON body
    pub fn parse(body: &[u8]) -> Result<Self, EnvelopeError> {
        let raw: RawCloudEvent =
            serde_json::from_slice(body).map_err(|e| EnvelopeError::InvalidJson(e.to_string()))?;

        let specversion = required(raw.specversion, "specversion")?;
        if specversion != SPEC_VERSION {
            return Err(EnvelopeError::UnsupportedSpecVersion(specversion));
        }

        let time = raw
            .time
            .filter(|t| !t.is_empty())
            .map(|t| {
                DateTime::parse_from_rfc3339(&t)
                    .map(|parsed| parsed.with_timezone(&Utc))
                    .map_err(|_| EnvelopeError::InvalidTime(t))
            })
            .transpose()?;

        Ok(Self {
            id: required(raw.id, "id")?,
            source: required(raw.source, "source")?,
            event_type: required(raw.event_type, "type")?,
            time,
            data: raw.data,
        })
    }

    /// Check that the id is a `crid://<authority>/...` URI
    pub fn check_crid(&self, authority: &str) -> Result<(), EnvelopeError> {
        let invalid = || EnvelopeError::InvalidCrid(self.id.clone());
        let crid = url::Url::parse(&self.id).map_err(|_| invalid())?;

        let host_matches = crid
            .host_str()
            .is_some_and(|host| host.eq_ignore_ascii_case(authority));
        let has_path = crid.path().trim_start_matches('/').len() > 0;

        if crid.scheme() == "crid" && host_matches && has_path {
            Ok(())
        } else {
            Err(invalid())
        }
    }

    /// Convert into a track event if the type is a known track event
    pub fn to_track_event(&self) -> Result<Option<TrackEvent>, EnvelopeError> {
        let Ok(kind) = self.event_type.parse::<EventKind>() else {
            return Ok(None);
        };

        let data = match &self.data {
            None | Some(Value::Null) => TrackEventData::default(),
            Some(value) => serde_json::from_value::<TrackEventData>(value.clone())
                .map_err(|e| EnvelopeError::InvalidData(e.to_string()))?,
        };

        let mut event = TrackEvent::new(self.id.clone(), self.source.clone(), kind).with_data(data);
        event.time = self.time;
        Ok(Some(event))
    }
}

fn required(value: Option<String>, name: &'static str) -> Result<String, EnvelopeError> {
    value
        .filter(|v| !v.is_empty())
        .ok_or(EnvelopeError::MissingAttribute(name))
}
