//! Typed track events delivered by the webhook

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Track, DEFAULT_ARTIST, DEFAULT_TITLE};

/// Event type announcing that a track started playing
pub const TRACK_STARTED_TYPE: &str = "ch.rabe.api.events.track.v1.trackStarted";

/// Event type announcing that a track finished playing
pub const TRACK_FINISHED_TYPE: &str = "ch.rabe.api.events.track.v1.trackFinished";

/// Kind of a track event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    Started,
    Finished,
}

impl EventKind {
    /// The CloudEvents `type` attribute for this kind
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Started => TRACK_STARTED_TYPE,
            EventKind::Finished => TRACK_FINISHED_TYPE,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            TRACK_STARTED_TYPE => Ok(EventKind::Started),
            TRACK_FINISHED_TYPE => Ok(EventKind::Finished),
            other => Err(format!("unsupported event type: {other}")),
        }
    }
}

/// Payload of a track event
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackEventData {
    #[serde(rename = "item.artist", default)]
    pub artist: Option<String>,
    #[serde(rename = "item.title", default)]
    pub title: Option<String>,
    /// Length in seconds
    #[serde(rename = "item.length", default)]
    pub length: Option<u64>,
}

/// A validated track event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackEvent {
    pub id: String,
    pub source: String,
    pub kind: EventKind,
    pub time: Option<DateTime<Utc>>,
    pub data: TrackEventData,
}

impl TrackEvent {
    pub fn new(id: impl Into<String>, source: impl Into<String>, kind: EventKind) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            kind,
            time: None,
            data: TrackEventData::default(),
        }
    }

    pub fn with_time(mut self, time: DateTime<Utc>) -> Self {
        self.time = Some(time);
        self
    }

    pub fn with_data(mut self, data: TrackEventData) -> Self {
        self.data = data;
        self
    }

    /// Build the track this event describes
    ///
    /// The event time becomes the start time for started events and the end
    /// time for finished events. A length moves the end time relative to the
    /// start time. Missing artist or title fall back to the defaults.
    pub fn to_track(&self) -> Track {
        let mut track = Track::new();

        track.set_artist(
            self.data
                .artist
                .clone()
                .unwrap_or_else(|| DEFAULT_ARTIST.to_string()),
        );
        track.set_title(
            self.data
                .title
                .clone()
                .unwrap_or_else(|| DEFAULT_TITLE.to_string()),
        );

        if let Some(time) = self.time {
            match self.kind {
                EventKind::Started => track.set_starttime(time),
                EventKind::Finished => track.set_endtime(time),
            }
        }

        if let Some(length) = self.data.length {
            track.set_duration(length);
        }

        track
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn event_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_kind_round_trips_type_string() {
        assert_eq!(
            TRACK_STARTED_TYPE.parse::<EventKind>().unwrap(),
            EventKind::Started
        );
        assert_eq!(EventKind::Finished.as_str(), TRACK_FINISHED_TYPE);
        assert!("ch.rabe.api.events.other".parse::<EventKind>().is_err());
    }

    #[test]
    fn test_started_event_sets_starttime_and_length() {
        let event = TrackEvent::new("crid://rabe.ch/v1/1", "https://example.org", EventKind::Started)
            .with_time(event_time())
            .with_data(TrackEventData {
                artist: Some("Artist".into()),
                title: Some("Title".into()),
                length: Some(180),
            });

        let track = event.to_track();
        assert_eq!(track.artist(), "Artist");
        assert_eq!(track.title(), "Title");
        assert_eq!(track.starttime(), event_time());
        assert_eq!(track.endtime(), event_time() + Duration::seconds(180));
    }

    #[test]
    fn test_finished_event_sets_endtime() {
        let event = TrackEvent::new("1", "src", EventKind::Finished).with_time(event_time());
        let track = event.to_track();
        assert_eq!(track.endtime(), event_time());
    }

    #[test]
    fn test_missing_metadata_uses_defaults() {
        let track = TrackEvent::new("1", "src", EventKind::Started).to_track();
        assert!(track.has_default_metadata());
    }

    #[test]
    fn test_data_deserializes_dotted_keys() {
        let data: TrackEventData = serde_json::from_str(
            r#"{"item.artist": "A", "item.title": "T", "item.length": 42}"#,
        )
        .unwrap();
        assert_eq!(data.artist.as_deref(), Some("A"));
        assert_eq!(data.title.as_deref(), Some("T"));
        assert_eq!(data.length, Some(42));
    }
}
