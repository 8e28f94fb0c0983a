//! Error types for the now-playing core

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors raised while building a [`Track`](crate::Track)
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TrackError {
    #[error("track number has to be a positive integer, got {0}")]
    InvalidTrackNumber(u32),
}

/// Errors raised by [`ShowClient::update`](crate::ShowClient::update)
///
/// Every variant is recoverable: the client keeps its short-lived tentative
/// show and the next lookup retries.
#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("Unable to get current show information: {0}")]
    Unavailable(String),

    #[error("Malformed schedule response: {0}")]
    Malformed(String),

    #[error("Unknown station time zone '{0}'")]
    InvalidTimezone(String),

    #[error("Missing show name")]
    MissingName,

    #[error("Missing show end time")]
    MissingEndTime,

    #[error("Missing show start time")]
    MissingStartTime,

    #[error("Invalid show timestamp '{value}': {reason}")]
    InvalidTimestamp { value: String, reason: String },

    #[error("Show end time ({endtime}) is in the past")]
    StaleEndTime { endtime: DateTime<Utc> },
}

/// Errors raised while reading the legacy now-playing XML file
#[derive(Debug, Error)]
pub enum NowPlayingFileError {
    #[error("Failed to read now-playing file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse now-playing file: {0}")]
    Xml(String),

    #[error("No <song> tag found")]
    MissingSong,

    #[error("No <{0}> tag found")]
    MissingElement(&'static str),

    #[error("Song timestamp attribute is missing")]
    MissingTimestamp,

    #[error("Invalid song timestamp '{0}'")]
    InvalidTimestamp(String),

    #[error("Invalid song duration '{0}'")]
    InvalidDuration(String),
}

/// Errors raised by an input while handling a selector reading
#[derive(Debug, Error)]
pub enum InputError {
    #[error("No track handler registered on input '{0}'")]
    MissingTrackHandler(String),

    #[error(transparent)]
    NowPlayingFile(#[from] NowPlayingFileError),
}

/// Errors returned by downstream observers
#[derive(Debug, Error)]
pub enum ObserverError {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Formatting failed: {0}")]
    Format(String),

    #[error("Upload failed: {0}")]
    Upload(String),

    #[error("Invalid observer configuration: {0}")]
    Config(String),
}

/// Errors returned by a selector transport
#[derive(Debug, Error)]
pub enum SelectorError {
    #[error("Failed to bind selector socket: {0}")]
    Bind(String),

    #[error("Selector I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("No valid selector reading available")]
    Unavailable,
}
