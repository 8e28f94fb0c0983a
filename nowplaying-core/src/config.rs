//! Configuration types for the now-playing core
//!
//! Values mirror the station's production setup; every field can be
//! overridden by the daemon's command line.

use std::path::PathBuf;
use std::time::Duration;

use crate::model::SelectorId;

/// Configuration for the [`ShowClient`](crate::ShowClient)
#[derive(Debug, Clone)]
pub struct ScheduleConfig {
    /// URL of the schedule service's live-info endpoint
    /// Default: empty
    pub url: String,

    /// Lifetime of the tentative show set before each refresh
    /// Default: 3 seconds
    pub default_show_duration: Duration,

    /// How far ahead an upcoming show is adopted when nothing is on air
    /// Default: 15 minutes
    pub next_show_lookahead: Duration,

    /// Timeout for the schedule HTTP request
    /// Default: 60 seconds
    pub request_timeout: Duration,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            default_show_duration: Duration::from_secs(3),
            next_show_lookahead: Duration::from_secs(15 * 60),
            request_timeout: Duration::from_secs(60),
        }
    }
}

impl ScheduleConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

/// Configuration for the fallback (automation) input
#[derive(Debug, Clone)]
pub struct FallbackConfig {
    /// Selector id reserved for the automation
    /// Default: 1
    pub selector_id: SelectorId,

    /// CloudEvents source the automation publishes as
    /// Default: "https://github/radiorabe/klangbecken"
    pub event_source: String,

    /// Show name forced while the automation is on air
    /// Default: "Klangbecken"
    pub show_name: String,

    /// Show URL forced while the automation is on air
    /// Default: "http://www.rabe.ch/sendungen/musik/klangbecken.html"
    pub show_url: String,

    /// Legacy now-playing XML written by the automation
    /// Default: None
    pub now_playing_file: Option<PathBuf>,
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            selector_id: SelectorId::KLANGBECKEN,
            event_source: "https://github/radiorabe/klangbecken".to_string(),
            show_name: "Klangbecken".to_string(),
            show_url: "http://www.rabe.ch/sendungen/musik/klangbecken.html".to_string(),
            now_playing_file: None,
        }
    }
}

impl FallbackConfig {
    /// Event driven only, no legacy file
    pub fn events_only() -> Self {
        Self::default()
    }

    /// Watch a legacy now-playing file in addition to events
    pub fn with_now_playing_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.now_playing_file = Some(path.into());
        self
    }
}
