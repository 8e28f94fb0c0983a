//! Show type

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// URL reported for shows that do not carry their own
pub const DEFAULT_SHOW_URL: &str = "https://www.rabe.ch";

/// A show on the station's schedule
///
/// Each instance gets a fresh identifier, so two shows built from the same
/// schedule entry are still distinguishable. Inputs use this to detect show
/// boundaries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Show {
    name: String,
    url: String,
    uuid: Uuid,
    starttime: DateTime<Utc>,
    endtime: DateTime<Utc>,
}

impl Show {
    /// Create an unresolved show starting and ending now
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            name: String::new(),
            url: DEFAULT_SHOW_URL.to_string(),
            uuid: Uuid::new_v4(),
            starttime: now,
            endtime: now,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn set_url(&mut self, url: impl Into<String>) {
        self.url = url.into();
    }

    pub fn uuid(&self) -> Uuid {
        self.uuid
    }

    pub fn starttime(&self) -> DateTime<Utc> {
        self.starttime
    }

    pub fn set_starttime(&mut self, starttime: DateTime<Utc>) {
        self.starttime = starttime;
    }

    pub fn endtime(&self) -> DateTime<Utc> {
        self.endtime
    }

    pub fn set_endtime(&mut self, endtime: DateTime<Utc>) {
        self.endtime = endtime;
    }

    /// Whether the show has ended at `now`
    pub fn has_ended(&self, now: DateTime<Utc>) -> bool {
        now > self.endtime
    }
}

impl Default for Show {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Show {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Show '{}' ({}), start: '{}', end: '{}', url: {}",
            self.name, self.uuid, self.starttime, self.endtime, self.url
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_new_show_defaults() {
        let show = Show::new();
        assert_eq!(show.name(), "");
        assert_eq!(show.url(), DEFAULT_SHOW_URL);
        assert_eq!(show.starttime(), show.endtime());
    }

    #[test]
    fn test_uuid_is_unique_per_instance() {
        assert_ne!(Show::new().uuid(), Show::new().uuid());
    }

    #[test]
    fn test_setters() {
        let mut show = Show::new();
        let start = Utc::now();
        let end = start + Duration::hours(1);

        show.set_name("Stereo Freeze");
        show.set_url("https://www.rabe.ch/stereo-freeze/");
        show.set_starttime(start);
        show.set_endtime(end);

        assert_eq!(show.name(), "Stereo Freeze");
        assert_eq!(show.url(), "https://www.rabe.ch/stereo-freeze/");
        assert_eq!(show.starttime(), start);
        assert_eq!(show.endtime(), end);
    }

    #[test]
    fn test_has_ended() {
        let mut show = Show::new();
        let now = Utc::now();
        show.set_endtime(now);

        assert!(!show.has_ended(now));
        assert!(show.has_ended(now + Duration::seconds(1)));
    }

    #[test]
    fn test_display_contains_name() {
        let mut show = Show::new();
        show.set_name("Info");
        assert!(show.to_string().starts_with("Show 'Info'"));
    }
}
