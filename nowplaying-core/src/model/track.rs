//! Track type

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use super::Show;
use crate::error::TrackError;

/// Artist reported when the real artist is unknown
pub const DEFAULT_ARTIST: &str = "Radio Bern";

/// Title reported when the real title is unknown
pub const DEFAULT_TITLE: &str = "Livestream";

/// A single item on air
///
/// Built fresh by an input for each detected transition and handed to the
/// [`TrackEventHandler`](crate::TrackEventHandler) once complete. The owning
/// show is shared by reference.
#[derive(Debug, Clone)]
pub struct Track {
    artist: String,
    title: String,
    album: String,
    track: u32,
    uuid: Uuid,
    starttime: DateTime<Utc>,
    endtime: DateTime<Utc>,
    show: Option<Arc<Show>>,
}

impl Track {
    /// Create an empty track starting and ending now
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            artist: String::new(),
            title: String::new(),
            album: String::new(),
            track: 1,
            uuid: Uuid::new_v4(),
            starttime: now,
            endtime: now,
            show: None,
        }
    }

    /// Create a track carrying the default artist and title
    pub fn with_defaults() -> Self {
        let mut track = Self::new();
        track.set_artist(DEFAULT_ARTIST);
        track.set_title(DEFAULT_TITLE);
        track
    }

    pub fn artist(&self) -> &str {
        &self.artist
    }

    pub fn set_artist(&mut self, artist: impl Into<String>) {
        self.artist = artist.into();
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    pub fn album(&self) -> &str {
        &self.album
    }

    pub fn set_album(&mut self, album: impl Into<String>) {
        self.album = album.into();
    }

    pub fn track(&self) -> u32 {
        self.track
    }

    /// Set the track number, which must be positive
    pub fn set_track(&mut self, track: u32) -> Result<(), TrackError> {
        if track == 0 {
            return Err(TrackError::InvalidTrackNumber(track));
        }
        self.track = track;
        Ok(())
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

    /// Set the end time to start time plus `seconds`
    pub fn set_duration(&mut self, seconds: u64) {
        let seconds = i64::try_from(seconds).unwrap_or(i64::MAX);
        let duration = Duration::try_seconds(seconds).unwrap_or(Duration::MAX);
        self.endtime = self
            .starttime
            .checked_add_signed(duration)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
    }

    pub fn duration(&self) -> Duration {
        self.endtime - self.starttime
    }

    pub fn show(&self) -> Option<&Arc<Show>> {
        self.show.as_ref()
    }

    pub fn set_show(&mut self, show: Arc<Show>) {
        self.show = Some(show);
    }

    /// Name of the owning show, empty when none is attached
    pub fn show_name(&self) -> &str {
        self.show.as_deref().map(Show::name).unwrap_or_default()
    }

    pub fn has_default_artist(&self) -> bool {
        self.artist == DEFAULT_ARTIST
    }

    pub fn has_default_title(&self) -> bool {
        self.title == DEFAULT_TITLE
    }

    /// True when neither artist nor title carry real metadata
    pub fn has_default_metadata(&self) -> bool {
        self.has_default_artist() && self.has_default_title()
    }
}

impl Default for Track {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Track {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Track '{}' - '{}', start: '{}', end: '{}', uid: {}",
            self.artist, self.title, self.starttime, self.endtime, self.uuid
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_new_track_defaults() {
        let track = Track::new();
        assert_eq!(track.artist(), "");
        assert_eq!(track.title(), "");
        assert_eq!(track.album(), "");
        assert_eq!(track.track(), 1);
        assert_eq!(track.starttime(), track.endtime());
        assert!(track.show().is_none());
        assert_eq!(track.show_name(), "");
    }

    #[test]
    fn test_with_defaults_has_default_metadata() {
        let track = Track::with_defaults();
        assert!(track.has_default_artist());
        assert!(track.has_default_title());
        assert!(track.has_default_metadata());
    }

    #[test]
    fn test_set_track_rejects_zero() {
        let mut track = Track::new();
        assert_eq!(
            track.set_track(0),
            Err(TrackError::InvalidTrackNumber(0))
        );
        assert_eq!(track.track(), 1);

        assert!(track.set_track(7).is_ok());
        assert_eq!(track.track(), 7);
    }

    #[test]
    fn test_set_duration_sixty_seconds() {
        let mut track = Track::new();
        track.set_duration(60);

        assert_eq!(track.duration(), Duration::seconds(60));
        assert_eq!(track.endtime(), track.starttime() + Duration::seconds(60));
    }

    #[test]
    fn test_show_is_shared() {
        let mut show = Show::new();
        show.set_name("Info");
        let show = Arc::new(show);

        let mut first = Track::new();
        let mut second = Track::new();
        first.set_show(show.clone());
        second.set_show(show.clone());

        assert_eq!(first.show_name(), "Info");
        assert!(Arc::ptr_eq(first.show().unwrap(), second.show().unwrap()));
    }

    #[test]
    fn test_uuid_is_unique_per_instance() {
        assert_ne!(Track::new().uuid(), Track::new().uuid());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn prop_duration_matches_seconds(seconds in 0u64..10_000_000) {
            let mut track = Track::new();
            track.set_duration(seconds);
            prop_assert_eq!(track.duration().num_seconds(), seconds as i64);
            prop_assert!(track.endtime() >= track.starttime());
        }
    }
}
