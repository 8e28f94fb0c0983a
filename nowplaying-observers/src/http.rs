//! Shared blocking HTTP client setup

use std::time::Duration;

use nowplaying_core::{ObserverError, Track};

/// Request timeout used by the HTTP observers
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

pub(crate) fn build_client(timeout: Duration) -> Result<reqwest::blocking::Client, ObserverError> {
    reqwest::blocking::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("nowplaying/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| ObserverError::Http(e.to_string()))
}

/// `<artist> - <title>`, with the show name standing in for the title when
/// the track carries no real metadata
pub(crate) fn song_string(track: &Track) -> String {
    if track.has_default_metadata() {
        tracing::info!("Track has default info, using show instead");
        format!("{} - {}", track.artist(), track.show_name())
    } else {
        format!("{} - {}", track.artist(), track.title())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use nowplaying_core::Show;

    #[test]
    fn test_song_string() {
        let mut track = Track::new();
        track.set_artist("Artist");
        track.set_title("Title");
        assert_eq!(song_string(&track), "Artist - Title");
    }

    #[test]
    fn test_song_string_uses_show_for_default_metadata() {
        let mut show = Show::new();
        show.set_name("Info");

        let mut track = Track::with_defaults();
        track.set_show(Arc::new(show));
        assert_eq!(song_string(&track), "Radio Bern - Info");
    }

    #[test]
    fn test_build_client() {
        assert!(build_client(DEFAULT_TIMEOUT).is_ok());
    }
}
