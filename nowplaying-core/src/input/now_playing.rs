//! Legacy now-playing XML written by the playout automation
//!
//! ```xml
//! <now-playing>
//!   <song timestamp="2024-03-01T12:00:00">
//!     <artist>Artist</artist>
//!     <title>Title</title>
//!     <album>Album</album>
//!     <track>3</track>
//!     <time>180</time>
//!   </song>
//! </now-playing>
//! ```
//!
//! Only the first `<song>` is read. Its timestamp carries no offset and is
//! taken as the host's local time.

use std::path::Path;

use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use serde::Deserialize;

use crate::error::NowPlayingFileError;
use crate::model::{Track, DEFAULT_ARTIST, DEFAULT_TITLE};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

#[derive(Debug, Deserialize)]
struct Document {
    #[serde(rename = "song", default)]
    songs: Vec<Song>,
}

#[derive(Debug, Deserialize)]
struct Song {
    #[serde(rename = "@timestamp")]
    timestamp: Option<String>,
    artist: Option<Element>,
    title: Option<Element>,
    album: Option<Element>,
    track: Option<Element>,
    time: Option<Element>,
}

#[derive(Debug, Deserialize)]
struct Element {
    #[serde(rename = "$text", default)]
    value: String,
}

impl Song {
    fn is_empty(&self) -> bool {
        self.artist.is_none()
            && self.title.is_none()
            && self.album.is_none()
            && self.track.is_none()
            && self.time.is_none()
    }
}

/// Read the first song of the now-playing file at `path`
pub fn read_now_playing(path: &Path) -> Result<Track, NowPlayingFileError> {
    let xml = std::fs::read_to_string(path)?;
    parse_now_playing(&xml)
}

/// Parse the first song of a now-playing document
pub fn parse_now_playing(xml: &str) -> Result<Track, NowPlayingFileError> {
    let document: Document =
        quick_xml::de::from_str(xml).map_err(|e| NowPlayingFileError::Xml(e.to_string()))?;

    let song = document
        .songs
        .into_iter()
        .next()
        .filter(|song| !song.is_empty())
        .ok_or(NowPlayingFileError::MissingSong)?;

    let artist = element_value(&song.artist, "artist")?;
    let title = element_value(&song.title, "title")?;
    let album = element_value(&song.album, "album")?;
    let number = element_value(&song.track, "track")?;
    let time = element_value(&song.time, "time")?;

    let timestamp = song
        .timestamp
        .as_deref()
        .ok_or(NowPlayingFileError::MissingTimestamp)?;

    let mut track = Track::new();
    track.set_artist(artist.unwrap_or(DEFAULT_ARTIST));
    track.set_title(title.unwrap_or(DEFAULT_TITLE));
    track.set_album(album.unwrap_or_default());

    if let Some(number) = number {
        match number.parse::<u32>() {
            Ok(n) => {
                if let Err(e) = track.set_track(n) {
                    tracing::debug!(error = %e, "Ignoring track number");
                }
            }
            Err(_) => tracing::debug!(number, "Ignoring non-numeric track number"),
        }
    }

    track.set_starttime(parse_timestamp(timestamp)?);

    let time = time.unwrap_or_default();
    let seconds = time
        .parse::<u64>()
        .map_err(|_| NowPlayingFileError::InvalidDuration(time.to_string()))?;
    track.set_duration(seconds);

    Ok(track)
}

/// Trimmed text of a required element, `None` when it is empty
fn element_value<'a>(
    element: &'a Option<Element>,
    name: &'static str,
) -> Result<Option<&'a str>, NowPlayingFileError> {
    let element = element
        .as_ref()
        .ok_or(NowPlayingFileError::MissingElement(name))?;

    let value = element.value.trim();
    if value.is_empty() {
        tracing::info!(element = name, "Element has empty value, ignoring");
        Ok(None)
    } else {
        Ok(Some(value))
    }
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, NowPlayingFileError> {
    if let Ok(with_offset) = DateTime::parse_from_rfc3339(value) {
        return Ok(with_offset.with_timezone(&Utc));
    }

    let naive = NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT)
        .map_err(|_| NowPlayingFileError::InvalidTimestamp(value.to_string()))?;

    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|t| t.with_timezone(&Utc))
        .ok_or_else(|| NowPlayingFileError::InvalidTimestamp(value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use std::io::Write;

    const SONG: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<now-playing>
  <song timestamp="2024-03-01T12:00:00+01:00">
    <artist>Hairmare</artist>
    <title>Climbing Walls</title>
    <album>Ascent</album>
    <track>3</track>
    <time>180</time>
  </song>
  <song timestamp="2024-03-01T11:57:00+01:00">
    <artist>Earlier</artist>
    <title>Song</title>
    <album></album>
    <track></track>
    <time>10</time>
  </song>
</now-playing>"#;

    #[test]
    fn test_parse_first_song() {
        let track = parse_now_playing(SONG).unwrap();

        assert_eq!(track.artist(), "Hairmare");
        assert_eq!(track.title(), "Climbing Walls");
        assert_eq!(track.album(), "Ascent");
        assert_eq!(track.track(), 3);
        assert_eq!(
            track.starttime(),
            DateTime::parse_from_rfc3339("2024-03-01T11:00:00Z").unwrap()
        );
        assert_eq!(track.duration(), Duration::seconds(180));
    }

    #[test]
    fn test_empty_elements_keep_defaults() {
        let xml = r#"<now-playing><song timestamp="2024-03-01T12:00:00+00:00">
            <artist></artist><title/><album></album><track></track><time>30</time>
        </song></now-playing>"#;

        let track = parse_now_playing(xml).unwrap();
        assert!(track.has_default_artist());
        assert!(track.has_default_title());
        assert_eq!(track.album(), "");
        assert_eq!(track.track(), 1);
    }

    #[test]
    fn test_local_timestamp() {
        let xml = r#"<now-playing><song timestamp="2024-06-01T12:00:00">
            <artist>A</artist><title>T</title><album/><track/><time>1</time>
        </song></now-playing>"#;

        let track = parse_now_playing(xml).unwrap();
        let naive = NaiveDateTime::parse_from_str("2024-06-01T12:00:00", TIMESTAMP_FORMAT).unwrap();
        let expected = Local.from_local_datetime(&naive).earliest().unwrap();
        assert_eq!(track.starttime(), expected.with_timezone(&Utc));
    }

    #[test]
    fn test_missing_song() {
        let result = parse_now_playing("<now-playing></now-playing>");
        assert!(matches!(result, Err(NowPlayingFileError::MissingSong)));
    }

    #[test]
    fn test_missing_element() {
        let xml = r#"<now-playing><song timestamp="2024-03-01T12:00:00+00:00">
            <artist>A</artist><title>T</title><album/><track/>
        </song></now-playing>"#;
        let result = parse_now_playing(xml);
        assert!(matches!(
            result,
            Err(NowPlayingFileError::MissingElement("time"))
        ));
    }

    #[test]
    fn test_missing_timestamp() {
        let xml = r#"<now-playing><song>
            <artist>A</artist><title>T</title><album/><track/><time>1</time>
        </song></now-playing>"#;
        let result = parse_now_playing(xml);
        assert!(matches!(result, Err(NowPlayingFileError::MissingTimestamp)));
    }

    #[test]
    fn test_invalid_duration() {
        let xml = r#"<now-playing><song timestamp="2024-03-01T12:00:00+00:00">
            <artist>A</artist><title>T</title><album/><track/><time>soon</time>
        </song></now-playing>"#;
        let result = parse_now_playing(xml);
        assert!(matches!(result, Err(NowPlayingFileError::InvalidDuration(_))));
    }

    #[test]
    fn test_read_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SONG.as_bytes()).unwrap();

        let track = read_now_playing(file.path()).unwrap();
        assert_eq!(track.artist(), "Hairmare");
    }

    #[test]
    fn test_read_missing_file() {
        let result = read_now_playing(Path::new("/nonexistent/now-playing.xml"));
        assert!(matches!(result, Err(NowPlayingFileError::Io(_))));
    }
}
