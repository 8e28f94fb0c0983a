//! Song ticker XML feed

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use nowplaying_core::{ObserverError, Show, Track, TrackObserver};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

pub const TICKER_NAMESPACE: &str = "http://rabe.ch/schema/ticker.xsd";
pub const XLINK_NAMESPACE: &str = "http://www.w3.org/1999/xlink";

/// Value of the `creator` element
pub const CREATOR: &str = "now-playing daemon v2";

/// Where and how the ticker feed is written
#[derive(Debug, Clone)]
pub struct TickerConfig {
    pub path: PathBuf,
    /// Zone the timestamps are rendered in
    /// Default: Europe/Zurich
    pub timezone: Tz,
}

impl TickerConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            timezone: chrono_tz::Europe::Zurich,
        }
    }
}

/// Rewrites the ticker file on every track start
pub struct TickerObserver {
    config: TickerConfig,
}

impl TickerObserver {
    pub fn new(config: TickerConfig) -> Self {
        Self { config }
    }

    pub fn path(&self) -> &Path {
        &self.config.path
    }
}

impl TrackObserver for TickerObserver {
    fn name(&self) -> &str {
        "Ticker"
    }

    fn track_started(&self, track: &Track) -> Result<(), ObserverError> {
        tracing::info!(
            "Updating Ticker XML file for track: {} - {}",
            track.artist(),
            track.title()
        );

        let document = render_ticker(track, self.config.timezone, Utc::now())?;
        write_replacing(&self.config.path, &document)
    }
}

/// Write next to the target and rename over it, so readers never see a
/// partial file
fn write_replacing(path: &Path, contents: &[u8]) -> Result<(), ObserverError> {
    let mut staging = path.as_os_str().to_owned();
    staging.push(".tmp");
    let staging = PathBuf::from(staging);

    fs::write(&staging, contents)?;
    fs::rename(&staging, path)?;
    Ok(())
}

fn timestamp(time: DateTime<Utc>, tz: Tz) -> String {
    time.with_timezone(&tz)
        .format("%Y-%m-%dT%H:%M:%S%:z")
        .to_string()
}

/// Render the ticker document for `track`, dated `now`
pub fn render_ticker(track: &Track, tz: Tz, now: DateTime<Utc>) -> Result<Vec<u8>, ObserverError> {
    let show = track
        .show()
        .cloned()
        .unwrap_or_else(|| Arc::new(Show::default()));

    let mut feed = TickerWriter::new();
    feed.declaration()?;

    feed.start(
        BytesStart::new("ticker").with_attributes([
            ("xmlns", TICKER_NAMESPACE),
            ("xmlns:xlink", XLINK_NAMESPACE),
        ]),
    )?;
    feed.text_element("identifier", &format!("ticker-{}", uuid::Uuid::new_v4()))?;
    feed.text_element("creator", CREATOR)?;
    feed.text_element("date", &timestamp(now, tz))?;

    let show_id = show.uuid().to_string();
    feed.start(BytesStart::new("show").with_attributes([("id", show_id.as_str())]))?;
    feed.text_element("name", show.name())?;
    feed.element(
        BytesStart::new("link").with_attributes([
            ("xlink:type", "simple"),
            ("xlink:href", show.url()),
            ("xlink:show", "replace"),
        ]),
        show.url(),
    )?;
    feed.text_element("startTime", &timestamp(show.starttime(), tz))?;
    feed.text_element("endTime", &timestamp(show.endtime(), tz))?;
    feed.end("show")?;

    let track_id = track.uuid().to_string();
    feed.start(BytesStart::new("track").with_attributes([("id", track_id.as_str())]))?;
    feed.element(
        BytesStart::new("show").with_attributes([("ref", show_id.as_str())]),
        show.name(),
    )?;
    feed.text_element("artist", track.artist())?;
    feed.text_element("title", track.title())?;
    feed.text_element("startTime", &timestamp(track.starttime(), tz))?;
    feed.text_element("endTime", &timestamp(track.endtime(), tz))?;
    feed.end("track")?;

    feed.end("ticker")?;
    Ok(feed.finish())
}

struct TickerWriter {
    writer: Writer<Vec<u8>>,
}

impl TickerWriter {
    fn new() -> Self {
        Self {
            writer: Writer::new_with_indent(Vec::new(), b' ', 2),
        }
    }

    fn write(&mut self, event: Event<'_>) -> Result<(), ObserverError> {
        self.writer
            .write_event(event)
            .map_err(|e| ObserverError::Format(e.to_string()))
    }

    fn declaration(&mut self) -> Result<(), ObserverError> {
        self.write(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))
    }

    fn start(&mut self, start: BytesStart<'_>) -> Result<(), ObserverError> {
        self.write(Event::Start(start))
    }

    fn end(&mut self, name: &str) -> Result<(), ObserverError> {
        self.write(Event::End(BytesEnd::new(name)))
    }

    fn element(&mut self, start: BytesStart<'_>, text: &str) -> Result<(), ObserverError> {
        let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
        self.start(start)?;
        self.write(Event::Text(BytesText::new(text)))?;
        self.end(&name)
    }

    fn text_element(&mut self, name: &str, text: &str) -> Result<(), ObserverError> {
        self.element(BytesStart::new(name), text)
    }

    fn finish(self) -> Vec<u8> {
        let mut document = self.writer.into_inner();
        document.push(b'\n');
        document
    }
}
