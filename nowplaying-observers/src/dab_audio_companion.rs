//! DAB+ dynamic label updates through the Audio Companion API

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use nowplaying_core::{ObserverError, Track, TrackObserver};

use crate::http::{build_client, song_string, DEFAULT_TIMEOUT};

/// Path of the DLS endpoint below the base URL
pub const SET_DLS_PATH: &str = "/api/setDLS";

/// Sends DLS, and optionally DL Plus tags, to the Audio Companion
///
/// With DL Plus enabled, tracks with real metadata are sent as separate
/// `artist` and `title` fields so the encoder can tag them. The first
/// default-metadata track after such a frame carries delete tags so stale
/// artist and title tags disappear from receivers.
pub struct DabAudioCompanionObserver {
    url: String,
    dl_plus: bool,
    last_frame_was_dl_plus: AtomicBool,
    client: reqwest::blocking::Client,
}

impl DabAudioCompanionObserver {
    pub fn new(base_url: &str, dl_plus: bool) -> Result<Self, ObserverError> {
        Self::with_timeout(base_url, dl_plus, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(
        base_url: &str,
        dl_plus: bool,
        timeout: Duration,
    ) -> Result<Self, ObserverError> {
        let url = format!("{}{}", base_url.trim_end_matches('/'), SET_DLS_PATH);
        tracing::info!(
            "DAB+ Audio Companion initialised with URL: {}, DL+ enabled: {}",
            url,
            dl_plus
        );

        Ok(Self {
            url,
            dl_plus,
            last_frame_was_dl_plus: AtomicBool::new(dl_plus),
            client: build_client(timeout)?,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn last_frame_was_dl_plus(&self) -> bool {
        self.last_frame_was_dl_plus.load(Ordering::SeqCst)
    }

    /// Form fields for the next DL Plus frame. Updates the frame state.
    fn dl_plus_form(&self, track: &Track) -> Vec<(&'static str, String)> {
        if !track.has_default_artist() && !track.has_default_title() {
            self.last_frame_was_dl_plus.store(true, Ordering::SeqCst);
            return vec![
                ("artist", track.artist().to_string()),
                ("title", track.title().to_string()),
            ];
        }

        let message = format!("{} - {}", track.artist(), track.show_name());

        if self.last_frame_was_dl_plus.swap(false, Ordering::SeqCst) {
            tracing::info!("Track has default info, using show instead. Sending DL+ delete tags.");
            vec![("dls", dl_plus_delete_message(&message))]
        } else {
            tracing::info!("Track has default info, using show instead");
            vec![("dls", message)]
        }
    }

    fn send_plain(&self, track: &Track) -> Result<reqwest::blocking::Response, reqwest::Error> {
        let dls = song_string(track);
        tracing::info!("DAB+ Audio Companion URL: {} dls: {}", self.url, dls);
        self.client.get(&self.url).query(&[("dls", dls)]).send()
    }

    fn send_dl_plus(&self, track: &Track) -> Result<reqwest::blocking::Response, reqwest::Error> {
        let form = self.dl_plus_form(track);
        tracing::info!("DAB+ Audio Companion URL: {} data: {:?}", self.url, form);
        self.client.post(&self.url).form(&form).send()
    }
}

/// DLS text with a DL Plus parameter block that deletes the artist (1) and
/// title (4) tags, followed by `message`
pub fn dl_plus_delete_message(message: &str) -> String {
    let position = message
        .chars()
        .position(|c| c == ' ')
        .map_or(-1, |p| p as i64);

    format!(
        "##### parameters {{ #####\n\
         DL_PLUS=1\n\
         DL_PLUS_TAG=1 {position} 0\n\
         DL_PLUS_TAG=4 {position} 0\n\
         ##### parameters }} #####\n\
         {message}"
    )
}

impl TrackObserver for DabAudioCompanionObserver {
    fn name(&self) -> &str {
        "DAB+ Audio Companion"
    }

    fn track_started(&self, track: &Track) -> Result<(), ObserverError> {
        tracing::info!(
            "Updating DAB+ DLS for track: {} - {}",
            track.artist(),
            track.title()
        );

        let result = if self.dl_plus {
            self.send_dl_plus(track)
        } else {
            self.send_plain(track)
        };

        match result {
            Ok(response) if response.status() == reqwest::StatusCode::OK => {}
            Ok(response) => {
                let status = response.status();
                let body = response.text().unwrap_or_default();
                tracing::error!(
                    "DAB+ Audio Companion API call failed with {}: {}",
                    status,
                    body
                );
            }
            Err(e) => {
                tracing::error!("DAB+ Audio Companion request to {} failed: {}", self.url, e);
            }
        }

        Ok(())
    }
}
