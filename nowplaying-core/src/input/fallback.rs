use std::sync::Arc;
use std::time::SystemTime;

use super::now_playing::read_now_playing;
use super::InputSession;
use crate::config::FallbackConfig;
use crate::error::{InputError, NowPlayingFileError};
use crate::model::{SelectorId, Show, Track, TrackEvent};

/// State of the automation input
pub struct FallbackState {
    config: FallbackConfig,
    last_modify_time: Option<SystemTime>,
    // set once the file has been read, successfully or not
    file_seen: bool,
    current_track: Option<Track>,
}

impl FallbackState {
    pub(super) fn new(config: FallbackConfig) -> Self {
        let last_modify_time = config
            .now_playing_file
            .as_deref()
            .and_then(|path| std::fs::metadata(path).and_then(|m| m.modified()).ok());

        Self {
            config,
            last_modify_time,
            file_seen: false,
            current_track: None,
        }
    }

    pub fn config(&self) -> &FallbackConfig {
        &self.config
    }

    /// Track announced last, not yet finished
    pub fn current_track(&self) -> Option<&Track> {
        self.current_track.as_ref()
    }

    pub(super) fn handle_id_or_handles(
        &mut self,
        session: &mut InputSession,
        reading: SelectorId,
        event: Option<&TrackEvent>,
    ) -> bool {
        session.record_reading(reading);

        if reading == self.config.selector_id {
            return true;
        }

        event.is_some_and(|e| e.source == self.config.event_source)
    }

    pub(super) fn handle(
        &mut self,
        session: &mut InputSession,
        event: Option<&TrackEvent>,
    ) -> Result<(), InputError> {
        let handler = session.track_handler()?;

        let modify_time = match event {
            Some(_) => None,
            None => self.modify_time()?,
        };

        let changed = event.is_some()
            || match modify_time {
                Some(time) => !self.file_seen || Some(time) > self.last_modify_time,
                None => false,
            };

        if !changed {
            return Ok(());
        }

        match event {
            Some(e) => tracing::info!(event = %e.id, kind = %e.kind, "Track event received"),
            None => tracing::info!("Now playing file changed"),
        }

        session.show = session.show_client.get_show_info(false);

        if modify_time.is_some() {
            self.last_modify_time = modify_time;
            self.file_seen = true;
        }

        if let Some(previous) = self.current_track.take() {
            handler.track_finished(&previous);
        }

        let mut track = match (event, self.config.now_playing_file.as_deref()) {
            (Some(e), _) => e.to_track(),
            (None, Some(path)) => read_now_playing(path)?,
            (None, None) => return Ok(()),
        };

        if session.show.name() != self.config.show_name {
            tracing::info!(
                current = session.show.name(),
                forced = %self.config.show_name,
                "Fallback input active, overriding current show"
            );
        }

        let mut show = Show::new();
        show.set_name(self.config.show_name.as_str());
        show.set_url(self.config.show_url.as_str());
        // nothing tells us how long the automation stays on air
        show.set_endtime(track.endtime());
        let show = Arc::new(show);

        track.set_show(show.clone());
        session.show = show;
        session.previous_show_id = Some(session.show.uuid());

        handler.track_started(&track);
        self.current_track = Some(track);
        session.first_run = false;

        Ok(())
    }

    /// Modification time of the now-playing file, if one is configured
    fn modify_time(&self) -> Result<Option<SystemTime>, NowPlayingFileError> {
        match self.config.now_playing_file.as_deref() {
            Some(path) => Ok(Some(std::fs::metadata(path)?.modified()?)),
            None => Ok(None),
        }
    }
}
