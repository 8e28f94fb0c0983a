//! Inputs decide which source is on air and announce its tracks
//!
//! Every input receives every selector reading. An input first checks whether
//! the reading (or typed event) concerns it, then detects transitions and
//! notifies the [`TrackEventHandler`].
//!
//! Two kinds exist:
//! - the fallback input, fed by the playout automation through typed events
//!   or the legacy now-playing file, and always attributed to its own show
//! - named inputs, which only know the show on air and announce one
//!   placeholder track per show

mod fallback;
mod handler;
mod named;
pub mod now_playing;

use std::sync::Arc;

use uuid::Uuid;

use crate::config::FallbackConfig;
use crate::error::InputError;
use crate::model::{SelectorId, Show, TrackEvent};
use crate::show_client::ShowClient;
use crate::track_handler::TrackEventHandler;

pub use fallback::FallbackState;
pub use handler::InputHandler;
pub use named::NamedState;

/// Per-input state shared by all kinds
pub struct InputSession {
    name: String,
    previous_reading: Option<SelectorId>,
    first_run: bool,
    previous_show_id: Option<Uuid>,
    show_client: ShowClient,
    show: Arc<Show>,
    track_handler: Option<Arc<TrackEventHandler>>,
}

impl InputSession {
    fn new(name: impl Into<String>, show_client: ShowClient) -> Self {
        let show = show_client.show().clone();
        Self {
            name: name.into(),
            previous_reading: None,
            first_run: true,
            previous_show_id: None,
            show_client,
            show,
            track_handler: None,
        }
    }

    fn track_handler(&self) -> Result<Arc<TrackEventHandler>, InputError> {
        self.track_handler
            .clone()
            .ok_or_else(|| InputError::MissingTrackHandler(self.name.clone()))
    }

    fn record_reading(&mut self, reading: SelectorId) -> bool {
        let changed = self.previous_reading != Some(reading);
        if changed {
            tracing::info!(
                input = %self.name,
                from = ?self.previous_reading.map(|r| r.value()),
                to = reading.value(),
                "Selector reading changed"
            );
        }
        self.previous_reading = Some(reading);
        changed
    }
}

/// Kind specific state
pub enum InputKind {
    Fallback(FallbackState),
    Named(NamedState),
}

/// A logical audio source
pub struct Input {
    session: InputSession,
    kind: InputKind,
}

impl Input {
    /// The automation input that takes over when nothing else is on air
    pub fn fallback(config: FallbackConfig, show_client: ShowClient) -> Self {
        let name = config.show_name.clone();
        Self {
            session: InputSession::new(name, show_client),
            kind: InputKind::Fallback(FallbackState::new(config)),
        }
    }

    /// An input without track metadata, attributed to the scheduled show
    pub fn named(
        name: impl Into<String>,
        fallback_id: SelectorId,
        show_client: ShowClient,
    ) -> Self {
        Self {
            session: InputSession::new(name, show_client),
            kind: InputKind::Named(NamedState::new(fallback_id)),
        }
    }

    pub fn name(&self) -> &str {
        &self.session.name
    }

    pub fn kind(&self) -> &InputKind {
        &self.kind
    }

    /// Show this input last resolved or announced
    pub fn show(&self) -> &Arc<Show> {
        &self.session.show
    }

    pub fn is_first_run(&self) -> bool {
        self.session.first_run
    }

    pub fn previous_reading(&self) -> Option<SelectorId> {
        self.session.previous_reading
    }

    /// Set the dispatcher this input notifies; required before [`Input::update`]
    pub fn add_track_handler(&mut self, handler: Arc<TrackEventHandler>) {
        self.session.track_handler = Some(handler);
    }

    /// Process one selector reading, optionally with a typed event
    pub fn update(
        &mut self,
        reading: SelectorId,
        event: Option<&TrackEvent>,
    ) -> Result<(), InputError> {
        if self.handle_id_or_handles(reading, event) {
            self.handle(event)?;
        }
        Ok(())
    }

    /// Whether this input is responsible for `reading` or `event`
    pub fn handle_id_or_handles(
        &mut self,
        reading: SelectorId,
        event: Option<&TrackEvent>,
    ) -> bool {
        match &mut self.kind {
            InputKind::Fallback(state) => state.handle_id_or_handles(&mut self.session, reading, event),
            InputKind::Named(state) => state.handle_id_or_handles(&mut self.session, reading),
        }
    }

    /// Detect a transition and notify the track handler
    pub fn handle(&mut self, event: Option<&TrackEvent>) -> Result<(), InputError> {
        match &mut self.kind {
            InputKind::Fallback(state) => state.handle(&mut self.session, event),
            InputKind::Named(state) => state.handle(&mut self.session),
        }
    }
}
