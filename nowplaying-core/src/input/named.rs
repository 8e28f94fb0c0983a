use super::InputSession;
use crate::error::InputError;
use crate::model::{SelectorId, Track};

/// State of an input that only knows the scheduled show
pub struct NamedState {
    fallback_id: SelectorId,
}

impl NamedState {
    pub(super) fn new(fallback_id: SelectorId) -> Self {
        Self { fallback_id }
    }

    pub fn fallback_id(&self) -> SelectorId {
        self.fallback_id
    }

    /// Force a schedule refresh whenever the reading changes, then claim
    /// every reading that is not the fallback's
    pub(super) fn handle_id_or_handles(
        &mut self,
        session: &mut InputSession,
        reading: SelectorId,
    ) -> bool {
        if session.record_reading(reading) {
            session.show = session.show_client.get_show_info(true);
        }

        reading != self.fallback_id
    }

    /// Announce a placeholder track once per show
    pub(super) fn handle(&mut self, session: &mut InputSession) -> Result<(), InputError> {
        let handler = session.track_handler()?;

        session.show = session.show_client.get_show_info(false);

        if session.previous_show_id == Some(session.show.uuid()) {
            return Ok(());
        }

        tracing::info!(input = %session.name, show = session.show.name(), "Show changed");

        let mut track = Track::with_defaults();
        track.set_starttime(session.show.starttime());
        track.set_endtime(session.show.endtime());
        track.set_show(session.show.clone());

        handler.track_started(&track);
        session.previous_show_id = Some(session.show.uuid());
        session.first_run = false;

        Ok(())
    }
}
