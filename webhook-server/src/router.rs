//! Event routing for webhook deliveries.
//!
//! The `EventRouter` decides whether a validated CloudEvent is forwarded to
//! the daemon's event queue, acknowledged and dropped, or refused.

use std::collections::HashSet;
use std::sync::mpsc;
use std::sync::Arc;

use nowplaying_core::TrackEvent;

use crate::cloudevent::CloudEvent;
use crate::config::WebhookConfig;
use crate::error::EnvelopeError;

/// What happened to a routed event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteOutcome {
    /// Handed to the event queue
    Enqueued,
    /// Type not accepted, acknowledged without effect
    Ignored,
    /// The queue's receiver is gone, the event was dropped
    Dropped,
}

/// Routes validated CloudEvents to the daemon's event queue.
#[derive(Clone)]
pub struct EventRouter {
    /// Event types forwarded to the queue
    accepted_types: Arc<HashSet<String>>,
    /// Required CRID authority, if any
    crid_authority: Option<Arc<str>>,
    /// Sending half of the event queue
    event_sender: mpsc::Sender<TrackEvent>,
}

impl EventRouter {
    /// Create a router that accepts the given types
    pub fn new(
        accepted_types: impl IntoIterator<Item = String>,
        crid_authority: Option<String>,
        event_sender: mpsc::Sender<TrackEvent>,
    ) -> Self {
        Self {
            accepted_types: Arc::new(accepted_types.into_iter().collect()),
            crid_authority: crid_authority.map(Arc::from),
            event_sender,
        }
    }

    pub fn from_config(config: &WebhookConfig, event_sender: mpsc::Sender<TrackEvent>) -> Self {
        Self::new(
            config.accepted_types.iter().cloned(),
            config.crid_authority.clone(),
            event_sender,
        )
    }

    pub fn accepts(&self, event_type: &str) -> bool {
        self.accepted_types.contains(event_type)
    }

    /// Validate and forward an event.
    ///
    /// The CRID check applies to every event, accepted or not. Accepted
    /// types must decode into a [`TrackEvent`].
    pub fn route(&self, event: &CloudEvent) -> Result<RouteOutcome, EnvelopeError> {
        if let Some(authority) = &self.crid_authority {
            event.check_crid(authority)?;
        }

        if !self.accepts(&event.event_type) {
            tracing::debug!(
                id = %event.id,
                event_type = %event.event_type,
                "Ignoring event of unaccepted type"
            );
            return Ok(RouteOutcome::Ignored);
        }

        let Some(track_event) = event.to_track_event()? else {
            tracing::debug!(
                id = %event.id,
                event_type = %event.event_type,
                "Accepted type is not a track event"
            );
            return Ok(RouteOutcome::Ignored);
        };

        match self.event_sender.send(track_event) {
            Ok(()) => {
                tracing::debug!(id = %event.id, "Event enqueued");
                Ok(RouteOutcome::Enqueued)
            }
            Err(_) => {
                tracing::warn!(id = %event.id, "Event queue closed, dropping event");
                Ok(RouteOutcome::Dropped)
            }
        }
    }
}
