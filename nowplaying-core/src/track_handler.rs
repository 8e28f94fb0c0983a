//! Fan-out of track lifecycle notifications to downstream observers

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::ObserverError;
use crate::model::Track;

/// A downstream publisher notified about track changes
///
/// Implementations handle their own transport errors. Anything they do
/// return, or any panic, is logged by the [`TrackEventHandler`] and does not
/// affect other observers.
pub trait TrackObserver: Send + Sync {
    /// Name used in logs
    fn name(&self) -> &str;

    fn track_started(&self, track: &Track) -> Result<(), ObserverError>;

    fn track_finished(&self, _track: &Track) -> Result<(), ObserverError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
enum Notification {
    Started,
    Finished,
}

impl Notification {
    fn as_str(self) -> &'static str {
        match self {
            Notification::Started => "track_started",
            Notification::Finished => "track_finished",
        }
    }
}

/// Delivers track notifications to every registered observer in order
///
/// Delivery is sequential on the calling thread. Registering the same
/// observer twice delivers every notification twice unless the handler was
/// built with [`TrackEventHandler::deduplicating`].
#[derive(Default)]
pub struct TrackEventHandler {
    observers: RwLock<Vec<Arc<dyn TrackObserver>>>,
    deduplicate: bool,
}

impl TrackEventHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// A handler that ignores repeated registration of the same observer
    pub fn deduplicating() -> Self {
        Self {
            observers: RwLock::new(Vec::new()),
            deduplicate: true,
        }
    }

    pub fn register_observer(&self, observer: Arc<dyn TrackObserver>) {
        let mut observers = self.observers.write();
        if self.deduplicate && observers.iter().any(|o| same_observer(o, &observer)) {
            tracing::debug!(observer = observer.name(), "Observer already registered");
            return;
        }
        tracing::info!(observer = observer.name(), "Registering observer");
        observers.push(observer);
    }

    /// Remove the first registration of `observer`
    ///
    /// Returns whether a registration was removed.
    pub fn remove_observer(&self, observer: &Arc<dyn TrackObserver>) -> bool {
        let mut observers = self.observers.write();
        match observers.iter().position(|o| same_observer(o, observer)) {
            Some(index) => {
                observers.remove(index);
                tracing::info!(observer = observer.name(), "Removed observer");
                true
            }
            None => false,
        }
    }

    /// Snapshot of the registered observers in delivery order
    pub fn observers(&self) -> Vec<Arc<dyn TrackObserver>> {
        self.observers.read().clone()
    }

    pub fn len(&self) -> usize {
        self.observers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.read().is_empty()
    }

    pub fn track_started(&self, track: &Track) {
        tracing::info!(track = %track, "Sending track-started event");
        self.notify(Notification::Started, track);
    }

    pub fn track_finished(&self, track: &Track) {
        tracing::info!(track = %track, "Sending track-finished event");
        self.notify(Notification::Finished, track);
    }

    fn notify(&self, notification: Notification, track: &Track) {
        // the lock is released before delivery so observers may re-register
        for observer in self.observers() {
            let result = catch_unwind(AssertUnwindSafe(|| match notification {
                Notification::Started => observer.track_started(track),
                Notification::Finished => observer.track_finished(track),
            }));

            match result {
                Ok(Ok(())) => {}
                Ok(Err(e)) => tracing::error!(
                    observer = observer.name(),
                    event = notification.as_str(),
                    track = %track.uuid(),
                    error = %e,
                    "Observer failed"
                ),
                Err(panic) => tracing::error!(
                    observer = observer.name(),
                    event = notification.as_str(),
                    track = %track.uuid(),
                    panic = panic_message(&*panic),
                    "Observer panicked"
                ),
            }
        }
    }
}

fn same_observer(a: &Arc<dyn TrackObserver>, b: &Arc<dyn TrackObserver>) -> bool {
    std::ptr::eq(Arc::as_ptr(a) as *const (), Arc::as_ptr(b) as *const ())
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> &str {
    panic
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}
