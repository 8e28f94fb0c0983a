//! Main loop tying the selector, the event queue and the inputs together

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use nowplaying_core::{
    Input, InputHandler, SelectorId, SelectorSource, ShowClient, TrackEvent, TrackEventHandler,
};
use nowplaying_observers::{
    DabAudioCompanionObserver, IcecastObserver, SmcFtpObserver, TickerObserver,
};

use crate::options::Config;

/// Name of the input covering every studio source
pub const NON_FALLBACK_INPUT_NAME: &str = "Non-Klangbecken";

/// Polls the selector and feeds readings and queued events to the inputs
pub struct NowPlayingDaemon<S: SelectorSource> {
    selector: S,
    inputs: InputHandler,
    events: mpsc::Receiver<TrackEvent>,
    last_reading: SelectorId,
}

impl<S: SelectorSource> NowPlayingDaemon<S> {
    pub fn new(selector: S, inputs: InputHandler, events: mpsc::Receiver<TrackEvent>) -> Self {
        Self {
            selector,
            inputs,
            events,
            last_reading: SelectorId::KLANGBECKEN,
        }
    }

    pub fn last_reading(&self) -> SelectorId {
        self.last_reading
    }

    pub fn inputs(&self) -> &InputHandler {
        &self.inputs
    }

    /// Read the selector, keeping the previous reading when it has nothing new
    pub fn poll_selector(&mut self) -> SelectorId {
        match self.selector.active_output() {
            Ok(reading) => {
                if reading != self.last_reading {
                    tracing::info!(
                        "Sämubox changed from \"{}\" to \"{}\"",
                        self.last_reading.name(),
                        reading.name()
                    );
                }
                self.last_reading = reading;
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    reading = self.last_reading.value(),
                    "Selector unavailable, keeping last reading"
                );
            }
        }
        self.last_reading
    }

    /// Run one iteration of the main loop
    ///
    /// Every queued event is handled with the current reading, followed by
    /// one plain update. Returns the number of events handled.
    pub fn tick(&mut self) -> usize {
        let reading = self.poll_selector();

        let mut handled = 0;
        while let Ok(event) = self.events.try_recv() {
            tracing::info!(
                "Handling update from event: {}, source: {}",
                event.kind,
                event.source
            );
            self.inputs.update(reading, Some(&event));
            handled += 1;
        }

        self.inputs.update(reading, None);
        handled
    }

    /// Tick every `sleep` until `running` is cleared
    ///
    /// A panicking tick is logged and the loop carries on.
    pub fn run(&mut self, sleep: Duration, running: &AtomicBool) {
        tracing::info!("Starting main loop");
        while running.load(Ordering::SeqCst) {
            match catch_unwind(AssertUnwindSafe(|| self.tick())) {
                Ok(0) => {}
                Ok(handled) => tracing::debug!(handled, "Handled queued events"),
                Err(_) => tracing::error!("Error in main loop iteration"),
            }
            thread::sleep(sleep);
        }
        tracing::info!("Main loop stopped");
    }
}

/// Create the dispatcher with every configured observer
pub fn build_track_handler(config: &Config) -> Result<Arc<TrackEventHandler>> {
    let handler = TrackEventHandler::new();

    for icecast in &config.icecast {
        let observer = IcecastObserver::new(icecast.clone())
            .with_context(|| format!("Failed to set up Icecast observer for {}", icecast.url))?;
        handler.register_observer(Arc::new(observer));
    }

    for url in &config.dab {
        let observer =
            DabAudioCompanionObserver::with_timeout(url, config.dab_send_dls, config.timeout)
                .with_context(|| format!("Failed to set up DAB+ observer for {url}"))?;
        handler.register_observer(Arc::new(observer));
    }

    handler.register_observer(Arc::new(TickerObserver::new(config.ticker.clone())));

    if let Some(smc) = &config.smc {
        handler.register_observer(Arc::new(SmcFtpObserver::new(smc.clone())));
    }

    Ok(Arc::new(handler))
}

/// Create the fallback and studio inputs, both notifying `tracks`
pub fn build_input_handler(
    config: &Config,
    tracks: Arc<TrackEventHandler>,
) -> Result<InputHandler> {
    let mut handler = InputHandler::new();

    let show_client =
        ShowClient::new(config.schedule.clone()).context("Failed to create show client")?;
    let mut fallback = Input::fallback(config.fallback.clone(), show_client);
    fallback.add_track_handler(tracks.clone());
    handler.register_observer(fallback);

    let show_client =
        ShowClient::new(config.schedule.clone()).context("Failed to create show client")?;
    let mut studio = Input::named(
        NON_FALLBACK_INPUT_NAME,
        config.fallback.selector_id,
        show_client,
    );
    studio.add_track_handler(tracks);
    handler.register_observer(studio);

    Ok(handler)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    use nowplaying_core::schedule::{ScheduleResponse, ScheduleSource};
    use nowplaying_core::{
        EventKind, FallbackConfig, ObserverError, ScheduleConfig, ScheduleError, SelectorError,
        Track, TrackEventData, TrackObserver,
    };
    use parking_lot::Mutex;

    struct ScriptedSelector(VecDeque<Result<SelectorId, SelectorError>>);

    impl SelectorSource for ScriptedSelector {
        fn active_output(&mut self) -> Result<SelectorId, SelectorError> {
            self.0.pop_front().unwrap_or(Err(SelectorError::Unavailable))
        }
    }

    struct Unreachable;

    impl ScheduleSource for Unreachable {
        fn fetch(&self) -> Result<ScheduleResponse, ScheduleError> {
            Err(ScheduleError::Unavailable("connection refused".into()))
        }
    }

    #[derive(Default)]
    struct Recorder(Mutex<Vec<(&'static str, String)>>);

    impl TrackObserver for Recorder {
        fn name(&self) -> &str {
            "Recorder"
        }

        fn track_started(&self, track: &Track) -> Result<(), ObserverError> {
            self.0.lock().push(("started", track.title().to_string()));
            Ok(())
        }

        fn track_finished(&self, track: &Track) -> Result<(), ObserverError> {
            self.0.lock().push(("finished", track.title().to_string()));
            Ok(())
        }
    }

    fn show_client() -> ShowClient {
        ShowClient::with_source(Unreachable, ScheduleConfig::new("http://schedule.invalid"))
    }

    fn daemon(
        readings: Vec<Result<SelectorId, SelectorError>>,
    ) -> (
        NowPlayingDaemon<ScriptedSelector>,
        mpsc::Sender<TrackEvent>,
        Arc<Recorder>,
    ) {
        let recorder = Arc::new(Recorder::default());
        let tracks = Arc::new(TrackEventHandler::new());
        tracks.register_observer(recorder.clone());

        let mut inputs = InputHandler::new();
        let mut fallback = Input::fallback(FallbackConfig::events_only(), show_client());
        fallback.add_track_handler(tracks.clone());
        inputs.register_observer(fallback);
        let mut studio = Input::named(NON_FALLBACK_INPUT_NAME, SelectorId::KLANGBECKEN, show_client());
        studio.add_track_handler(tracks);
        inputs.register_observer(studio);

        let (tx, rx) = mpsc::channel();
        let selector = ScriptedSelector(readings.into());
        (NowPlayingDaemon::new(selector, inputs, rx), tx, recorder)
    }

    fn started(title: &str) -> TrackEvent {
        TrackEvent::new(
            "crid://rabe.ch/v1/test",
            FallbackConfig::default().event_source,
            EventKind::Started,
        )
        .with_data(TrackEventData {
            artist: Some("Artist".into()),
            title: Some(title.into()),
            length: Some(60),
        })
    }

    #[test]
    fn test_selector_error_keeps_last_reading() {
        let (mut daemon, _tx, _recorder) = daemon(vec![
            Ok(SelectorId::new(6)),
            Err(SelectorError::Unavailable),
        ]);
        assert_eq!(daemon.last_reading(), SelectorId::KLANGBECKEN);

        assert_eq!(daemon.poll_selector(), SelectorId::new(6));
        assert_eq!(daemon.poll_selector(), SelectorId::new(6));
        assert_eq!(daemon.last_reading(), SelectorId::new(6));
    }

    #[test]
    fn test_tick_drains_queued_events() {
        let (mut daemon, tx, recorder) = daemon(vec![Ok(SelectorId::KLANGBECKEN)]);

        tx.send(started("First")).unwrap();
        tx.send(started("Second")).unwrap();

        assert_eq!(daemon.tick(), 2);
        assert_eq!(
            *recorder.0.lock(),
            vec![
                ("started", "First".to_string()),
                ("finished", "First".to_string()),
                ("started", "Second".to_string()),
            ]
        );

        assert_eq!(daemon.tick(), 0);
        assert_eq!(recorder.0.lock().len(), 3);
    }

    #[test]
    fn test_studio_input_announces_show_once() {
        let (mut daemon, _tx, recorder) = daemon(vec![
            Ok(SelectorId::new(6)),
            Ok(SelectorId::new(6)),
        ]);

        daemon.tick();
        daemon.tick();

        let calls = recorder.0.lock();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "started");
        assert_eq!(calls[0].1, nowplaying_core::DEFAULT_TITLE);
    }

    #[test]
    fn test_run_stops_when_cleared() {
        let (mut daemon, _tx, _recorder) = daemon(vec![]);
        let running = AtomicBool::new(false);

        daemon.run(Duration::from_millis(1), &running);
        assert_eq!(daemon.last_reading(), SelectorId::KLANGBECKEN);
    }

    struct PanicsOnce {
        calls: usize,
        running: Arc<AtomicBool>,
    }

    impl SelectorSource for PanicsOnce {
        fn active_output(&mut self) -> Result<SelectorId, SelectorError> {
            self.calls += 1;
            if self.calls == 1 {
                panic!("selector wire fell out");
            }
            self.running.store(false, Ordering::SeqCst);
            Ok(SelectorId::new(3))
        }
    }

    #[test]
    fn test_run_survives_panicking_tick() {
        let running = Arc::new(AtomicBool::new(true));
        let selector = PanicsOnce {
            calls: 0,
            running: running.clone(),
        };
        let (_tx, rx) = mpsc::channel();
        let mut daemon = NowPlayingDaemon::new(selector, InputHandler::new(), rx);

        daemon.run(Duration::from_millis(1), &running);
        assert_eq!(daemon.last_reading(), SelectorId::new(3));
    }
}
