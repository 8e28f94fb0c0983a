//! Lazily refreshed view of the show on air

use std::sync::{Arc, OnceLock};

use chrono::{DateTime, Duration, Utc};
use regex::{Captures, Regex};

use crate::config::ScheduleConfig;
use crate::error::ScheduleError;
use crate::model::Show;
use crate::schedule::{parse_schedule_time, HttpScheduleSource, ScheduleEntry, ScheduleResponse, ScheduleSource};

/// Caches the current [`Show`] and refreshes it from a [`ScheduleSource`]
///
/// A refresh happens when forced or once the cached show has ended. Each
/// refresh first installs a tentative show that expires after
/// `default_show_duration`, so a failed refresh is retried shortly instead of
/// pinning a broken show.
pub struct ShowClient {
    source: Box<dyn ScheduleSource>,
    config: ScheduleConfig,
    show: Arc<Show>,
}

impl ShowClient {
    /// Create a client backed by the HTTP schedule service in `config`
    pub fn new(config: ScheduleConfig) -> Result<Self, ScheduleError> {
        let source = HttpScheduleSource::new(config.url.clone(), config.request_timeout)?;
        Ok(Self::with_source(source, config))
    }

    /// Create a client backed by any schedule source
    pub fn with_source(source: impl ScheduleSource + 'static, config: ScheduleConfig) -> Self {
        // unresolved and already over, so the first lookup fetches
        let mut show = Show::new();
        let past = show.starttime() - Duration::seconds(1);
        show.set_starttime(past);
        show.set_endtime(past);

        Self {
            source: Box::new(source),
            config,
            show: Arc::new(show),
        }
    }

    /// The cached show, without refreshing
    pub fn show(&self) -> &Arc<Show> {
        &self.show
    }

    /// Whether the cached show has ended at `now`
    pub fn is_stale(&self, now: DateTime<Utc>) -> bool {
        self.show.has_ended(now)
    }

    /// Return the current show, refreshing when forced or stale
    ///
    /// Never fails: refresh errors are logged and the tentative show is
    /// returned.
    pub fn get_show_info(&mut self, force_update: bool) -> Arc<Show> {
        if force_update {
            self.refresh();
        } else if self.is_stale(Utc::now()) {
            tracing::info!("Show expired, going to update show info");
            self.refresh();
        } else {
            tracing::debug!("Show still running, won't update show info");
        }

        self.show.clone()
    }

    fn refresh(&mut self) {
        if let Err(e) = self.update() {
            tracing::error!(error = %e, "Failed to update show info");
        }
    }

    /// Refresh the show from the schedule source
    ///
    /// Transport and decoding failures, an unknown station time zone and an
    /// unreadable next show start are logged and leave the tentative show in
    /// place. Incomplete or stale data for the selected show is returned as
    /// an error, also leaving the tentative show in place.
    pub fn update(&mut self) -> Result<(), ScheduleError> {
        let now = Utc::now();

        let mut tentative = Show::new();
        tentative.set_endtime(now + to_chrono(self.config.default_show_duration));
        self.show = Arc::new(tentative.clone());

        let data = match self.source.fetch() {
            Ok(data) => data,
            Err(e) => {
                tracing::error!(error = %e, "Unable to get current show information");
                return Ok(());
            }
        };
        tracing::debug!(?data, "Got show info");

        let tz = match data.timezone() {
            Ok(tz) => tz,
            Err(e) => {
                tracing::error!(error = %e, "Unable to resolve station time zone");
                return Ok(());
            }
        };

        let Some(show) = self.build_show(&data, tz, tentative, now)? else {
            tracing::warn!("Failed to find a current or upcoming show, bailing out");
            return Ok(());
        };

        tracing::info!(
            name = show.name(),
            start = %show.starttime(),
            end = %show.endtime(),
            "Show started"
        );
        self.show = Arc::new(show);

        Ok(())
    }

    /// Validate the selected record and apply it onto `show`
    ///
    /// Returns `Ok(None)` when no record applies.
    fn build_show(
        &self,
        data: &ScheduleResponse,
        tz: chrono_tz::Tz,
        mut show: Show,
        now: DateTime<Utc>,
    ) -> Result<Option<Show>, ScheduleError> {
        let Some(entry) = self.pick_show(data, tz, now) else {
            return Ok(None);
        };

        if entry.name.is_empty() {
            return Err(ScheduleError::MissingName);
        }
        show.set_name(cleanup_show_name(&entry.name));

        if entry.ends.is_empty() {
            return Err(ScheduleError::MissingEndTime);
        }
        show.set_endtime(parse_schedule_time(&entry.ends, tz)?);

        if entry.starts.is_empty() {
            return Err(ScheduleError::MissingStartTime);
        }
        show.set_starttime(parse_schedule_time(&entry.starts, tz)?);

        if show.endtime() < now {
            return Err(ScheduleError::StaleEndTime {
                endtime: show.endtime(),
            });
        }

        if entry.url.is_empty() {
            tracing::error!(name = show.name(), "No url found");
        } else {
            show.set_url(entry.url.as_str());
        }

        Ok(Some(show))
    }

    /// Prefer the show on air, else the next one if it starts soon enough
    fn pick_show<'a>(
        &self,
        data: &'a ScheduleResponse,
        tz: chrono_tz::Tz,
        now: DateTime<Utc>,
    ) -> Option<&'a ScheduleEntry> {
        if let Some(current) = &data.shows.current {
            return Some(current);
        }

        tracing::info!("No current show is playing, checking next show");
        let next = data.shows.next.as_ref()?;

        let next_start = match parse_schedule_time(&next.starts, tz) {
            Ok(start) => start,
            Err(e) => {
                tracing::error!(name = %next.name, error = %e, "Unable to read next show start");
                return None;
            }
        };
        let horizon = now + to_chrono(self.config.next_show_lookahead);
        if next_start < horizon {
            tracing::info!(name = %next.name, "Next show starts soon enough, using it");
            Some(next)
        } else {
            tracing::info!(name = %next.name, start = %next_start, "Next show starts too late");
            None
        }
    }
}

fn to_chrono(duration: std::time::Duration) -> Duration {
    Duration::from_std(duration).unwrap_or(Duration::MAX)
}

/// Undo HTML character references the schedule service leaves in names
///
/// Unknown references are kept as they are.
pub fn cleanup_show_name(name: &str) -> String {
    static ENTITY: OnceLock<Option<Regex>> = OnceLock::new();
    let Some(entity) = ENTITY.get_or_init(|| Regex::new(r"&#?\w+?;").ok()) else {
        return name.to_string();
    };

    entity
        .replace_all(name, |caps: &Captures| {
            let reference = &caps[0];
            htmlescape::decode_html(reference).unwrap_or_else(|_| reference.to_string())
        })
        .into_owned()
}
