//! Core of the now-playing coordinator
//!
//! Decides which audio source is on air and what it is playing, then fans
//! track changes out to downstream observers.
//!
//! The pieces, leaves first:
//! - [`Track`] and [`Show`]: value records with default sentinels for
//!   unknown metadata
//! - [`ShowClient`]: lazily refreshed cache of the scheduled show
//! - [`Input`] and [`InputHandler`]: per-source transition detection driven
//!   by selector readings and typed [`TrackEvent`]s
//! - [`TrackEventHandler`]: failure isolating fan-out to [`TrackObserver`]s
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use nowplaying_core::{
//!     FallbackConfig, Input, InputHandler, ScheduleConfig, SelectorId, ShowClient,
//!     TrackEventHandler,
//! };
//!
//! let tracks = Arc::new(TrackEventHandler::new());
//! tracks.register_observer(my_observer);
//!
//! let schedule = ScheduleConfig::new("https://schedule.example/live-info");
//! let mut fallback = Input::fallback(FallbackConfig::default(), ShowClient::new(schedule.clone())?);
//! fallback.add_track_handler(tracks.clone());
//! let mut studio = Input::named("Studio", SelectorId::KLANGBECKEN, ShowClient::new(schedule)?);
//! studio.add_track_handler(tracks);
//!
//! let mut inputs = InputHandler::new();
//! inputs.register_observer(fallback);
//! inputs.register_observer(studio);
//!
//! inputs.update(SelectorId::new(2), None);
//! ```

pub mod config;
pub mod error;
pub mod input;
pub mod logging;
pub mod model;
pub mod schedule;
pub mod show_client;
pub mod track_handler;

pub use config::{FallbackConfig, ScheduleConfig};
pub use error::{
    InputError, NowPlayingFileError, ObserverError, ScheduleError, SelectorError, TrackError,
};
pub use input::{Input, InputHandler, InputKind};
pub use model::{
    EventKind, SelectorId, SelectorSource, Show, Track, TrackEvent, TrackEventData,
    DEFAULT_ARTIST, DEFAULT_SHOW_URL, DEFAULT_TITLE, TRACK_FINISHED_TYPE, TRACK_STARTED_TYPE,
};
pub use schedule::{HttpScheduleSource, ScheduleSource};
pub use show_client::ShowClient;
pub use track_handler::{TrackEventHandler, TrackObserver};
