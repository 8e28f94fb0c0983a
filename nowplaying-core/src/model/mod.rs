//! Model types for the now-playing core

mod event;
mod selector;
mod show;
mod track;

pub use event::{EventKind, TrackEvent, TrackEventData, TRACK_FINISHED_TYPE, TRACK_STARTED_TYPE};
pub use selector::{SelectorId, SelectorSource};
pub use show::{Show, DEFAULT_SHOW_URL};
pub use track::{Track, DEFAULT_ARTIST, DEFAULT_TITLE};
