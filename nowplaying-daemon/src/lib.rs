//! Now-playing daemon
//!
//! Wires the pieces of the coordinator into one process:
//!
//! | Part | Module |
//! |------|--------|
//! | Command line and environment options | [`options`] |
//! | Sämubox UDP selector | [`saemubox`] |
//! | Main loop and observer setup | [`daemon`] |
//!
//! The webhook server runs on its own thread and hands typed track events to
//! the main loop through a channel; everything else runs on the main thread.

pub mod daemon;
pub mod options;
pub mod saemubox;

pub use daemon::{build_input_handler, build_track_handler, NowPlayingDaemon};
pub use options::{Args, Config};
pub use saemubox::{parse_datagram, SaemuBox, SaemuBoxConfig, SAEMUBOX_PORT};
