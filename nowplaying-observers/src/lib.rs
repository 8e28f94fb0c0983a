//! Downstream publishers for the now-playing coordinator
//!
//! Every observer implements [`nowplaying_core::TrackObserver`] and reacts to
//! `track_started`. Finished notifications are accepted and ignored.
//!
//! - [`IcecastObserver`]: metadata update on an Icecast mountpoint
//! - [`DabAudioCompanionObserver`]: DLS and DL Plus through the Audio Companion API
//! - [`SmcFtpObserver`]: DLS and DL Plus files on the SMC FTP server
//! - [`TickerObserver`]: XML song ticker feed on disk
//!
//! HTTP observers log transport failures and carry on. File and FTP
//! failures are returned to the dispatcher, which logs them.

pub mod dab_audio_companion;
pub mod http;
pub mod icecast;
pub mod smc_ftp;
pub mod ticker;

pub use dab_audio_companion::DabAudioCompanionObserver;
pub use http::DEFAULT_TIMEOUT;
pub use icecast::{parse_icecast_url, IcecastConfig, IcecastObserver, IcecastUrl};
pub use smc_ftp::{DlsUploader, FtpUploader, SmcFtpConfig, SmcFtpObserver};
pub use ticker::{TickerConfig, TickerObserver};
