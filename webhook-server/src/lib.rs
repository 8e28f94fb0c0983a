//! CloudEvents webhook receiver for the now-playing daemon.
//!
//! Playout systems announce track changes by POSTing CloudEvents in
//! structured JSON mode to `/webhook`. This crate validates them and hands
//! accepted track events to the daemon over a `std::sync::mpsc` channel.
//!
//! # Overview
//!
//! - [`WebhookServer`]: warp server on a dedicated thread with its own
//!   current-thread runtime, so callers stay synchronous
//! - [`EventRouter`]: CRID check, type allow-list and queue hand-off
//! - [`CloudEvent`]: envelope decoding and validation
//! - [`BasicAuth`]: `Authorization: Basic` verification
//!
//! # Responses
//!
//! | Condition                               | Status |
//! |-----------------------------------------|--------|
//! | accepted or ignored event               | 200    |
//! | invalid envelope or foreign CRID        | 400    |
//! | missing or wrong credentials            | 401    |
//! | any other path or method                | 404    |
//! | unsupported `Content-Type`              | 415    |
//!
//! # Example
//!
//! ```no_run
//! use std::sync::mpsc;
//! use webhook_server::{parse_users, WebhookConfig, WebhookServer};
//!
//! let config = WebhookConfig::default().with_users(parse_users("playout:secret")?);
//! let (tx, rx) = mpsc::channel();
//! let server = WebhookServer::start(config, tx)?;
//!
//! while let Ok(event) = rx.recv() {
//!     println!("{}: {:?}", event.kind, event.data.title);
//! }
//!
//! server.shutdown();
//! # Ok::<(), webhook_server::WebhookError>(())
//! ```

pub mod auth;
pub mod cloudevent;
pub mod config;
pub mod error;
pub mod router;
pub mod server;

pub use auth::BasicAuth;
pub use cloudevent::{CloudEvent, SPEC_VERSION};
pub use config::{parse_users, WebhookConfig};
pub use error::{EnvelopeError, WebhookError};
pub use router::{EventRouter, RouteOutcome};
pub use server::{routes, WebhookServer, EVENT_RECEIVED, SUPPORTED_MEDIA_TYPES};
