//! Configuration for the webhook server

use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use nowplaying_core::{TRACK_FINISHED_TYPE, TRACK_STARTED_TYPE};

use crate::error::WebhookError;

/// Configuration for the [`WebhookServer`](crate::WebhookServer)
#[derive(Debug, Clone)]
pub struct WebhookConfig {
    /// Address to listen on
    /// Default: 127.0.0.1
    pub bind_address: IpAddr,

    /// Port to listen on, 0 picks a free port
    /// Default: 8080
    pub port: u16,

    /// Realm announced in `WWW-Authenticate`
    /// Default: "nowplaying"
    pub realm: String,

    /// Basic auth users and their passwords
    /// Default: rabe:rabe
    pub users: HashMap<String, String>,

    /// Event types forwarded to the daemon, others are acknowledged and dropped
    /// Default: trackStarted and trackFinished
    pub accepted_types: Vec<String>,

    /// Authority that event ids must use as `crid://<authority>/...`, `None` disables the check
    /// Default: Some("rabe.ch")
    pub crid_authority: Option<String>,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            bind_address: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 8080,
            realm: "nowplaying".to_string(),
            users: HashMap::from([("rabe".to_string(), "rabe".to_string())]),
            accepted_types: vec![
                TRACK_STARTED_TYPE.to_string(),
                TRACK_FINISHED_TYPE.to_string(),
            ],
            crid_authority: Some("rabe.ch".to_string()),
        }
    }
}

impl WebhookConfig {
    /// Config for tests: loopback, OS assigned port
    pub fn ephemeral() -> Self {
        Self {
            port: 0,
            ..Default::default()
        }
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_address, self.port)
    }

    pub fn with_users(mut self, users: HashMap<String, String>) -> Self {
        self.users = users;
        self
    }
}

/// Parse `user:password[,user:password...]`
///
/// Passwords may contain `:`; the first one separates user from password.
pub fn parse_users(value: &str) -> Result<HashMap<String, String>, WebhookError> {
    value
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| match entry.split_once(':') {
            Some((user, password)) if !user.is_empty() => {
                Ok((user.to_string(), password.to_string()))
            }
            _ => Err(WebhookError::InvalidUsers(entry.to_string())),
        })
        .collect()
}
