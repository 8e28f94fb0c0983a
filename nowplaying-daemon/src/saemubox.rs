//! Sämubox output selector over UDP
//!
//! The Sämubox broadcasts the id of the output routed to air as plain text
//! datagrams. Several ids may arrive in one datagram; the last one wins.

use std::collections::HashSet;
use std::io::ErrorKind;
use std::net::{IpAddr, Ipv4Addr, SocketAddr, UdpSocket};

use nowplaying_core::{SelectorError, SelectorId, SelectorSource};

/// Port the Sämubox sends to
pub const SAEMUBOX_PORT: u16 = 4001;

const MAX_DATAGRAM_BYTES: usize = 1024;

/// Configuration for the [`SaemuBox`] listener
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaemuBoxConfig {
    /// Local address to listen on
    /// Default: 0.0.0.0:4001
    pub bind: SocketAddr,

    /// Address of the Sämubox
    /// Default: None
    pub sender: Option<IpAddr>,

    /// Drop datagrams that do not come from `sender`
    /// Default: true
    pub check_sender: bool,
}

impl Default for SaemuBoxConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), SAEMUBOX_PORT),
            sender: None,
            check_sender: true,
        }
    }
}

impl SaemuBoxConfig {
    fn allows(&self, sender: IpAddr) -> bool {
        match (self.check_sender, self.sender) {
            (true, Some(expected)) => expected == sender,
            _ => true,
        }
    }
}

/// Non-blocking listener for Sämubox datagrams
pub struct SaemuBox {
    socket: UdpSocket,
    config: SaemuBoxConfig,
}

impl SaemuBox {
    /// Bind the listening socket
    pub fn bind(config: SaemuBoxConfig) -> Result<Self, SelectorError> {
        let socket = UdpSocket::bind(config.bind)
            .map_err(|e| SelectorError::Bind(format!("{}: {}", config.bind, e)))?;
        socket.set_nonblocking(true)?;

        tracing::info!("Sämubox listening on {}", socket.local_addr()?);
        Ok(Self { socket, config })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, SelectorError> {
        Ok(self.socket.local_addr()?)
    }

    pub fn config(&self) -> &SaemuBoxConfig {
        &self.config
    }

    /// Drain every queued datagram and return the last valid reading
    pub fn poll(&mut self) -> Result<SelectorId, SelectorError> {
        let mut buffer = [0u8; MAX_DATAGRAM_BYTES];
        let mut reading = None;
        let mut seen_senders = HashSet::new();

        loop {
            let (len, from) = match self.socket.recv_from(&mut buffer) {
                Ok(received) => received,
                Err(e) if e.kind() == ErrorKind::WouldBlock => break,
                Err(e) => return Err(e.into()),
            };

            if !self.config.allows(from.ip()) {
                tracing::warn!("Sämubox: receiving data from invalid host {}", from.ip());
                continue;
            }

            let data = &buffer[..len];
            if data.iter().all(u8::is_ascii_whitespace) {
                continue;
            }

            match parse_datagram(data) {
                Some(id) => {
                    seen_senders.insert(from.ip());
                    reading = Some(id);
                }
                None => {
                    tracing::warn!(
                        "Sämubox: received invalid data: {:?}",
                        String::from_utf8_lossy(data)
                    );
                }
            }
        }

        let Some(reading) = reading else {
            tracing::error!("Sämubox: could not read current status");
            return Err(SelectorError::Unavailable);
        };

        if let Some(sender) = self.config.sender {
            if self.config.check_sender && !seen_senders.contains(&sender) {
                tracing::warn!("Sämubox: missing sender {}", sender);
            }
        }

        tracing::debug!(reading = reading.value(), "Sämubox reading");
        Ok(reading)
    }
}

impl SelectorSource for SaemuBox {
    fn active_output(&mut self) -> Result<SelectorId, SelectorError> {
        self.poll()
    }
}

/// Extract the selector id from a datagram
///
/// Only the last whitespace separated token counts. Returns `None` unless it
/// is a valid output id.
pub fn parse_datagram(data: &[u8]) -> Option<SelectorId> {
    let text = std::str::from_utf8(data).ok()?;
    let id: u8 = text.split_whitespace().last()?.parse().ok()?;
    let id = SelectorId::new(id);
    id.is_valid().then_some(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::thread;
    use std::time::Duration;

    fn loopback_box(sender: Option<IpAddr>) -> SaemuBox {
        SaemuBox::bind(SaemuBoxConfig {
            bind: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 0),
            sender,
            check_sender: true,
        })
        .unwrap()
    }

    fn send(to: SocketAddr, datagrams: &[&[u8]]) {
        let socket = UdpSocket::bind("127.0.0.1:0").unwrap();
        for datagram in datagrams {
            socket.send_to(datagram, to).unwrap();
        }
        thread::sleep(Duration::from_millis(50));
    }

    #[rstest]
    #[case::single(b"1", Some(1))]
    #[case::padded(b" 3 \n6\n", Some(6))]
    #[case::last_wins(b"1\n2\n1\n", Some(1))]
    #[case::garbage(b"gugus", None)]
    #[case::below_range(b"0", None)]
    #[case::above_range(b"7", None)]
    #[case::blank(b"\n", None)]
    #[case::not_utf8(&[0xff, 0xfe], None)]
    fn test_parse_datagram(#[case] data: &[u8], #[case] expected: Option<u8>) {
        assert_eq!(parse_datagram(data), expected.map(SelectorId::new));
    }

    #[test]
    fn test_poll_takes_last_valid_reading() {
        let mut saemubox = loopback_box(None);
        let addr = saemubox.local_addr().unwrap();

        send(addr, &[b"\n", b"1", b"gugus", b"1\n2\n", b"\n"]);

        assert_eq!(saemubox.poll().unwrap(), SelectorId::new(2));
    }

    #[test]
    fn test_poll_without_data_is_unavailable() {
        let mut saemubox = loopback_box(None);
        assert!(matches!(saemubox.poll(), Err(SelectorError::Unavailable)));

        let addr = saemubox.local_addr().unwrap();
        send(addr, &[b"\n", b"9"]);
        assert!(matches!(saemubox.poll(), Err(SelectorError::Unavailable)));
    }

    #[test]
    fn test_poll_drops_foreign_senders() {
        let mut saemubox = loopback_box(Some("192.0.2.10".parse().unwrap()));
        let addr = saemubox.local_addr().unwrap();

        send(addr, &[b"6"]);
        assert!(matches!(saemubox.poll(), Err(SelectorError::Unavailable)));
    }

    #[test]
    fn test_sender_check_can_be_disabled() {
        let mut saemubox = SaemuBox::bind(SaemuBoxConfig {
            bind: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 0),
            sender: Some("192.0.2.10".parse().unwrap()),
            check_sender: false,
        })
        .unwrap();
        let addr = saemubox.local_addr().unwrap();

        send(addr, &[b"4"]);
        assert_eq!(saemubox.active_output().unwrap(), SelectorId::new(4));
    }

    #[test]
    fn test_bind_conflict() {
        let saemubox = loopback_box(None);
        let taken = saemubox.local_addr().unwrap();

        let result = SaemuBox::bind(SaemuBoxConfig {
            bind: taken,
            ..SaemuBoxConfig::default()
        });
        assert!(matches!(result, Err(SelectorError::Bind(_))));
    }
}
