//! DLS and DL Plus delivery to the SMC FTP server

use std::io::Write;
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use nowplaying_core::{ObserverError, Track, TrackObserver};
use suppaftp::FtpStream;

/// Remote path of the DLS text
pub const DLS_PATH: &str = "/dls/nowplaying.dls";

/// Remote path of the DL Plus text
pub const DLPLUS_PATH: &str = "/dlplus/nowplaying.dls";

/// Longest DLS text a DAB+ receiver shows, in bytes
pub const MAX_DLS_BYTES: usize = 128;

/// Tracks shorter than this are not announced
pub const MIN_TRACK_SECONDS: i64 = 5;

const FTP_PORT: u16 = 21;

/// Destination for encoded DLS and DL Plus texts
pub trait DlsUploader: Send + Sync {
    fn upload(&self, dls: &[u8], dlplus: &[u8]) -> Result<(), ObserverError>;
}

/// SMC FTP server credentials
#[derive(Debug, Clone)]
pub struct SmcFtpConfig {
    /// Host name, optionally with `:port`
    pub hostname: String,
    pub username: String,
    pub password: String,
    /// Default: 60 seconds
    pub timeout: Duration,
}

impl SmcFtpConfig {
    pub fn new(
        hostname: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            hostname: hostname.into(),
            username: username.into(),
            password: password.into(),
            timeout: Duration::from_secs(60),
        }
    }

    fn address(&self) -> String {
        if self.hostname.contains(':') {
            self.hostname.clone()
        } else {
            format!("{}:{}", self.hostname, FTP_PORT)
        }
    }
}

/// Uploads over plain FTP, one connection per track
pub struct FtpUploader {
    config: SmcFtpConfig,
}

impl FtpUploader {
    pub fn new(config: SmcFtpConfig) -> Self {
        Self { config }
    }
}

impl DlsUploader for FtpUploader {
    fn upload(&self, dls: &[u8], dlplus: &[u8]) -> Result<(), ObserverError> {
        let upload_error = |e: suppaftp::FtpError| ObserverError::Upload(e.to_string());

        let addr = self
            .config
            .address()
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| {
                ObserverError::Config(format!("Cannot resolve {}", self.config.hostname))
            })?;

        // greeting, commands and data transfers all share the socket timeout
        let stream = TcpStream::connect_timeout(&addr, self.config.timeout)?;
        set_timeouts(&stream, self.config.timeout)?;

        let mut ftp = FtpStream::connect_with_stream(stream).map_err(upload_error)?;
        ftp.login(&self.config.username, &self.config.password)
            .map_err(upload_error)?;

        for (path, contents) in [(DLS_PATH, dls), (DLPLUS_PATH, dlplus)] {
            let mut data = ftp.put_with_stream(path).map_err(upload_error)?;
            set_timeouts(data.get_ref(), self.config.timeout)?;
            data.write_all(contents)?;
            ftp.finalize_put_stream(data).map_err(upload_error)?;
        }

        ftp.quit().map_err(upload_error)?;
        Ok(())
    }
}

fn set_timeouts(stream: &TcpStream, timeout: Duration) -> std::io::Result<()> {
    stream.set_read_timeout(Some(timeout))?;
    stream.set_write_timeout(Some(timeout))
}

/// Publishes DLS and DL Plus texts for every sufficiently long track
pub struct SmcFtpObserver {
    uploader: Box<dyn DlsUploader>,
}

impl SmcFtpObserver {
    pub fn new(config: SmcFtpConfig) -> Self {
        tracing::info!("SMC FTP delivery to {}", config.hostname);
        Self::with_uploader(FtpUploader::new(config))
    }

    pub fn with_uploader(uploader: impl DlsUploader + 'static) -> Self {
        Self {
            uploader: Box::new(uploader),
        }
    }
}

impl TrackObserver for SmcFtpObserver {
    fn name(&self) -> &str {
        "SMC FTP"
    }

    fn track_started(&self, track: &Track) -> Result<(), ObserverError> {
        tracing::info!(
            artist = track.artist(),
            title = track.title(),
            "Updating DAB+ DLS"
        );

        if track.duration() < chrono::Duration::seconds(MIN_TRACK_SECONDS) {
            tracing::info!(
                artist = track.artist(),
                title = track.title(),
                "Track is less than {} seconds, not sending to SMC",
                MIN_TRACK_SECONDS
            );
            return Ok(());
        }

        let (mut dls, mut dlplus) = dls_from_track(track, true);
        if dls.len() > MAX_DLS_BYTES {
            tracing::warn!("SMC DLS too long: {}", decode_latin1(&dls));
            (dls, dlplus) = dls_from_track(track, false);
        }

        self.uploader.upload(&dls, &dlplus)?;

        tracing::info!(
            dls = %decode_latin1(&dls),
            dlplus = %decode_latin1(&dlplus),
            "SMC FTP upload done"
        );
        Ok(())
    }
}

/// Latin-1 encoded DLS and DL Plus texts
///
/// Default metadata announces the show and leaves DL Plus empty. Without
/// the title only the artist is sent.
pub fn dls_from_track(track: &Track, with_title: bool) -> (Vec<u8>, Vec<u8>) {
    let (dls, dlplus) = if track.has_default_artist() || track.has_default_title() {
        let dls = if with_title {
            format!("{} - {}", track.artist(), track.show_name())
        } else {
            track.artist().to_string()
        };
        (dls, String::new())
    } else if with_title {
        (
            format!("{} - {}", track.artist(), track.title()),
            format!("artist={}\ntitle={}\n", track.artist(), track.title()),
        )
    } else {
        (
            track.artist().to_string(),
            format!("artist={}\n", track.artist()),
        )
    };

    (encode_latin1(&dls), encode_latin1(&dlplus))
}

/// Encode as ISO 8859-1, replacing unmappable characters with `?`
pub fn encode_latin1(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
        .collect()
}

fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}
