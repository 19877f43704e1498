use std::io;
use std::os::unix::net::UnixStream;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::debug;

use crate::frame::write_message;

/// Default bound on connecting to the availability manager.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(60);

const CONNECT_RETRY_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("cannot connect to availability manager service at {path}: {source}")]
    Connect { path: PathBuf, source: io::Error },

    #[error("cannot send data to availability manager service: {0}")]
    Write(io::Error),
}

/// Connection to the availability manager, opened on first send and kept for the
/// lifetime of the client. Not for concurrent use; one client per process.
pub struct AvailabilityClient {
    socket_path: PathBuf,
    connect_timeout: Duration,
    stream: Option<UnixStream>,
}

impl AvailabilityClient {
    pub fn new(socket_path: impl Into<PathBuf>, connect_timeout: Duration) -> Self {
        Self {
            socket_path: socket_path.into(),
            connect_timeout,
            stream: None,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    /// Send one message. Opens the channel first if needed; no reply is awaited.
    pub fn send(&mut self, code: u32, data: &[u8]) -> Result<(), TransportError> {
        let mut stream = match self.stream.take() {
            Some(stream) => stream,
            None => self.connect()?,
        };

        write_message(&mut stream, code, data).map_err(TransportError::Write)?;
        self.stream = Some(stream);
        Ok(())
    }

    /// Retry `connect` about once a second until the timeout elapses.
    fn connect(&self) -> Result<UnixStream, TransportError> {
        let deadline = Instant::now() + self.connect_timeout;

        loop {
            match UnixStream::connect(&self.socket_path) {
                Ok(stream) => {
                    debug!(path = %self.socket_path.display(), "connected to availability manager");
                    return Ok(stream);
                }
                Err(source) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return Err(TransportError::Connect {
                            path: self.socket_path.clone(),
                            source,
                        });
                    }
                    std::thread::sleep(CONNECT_RETRY_INTERVAL.min(deadline - now));
                }
            }
        }
    }
}
