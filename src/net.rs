//! Raw TCP transport for net-radio streams
//!
//! Shoutcast-style servers speak something close enough to HTTP/1.0 that a
//! hand-written GET is all the client side needs. The transport deliberately
//! performs no response parsing: status line, headers, and in-band metadata
//! all flow through to the decoder untouched, which tolerates the leading
//! non-audio bytes by scanning for a sync point.

use crate::error::{Error, Result};
use std::fmt;
use std::io::{Read, Write};
use std::net::{Shutdown, TcpStream};
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

/// Parsed `http://host[:port]/path` stream location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamUrl {
    pub host: String,
    pub port: u16,
    pub path: String,
}

impl FromStr for StreamUrl {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let rest = s
            .strip_prefix("http://")
            .ok_or_else(|| Error::InvalidUrl(format!("Not an http:// URL: {}", s)))?;

        let (authority, path) = match rest.find('/') {
            Some(idx) => (&rest[..idx], rest[idx..].to_string()),
            None => (rest, "/".to_string()),
        };

        let (host, port) = match authority.rsplit_once(':') {
            Some((host, port)) => {
                let port = port
                    .parse::<u16>()
                    .map_err(|_| Error::InvalidUrl(format!("Bad port in URL: {}", s)))?;
                (host, port)
            }
            None => (authority, 80),
        };

        if host.is_empty() {
            return Err(Error::InvalidUrl(format!("Missing host in URL: {}", s)));
        }

        Ok(Self {
            host: host.to_string(),
            port,
            path,
        })
    }
}

impl fmt::Display for StreamUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "http://{}:{}{}", self.host, self.port, self.path)
    }
}

/// Shared slot holding a clone of the live socket.
///
/// The controller keeps one end so `cancel()` can force-close the socket and
/// unblock an ingest thread parked in `read()`.
pub type SocketSlot = Arc<Mutex<Option<TcpStream>>>;

/// Force-close whatever socket is in the slot.
///
/// Safe to call at any time; an empty slot (never connected, or already
/// closed) is a no-op.
pub fn shutdown_socket(slot: &SocketSlot) {
    if let Some(stream) = slot.lock().unwrap().take() {
        debug!("Forcing socket shutdown");
        // Failure here means the peer already went away; nothing to do.
        let _ = stream.shutdown(Shutdown::Both);
    }
}

/// Blocking TCP transport for one streaming session.
pub struct SocketTransport {
    url: StreamUrl,
    stream: Option<TcpStream>,
    slot: SocketSlot,
}

impl SocketTransport {
    /// Create a disconnected transport. A clone of the connected socket will
    /// be published into `slot` so the controller can force-close it.
    pub fn new(url: StreamUrl, slot: SocketSlot) -> Self {
        Self {
            url,
            stream: None,
            slot,
        }
    }

    /// Open the TCP connection.
    pub fn connect(&mut self) -> Result<()> {
        info!("Connecting to {}", self.url);
        let stream = TcpStream::connect((self.url.host.as_str(), self.url.port))
            .map_err(|e| Error::Connect(format!("Failed to connect to {}: {}", self.url, e)))?;

        match stream.try_clone() {
            Ok(clone) => *self.slot.lock().unwrap() = Some(clone),
            Err(e) => debug!("Socket clone for forced shutdown unavailable: {}", e),
        }

        self.stream = Some(stream);
        Ok(())
    }

    /// Send the stream request.
    ///
    /// HTTP/1.0 on purpose: it forbids chunked transfer encoding, so the
    /// response body is the raw bitstream.
    pub fn send_request(&mut self) -> Result<()> {
        let request = format!(
            "GET {} HTTP/1.0\r\nHost: {}\r\n\r\n",
            self.url.path, self.url.host
        );
        let stream = self
            .stream
            .as_mut()
            .ok_or_else(|| Error::Protocol("Request before connect".to_string()))?;
        stream
            .write_all(request.as_bytes())
            .map_err(|e| Error::Protocol(format!("Failed to send request: {}", e)))?;
        debug!("Sent GET {} to {}", self.url.path, self.url.host);
        Ok(())
    }

    /// Read up to `out.len()` bytes from the socket.
    ///
    /// Returns the number of bytes read; 0 means the peer closed the
    /// connection. A zero-length `out` is answered with 0 without touching
    /// the socket.
    pub fn read(&mut self, out: &mut [u8]) -> Result<usize> {
        if out.is_empty() {
            return Ok(0);
        }
        let stream = self
            .stream
            .as_mut()
            .ok_or_else(|| Error::Read("Read before connect".to_string()))?;
        stream
            .read(out)
            .map_err(|e| Error::Read(format!("Socket read failed: {}", e)))
    }

    /// Close the connection and clear the controller's shutdown slot.
    pub fn close(&mut self) {
        self.slot.lock().unwrap().take();
        if let Some(stream) = self.stream.take() {
            let _ = stream.shutdown(Shutdown::Both);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_url() {
        let url: StreamUrl = "http://radio.example.com:8000/stream.mp3".parse().unwrap();
        assert_eq!(url.host, "radio.example.com");
        assert_eq!(url.port, 8000);
        assert_eq!(url.path, "/stream.mp3");
    }

    #[test]
    fn test_parse_defaults_port_and_path() {
        let url: StreamUrl = "http://radio.example.com".parse().unwrap();
        assert_eq!(url.port, 80);
        assert_eq!(url.path, "/");
    }

    #[test]
    fn test_parse_rejects_non_http() {
        assert!("https://radio.example.com/".parse::<StreamUrl>().is_err());
        assert!("radio.example.com".parse::<StreamUrl>().is_err());
    }

    #[test]
    fn test_parse_rejects_bad_port_and_empty_host() {
        assert!("http://host:notaport/".parse::<StreamUrl>().is_err());
        assert!("http://:8000/".parse::<StreamUrl>().is_err());
    }

    #[test]
    fn test_shutdown_empty_slot_is_noop() {
        let slot: SocketSlot = Arc::new(Mutex::new(None));
        shutdown_socket(&slot);
    }
}
