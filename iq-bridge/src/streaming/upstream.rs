//! goesrecv sample publisher connection
//!
//! Opens the TCP connection and performs the nanomsg SP header exchange that
//! subscribes to every published I/Q message.

use super::wire::{NN_PUBLISH_ACK, NN_SUBSCRIBE_REQUEST};
use crate::config::UpstreamConfig;
use crate::error::{Error, Result};
use std::io::{self, Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

/// Send the subscribe header and check the publisher's acknowledgement
///
/// Reads exactly 8 bytes; any difference from the expected PUB header is a
/// [`Error::HandshakeMismatch`].
pub fn subscribe<S: Read + Write>(stream: &mut S) -> Result<()> {
    stream.write_all(&NN_SUBSCRIBE_REQUEST)?;
    stream.flush()?;

    let mut reply = [0u8; 8];
    stream.read_exact(&mut reply)?;

    if reply != NN_PUBLISH_ACK {
        return Err(Error::HandshakeMismatch {
            expected: NN_PUBLISH_ACK,
            actual: reply,
        });
    }
    Ok(())
}

/// Connect to the publisher and subscribe
///
/// The returned stream has no read timeout; the caller sets whatever it
/// needs for the bridging loop.
pub fn connect(config: &UpstreamConfig) -> Result<TcpStream> {
    let address = config.address();
    let mut stream = match open(&address, config.connect_timeout()) {
        Ok(stream) => stream,
        Err(source) => return Err(Error::UpstreamConnect { address, source }),
    };
    log::debug!("TCP connection to {} established", address);

    if let Err(e) = stream.set_nodelay(true) {
        log::warn!("Failed to set TCP_NODELAY on upstream: {}", e);
    }
    stream.set_read_timeout(non_zero(config.handshake_timeout()))?;

    subscribe(&mut stream)?;
    stream.set_read_timeout(None)?;

    Ok(stream)
}

/// Try every resolved address in turn, keeping the last error
fn open(address: &str, timeout: Duration) -> io::Result<TcpStream> {
    let mut last_err = None;
    for addr in address.to_socket_addrs()? {
        let attempt = match non_zero(timeout) {
            Some(t) => TcpStream::connect_timeout(&addr, t),
            None => TcpStream::connect(addr),
        };
        match attempt {
            Ok(stream) => return Ok(stream),
            Err(e) => {
                log::debug!("Connect to {} failed: {}", addr, e);
                last_err = Some(e);
            }
        }
    }
    Err(last_err.unwrap_or_else(|| {
        io::Error::new(
            io::ErrorKind::AddrNotAvailable,
            format!("{} did not resolve to any address", address),
        )
    }))
}

/// Zero means "block indefinitely"
fn non_zero(timeout: Duration) -> Option<Duration> {
    (!timeout.is_zero()).then_some(timeout)
}
