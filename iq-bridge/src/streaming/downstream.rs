//! RTL_TCP client side
//!
//! One listener per session. The listener accepts a single client, sends it
//! the dongle info block and then stays open (but unserviced) until the
//! session is torn down, so a second client cannot take over mid-session.

use super::wire::RTL_TCP_PREAMBLE;
use crate::error::{Error, Result};
use std::io::{ErrorKind, Write};
use std::net::{Ipv4Addr, SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

/// How often a pending accept re-checks the shutdown flag
const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Write the RTL_TCP dongle info block
pub fn send_preamble<W: Write>(client: &mut W) -> Result<()> {
    client.write_all(&RTL_TCP_PREAMBLE)?;
    client.flush()?;
    Ok(())
}

/// Bind the RTL_TCP listener on all interfaces
///
/// The listener is non-blocking so [`accept_client`] can observe shutdown.
pub fn bind(port: u16) -> Result<TcpListener> {
    let listener = TcpListener::bind((Ipv4Addr::UNSPECIFIED, port))
        .map_err(|source| Error::ClientAccept { port, source })?;
    listener
        .set_nonblocking(true)
        .map_err(|source| Error::ClientAccept { port, source })?;
    Ok(listener)
}

/// Wait for one client and send it the preamble
///
/// Returns [`Error::Shutdown`] if `running` clears before anyone connects.
pub fn accept_client(
    listener: &TcpListener,
    running: &AtomicBool,
) -> Result<(TcpStream, SocketAddr)> {
    let port = listener.local_addr().map(|a| a.port()).unwrap_or(0);

    loop {
        if !running.load(Ordering::Relaxed) {
            return Err(Error::Shutdown);
        }

        match listener.accept() {
            Ok((mut stream, addr)) => {
                // Accepted sockets may inherit non-blocking mode from the listener
                stream
                    .set_nonblocking(false)
                    .map_err(|source| Error::ClientAccept { port, source })?;
                if let Err(e) = stream.set_nodelay(true) {
                    log::warn!("Failed to set TCP_NODELAY for {}: {}", addr, e);
                }
                send_preamble(&mut stream)?;
                return Ok((stream, addr));
            }
            Err(ref e) if e.kind() == ErrorKind::WouldBlock => {
                thread::sleep(ACCEPT_POLL_INTERVAL);
            }
            Err(ref e) if e.kind() == ErrorKind::Interrupted => {}
            Err(source) => return Err(Error::ClientAccept { port, source }),
        }
    }
}
