//! One bridging session and the supervisor that restarts it
//!
//! ```text
//!   IDLE ──▶ AWAIT_CLIENT ──▶ AWAIT_UPSTREAM ──▶ BRIDGING
//!    ▲            │                  │               │
//!    │            ▼                  ▼               ▼
//!    └───────────────────────── TEARDOWN ◀───────────┘
//! ```
//!
//! A [`Session`] owns every socket used during one pass through the state
//! machine. Nothing outside it can reach those sockets, and dropping it
//! closes them.

pub mod events;
pub mod retry;
pub mod supervisor;

pub use events::{EventSink, FailureKind, LogSink, SessionEvent};
pub use retry::{BoundedBackoff, ImmediateRetry, RetryPolicy};
pub use supervisor::Supervisor;

use crate::config::UpstreamConfig;
use crate::error::{Error, Result};
use crate::streaming::{Bridge, BridgeOutcome, BridgeStats, FrameReassembler, downstream, upstream};
use std::io;
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::AtomicBool;
use std::time::Duration;

/// Upstream read timeout while bridging, so shutdown is noticed promptly
const BRIDGE_POLL_TIMEOUT: Duration = Duration::from_millis(500);

/// Supervisor state machine positions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No sockets held
    Idle,
    /// Listening for an RTL_TCP client
    AwaitClient,
    /// Connecting and subscribing to goesrecv
    AwaitUpstream,
    /// Forwarding samples
    Bridging,
    /// Closing every socket of the session
    Teardown,
}

/// How a session finished
#[derive(Debug)]
pub enum SessionEnd {
    /// Publisher closed its connection
    UpstreamClosed,
    /// Shutdown was requested
    Shutdown,
    /// A stage failed
    Failed(Error),
}

/// Summary handed to the retry policy after teardown
#[derive(Debug)]
pub struct SessionReport {
    /// Session number, starting at 1
    pub id: u64,
    /// Furthest state the session was in when it ended
    pub last_state: SessionState,
    /// Why the session ended
    pub end: SessionEnd,
    /// Bridging counters, all zero if bridging never started
    pub stats: BridgeStats,
}

impl SessionReport {
    pub fn reached_bridging(&self) -> bool {
        self.last_state == SessionState::Bridging
    }
}

/// Sockets and parsing state for one pass through the state machine
pub struct Session {
    id: u64,
    state: SessionState,
    listener: Option<TcpListener>,
    client: Option<TcpStream>,
    upstream: Option<TcpStream>,
    bridge: Bridge,
}

impl Session {
    /// Start a session in `Idle` with a fresh reassembler
    pub fn new(id: u64, read_buffer_size: usize) -> Self {
        Self {
            id,
            state: SessionState::Idle,
            listener: None,
            client: None,
            upstream: None,
            bridge: Bridge::new(read_buffer_size),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn reassembler(&self) -> &FrameReassembler {
        self.bridge.reassembler()
    }

    pub fn stats(&self) -> BridgeStats {
        self.bridge.stats()
    }

    /// True while any listener or connection is still open
    pub fn holds_sockets(&self) -> bool {
        self.listener.is_some() || self.client.is_some() || self.upstream.is_some()
    }

    /// Bind the RTL_TCP listener, entering `AwaitClient`
    pub fn listen(&mut self, port: u16) -> Result<SocketAddr> {
        self.state = SessionState::AwaitClient;
        let listener = downstream::bind(port)?;
        let addr = listener
            .local_addr()
            .map_err(|source| Error::ClientAccept { port, source })?;
        self.listener = Some(listener);
        Ok(addr)
    }

    /// Block until a client connects and has received the preamble
    pub fn await_client(&mut self, running: &AtomicBool) -> Result<SocketAddr> {
        let listener = self
            .listener
            .as_ref()
            .ok_or_else(|| not_ready("listener"))?;
        let (stream, peer) = downstream::accept_client(listener, running)?;
        self.client = Some(stream);
        Ok(peer)
    }

    /// Connect and subscribe to the publisher, entering `AwaitUpstream`
    pub fn await_upstream(&mut self, config: &UpstreamConfig) -> Result<()> {
        self.state = SessionState::AwaitUpstream;
        self.upstream = Some(upstream::connect(config)?);
        Ok(())
    }

    /// Forward samples until the publisher closes or something fails
    pub fn bridge(&mut self, running: &AtomicBool) -> Result<BridgeOutcome> {
        self.state = SessionState::Bridging;
        let upstream = self
            .upstream
            .as_mut()
            .ok_or_else(|| not_ready("upstream"))?;
        let client = self.client.as_mut().ok_or_else(|| not_ready("client"))?;
        upstream.set_read_timeout(Some(BRIDGE_POLL_TIMEOUT))?;
        self.bridge.run(upstream, client, running)
    }

    /// Close everything this session holds
    ///
    /// Safe to call any number of times, in any state.
    pub fn teardown(&mut self) {
        if self.state == SessionState::Idle && !self.holds_sockets() {
            return;
        }
        self.state = SessionState::Teardown;

        if let Some(stream) = self.upstream.take() {
            let _ = stream.shutdown(Shutdown::Both);
        }
        if let Some(stream) = self.client.take() {
            let _ = stream.shutdown(Shutdown::Both);
        }
        self.listener = None;

        log::trace!("Session {} sockets closed", self.id);
        self.state = SessionState::Idle;
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.teardown();
    }
}

fn not_ready(what: &str) -> Error {
    Error::Io(io::Error::new(
        io::ErrorKind::NotConnected,
        format!("session has no {}", what),
    ))
}
