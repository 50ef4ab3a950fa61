//! Session lifecycle events
//!
//! The supervisor never prints anything itself. It reports what happens to an
//! [`EventSink`]; the binary uses [`LogSink`] to turn events into operator
//! status lines, tests plug in sinks that record events instead.

use super::SessionState;
use crate::streaming::BridgeStats;
use std::net::SocketAddr;
use std::time::Duration;

/// Why a session stage failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Could not bind, accept or greet an RTL_TCP client
    ClientUnavailable,
    /// Could not reach or subscribe to the publisher
    UpstreamUnavailable,
    /// Publisher answered with the wrong SP header
    InvalidUpstreamHeader,
    /// Reading samples from the publisher failed
    UpstreamLost,
    /// Writing samples to the client failed
    ClientDisconnected,
}

/// Something observable that happened during a session
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// RTL_TCP listener is up and waiting
    Listening {
        session: u64,
        addr: SocketAddr,
    },
    ClientConnected {
        peer: SocketAddr,
    },
    ConnectingUpstream {
        address: String,
    },
    UpstreamConnected {
        address: String,
    },
    /// Sample forwarding has started
    Bridging,
    /// A stage failed; `detail` carries the underlying error text
    Failed {
        stage: SessionState,
        kind: FailureKind,
        detail: String,
    },
    /// Publisher closed the connection cleanly
    UpstreamClosed,
    /// All session sockets have been closed
    SessionEnded {
        session: u64,
        reached_bridging: bool,
        stats: BridgeStats,
    },
    /// Retry policy asked for a pause before the next session
    RetryDelay { delay: Duration },
    ShuttingDown,
}

/// Consumer of session events
pub trait EventSink {
    fn emit(&mut self, event: SessionEvent);
}

/// Renders events through the `log` facade
///
/// Status lines go out at `info`/`warn`; error details only at `debug`, so
/// they show up when the bridge runs with `--debug`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl EventSink for LogSink {
    fn emit(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::Listening { session, addr } => {
                log::info!("Waiting for RTL_TCP client on {}...", addr);
                log::debug!("Session {} started", session);
            }
            SessionEvent::ClientConnected { peer } => {
                log::info!("Client connected from {}", peer);
            }
            SessionEvent::ConnectingUpstream { address } => {
                log::info!("Connecting to goesrecv host {}...", address);
            }
            SessionEvent::UpstreamConnected { address } => {
                log::info!("Connected to goesrecv host {}", address);
            }
            SessionEvent::Bridging => {
                log::info!("Bridging goesrecv IQ samples to RTL_TCP client...");
            }
            SessionEvent::Failed {
                stage,
                kind,
                detail,
            } => {
                log::debug!("{:?} failed: {}", stage, detail);
                match kind {
                    FailureKind::ClientUnavailable => log::warn!("Could not connect to client"),
                    FailureKind::UpstreamUnavailable => {
                        log::warn!("Could not connect to goesrecv host")
                    }
                    FailureKind::InvalidUpstreamHeader => log::warn!("Invalid goesrecv header"),
                    FailureKind::UpstreamLost => log::warn!("Connection to goesrecv closed"),
                    FailureKind::ClientDisconnected => log::warn!("RTL_TCP client disconnected"),
                }
            }
            SessionEvent::UpstreamClosed => {
                log::info!("Connection to goesrecv closed");
            }
            SessionEvent::SessionEnded {
                session,
                reached_bridging,
                stats,
            } => {
                if reached_bridging {
                    log::info!(
                        "Session {} ended: {} frames, {} sample bytes forwarded",
                        session,
                        stats.frames,
                        stats.payload_bytes
                    );
                }
                log::debug!("Session {} torn down ({:?})", session, stats);
            }
            SessionEvent::RetryDelay { delay } => {
                log::debug!("Retrying in {:?}", delay);
            }
            SessionEvent::ShuttingDown => {
                log::info!("Shutting down");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_sink_handles_every_event() {
        let mut sink = LogSink;
        let addr: SocketAddr = "127.0.0.1:1234".parse().unwrap();
        sink.emit(SessionEvent::Listening { session: 1, addr });
        sink.emit(SessionEvent::ClientConnected { peer: addr });
        sink.emit(SessionEvent::Failed {
            stage: SessionState::AwaitUpstream,
            kind: FailureKind::InvalidUpstreamHeader,
            detail: "mismatch".to_string(),
        });
        sink.emit(SessionEvent::SessionEnded {
            session: 1,
            reached_bridging: true,
            stats: BridgeStats::default(),
        });
        sink.emit(SessionEvent::ShuttingDown);
    }
}
