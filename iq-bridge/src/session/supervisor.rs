//! Session supervisor
//!
//! Runs sessions back to back until the running flag clears. Every failure,
//! whatever the stage, ends in teardown and a fresh session; the only way out
//! of [`Supervisor::run`] is a shutdown request.

use super::events::{EventSink, FailureKind, LogSink, SessionEvent};
use super::retry::{self, RetryPolicy};
use super::{Session, SessionEnd, SessionReport, SessionState};
use crate::config::BridgeConfig;
use crate::error::{Error, Result};
use crate::streaming::BridgeOutcome;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

/// Granularity of interruptible retry sleeps
const RETRY_SLEEP_SLICE: Duration = Duration::from_millis(50);

/// Drives the session state machine
pub struct Supervisor<S: EventSink = LogSink> {
    config: BridgeConfig,
    running: Arc<AtomicBool>,
    retry: Box<dyn RetryPolicy>,
    sink: S,
    sessions: u64,
}

impl Supervisor<LogSink> {
    /// Supervisor reporting through the `log` facade
    pub fn new(config: BridgeConfig, running: Arc<AtomicBool>) -> Self {
        Self::with_sink(config, running, LogSink)
    }
}

impl<S: EventSink> Supervisor<S> {
    /// Supervisor reporting to a custom sink
    ///
    /// The retry policy comes from `config.retry`.
    pub fn with_sink(config: BridgeConfig, running: Arc<AtomicBool>, sink: S) -> Self {
        let retry = retry::from_config(&config.retry);
        Self {
            config,
            running,
            retry,
            sink,
            sessions: 0,
        }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Number of sessions started so far
    pub fn sessions(&self) -> u64 {
        self.sessions
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Run sessions until shutdown is requested
    pub fn run(&mut self) {
        while self.is_running() {
            let report = self.run_session();
            if !self.is_running() {
                break;
            }

            let delay = self.retry.next_delay(&report);
            if !delay.is_zero() {
                self.sink.emit(SessionEvent::RetryDelay { delay });
                self.sleep_while_running(delay);
            }
        }
        self.sink.emit(SessionEvent::ShuttingDown);
    }

    /// One full pass: IDLE → ... → TEARDOWN → IDLE
    pub fn run_session(&mut self) -> SessionReport {
        self.sessions += 1;
        let mut session = Session::new(self.sessions, self.config.upstream.read_buffer_size);

        let result = self.drive(&mut session);
        let last_state = session.state();
        let stats = session.stats();

        let end = match result {
            Ok(BridgeOutcome::UpstreamClosed) => {
                self.sink.emit(SessionEvent::UpstreamClosed);
                SessionEnd::UpstreamClosed
            }
            Ok(BridgeOutcome::Shutdown) | Err(Error::Shutdown) => SessionEnd::Shutdown,
            Err(e) => {
                self.sink.emit(SessionEvent::Failed {
                    stage: last_state,
                    kind: classify(last_state, &e),
                    detail: e.to_string(),
                });
                SessionEnd::Failed(e)
            }
        };

        session.teardown();
        self.sink.emit(SessionEvent::SessionEnded {
            session: session.id(),
            reached_bridging: last_state == SessionState::Bridging,
            stats,
        });

        SessionReport {
            id: session.id(),
            last_state,
            end,
            stats,
        }
    }

    fn drive(&mut self, session: &mut Session) -> Result<BridgeOutcome> {
        let addr = session.listen(self.config.downstream.port)?;
        self.sink.emit(SessionEvent::Listening {
            session: session.id(),
            addr,
        });

        let peer = session.await_client(&self.running)?;
        self.sink.emit(SessionEvent::ClientConnected { peer });

        let address = self.config.upstream.address();
        self.sink.emit(SessionEvent::ConnectingUpstream {
            address: address.clone(),
        });
        session.await_upstream(&self.config.upstream)?;
        self.sink.emit(SessionEvent::UpstreamConnected { address });

        self.sink.emit(SessionEvent::Bridging);
        session.bridge(&self.running)
    }

    fn sleep_while_running(&self, delay: Duration) {
        let deadline = Instant::now() + delay;
        while self.is_running() {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            thread::sleep((deadline - now).min(RETRY_SLEEP_SLICE));
        }
    }
}

/// Map a failure to the operator-facing category for its stage
fn classify(stage: SessionState, error: &Error) -> FailureKind {
    match (stage, error) {
        (_, Error::HandshakeMismatch { .. }) => FailureKind::InvalidUpstreamHeader,
        (_, Error::ClientWrite(_)) => FailureKind::ClientDisconnected,
        (_, Error::UpstreamRead(_)) => FailureKind::UpstreamLost,
        (SessionState::AwaitClient, e) if e.is_disconnect() => FailureKind::ClientDisconnected,
        (SessionState::AwaitUpstream, _) => FailureKind::UpstreamUnavailable,
        (SessionState::Bridging, _) => FailureKind::UpstreamLost,
        _ => FailureKind::ClientUnavailable,
    }
}
