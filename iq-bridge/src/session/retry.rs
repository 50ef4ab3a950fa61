//! Restart strategies between sessions
//!
//! The supervisor restarts unconditionally; a [`RetryPolicy`] only decides how
//! long to pause first.

use super::SessionReport;
use crate::config::{RetryConfig, RetryStrategy};
use std::time::Duration;

/// Decides the pause before the next session
pub trait RetryPolicy: Send {
    fn next_delay(&mut self, report: &SessionReport) -> Duration;
}

/// Start the next session right away, forever
///
/// If the publisher stays unreachable and clients keep reconnecting this
/// spins at full speed.
#[derive(Debug, Default, Clone, Copy)]
pub struct ImmediateRetry;

impl RetryPolicy for ImmediateRetry {
    fn next_delay(&mut self, _report: &SessionReport) -> Duration {
        Duration::ZERO
    }
}

/// Doubling delay after consecutive failed sessions, capped at `max`
///
/// A session that made it to bridging resets the delay and restarts
/// immediately.
#[derive(Debug, Clone)]
pub struct BoundedBackoff {
    initial: Duration,
    max: Duration,
    current: Duration,
}

impl BoundedBackoff {
    pub fn new(initial: Duration, max: Duration) -> Self {
        Self {
            initial,
            max,
            current: initial,
        }
    }
}

impl RetryPolicy for BoundedBackoff {
    fn next_delay(&mut self, report: &SessionReport) -> Duration {
        if report.reached_bridging() {
            self.current = self.initial;
            return Duration::ZERO;
        }
        let delay = self.current.min(self.max);
        self.current = (self.current * 2).min(self.max);
        delay
    }
}

/// Build the policy selected in the configuration
pub fn from_config(config: &RetryConfig) -> Box<dyn RetryPolicy> {
    match config.strategy {
        RetryStrategy::Immediate => Box::new(ImmediateRetry),
        RetryStrategy::Backoff => Box::new(BoundedBackoff::new(
            Duration::from_millis(config.initial_delay_ms),
            Duration::from_millis(config.max_delay_ms),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::session::{SessionEnd, SessionState};
    use crate::streaming::BridgeStats;

    fn failed_report() -> SessionReport {
        SessionReport {
            id: 1,
            last_state: SessionState::AwaitUpstream,
            end: SessionEnd::Failed(Error::Shutdown),
            stats: BridgeStats::default(),
        }
    }

    fn bridged_report() -> SessionReport {
        SessionReport {
            id: 2,
            last_state: SessionState::Bridging,
            end: SessionEnd::UpstreamClosed,
            stats: BridgeStats::default(),
        }
    }

    #[test]
    fn test_immediate_never_waits() {
        let mut policy = ImmediateRetry;
        for _ in 0..5 {
            assert_eq!(policy.next_delay(&failed_report()), Duration::ZERO);
        }
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let mut policy =
            BoundedBackoff::new(Duration::from_millis(100), Duration::from_millis(350));

        let delays: Vec<u128> = (0..5)
            .map(|_| policy.next_delay(&failed_report()).as_millis())
            .collect();

        assert_eq!(delays, vec![100, 200, 350, 350, 350]);
    }

    #[test]
    fn test_backoff_resets_after_bridging() {
        let mut policy = BoundedBackoff::new(Duration::from_millis(50), Duration::from_secs(1));
        policy.next_delay(&failed_report());
        policy.next_delay(&failed_report());

        assert_eq!(policy.next_delay(&bridged_report()), Duration::ZERO);
        assert_eq!(
            policy.next_delay(&failed_report()),
            Duration::from_millis(50)
        );
    }

    #[test]
    fn test_from_config() {
        let mut config = RetryConfig::default();
        assert_eq!(
            from_config(&config).next_delay(&failed_report()),
            Duration::ZERO
        );

        config.strategy = RetryStrategy::Backoff;
        config.initial_delay_ms = 20;
        assert_eq!(
            from_config(&config).next_delay(&failed_report()),
            Duration::from_millis(20)
        );
    }
}
