//! Reconnect timing and circuit state of an event session

use std::time::Duration;

use backoff::ExponentialBackoff;
use backoff::backoff::Backoff;

/// Configuration for reconnecting the event session
#[derive(Debug, Clone)]
pub struct ReconnectConfig {
    /// First delay after a failure
    pub initial_interval: Duration,
    /// Ceiling for the delay
    pub max_interval: Duration,
    /// Multiplier for exponential backoff
    pub multiplier: f64,
    /// Jitter applied to every delay (0.2 = +/- 20%)
    pub randomization_factor: f64,
    /// Give up after this many consecutive failures (None = never)
    pub max_attempts: Option<u32>,
    /// Consecutive failures after which the circuit opens
    pub circuit_threshold: u32,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            initial_interval: Duration::from_secs(5),
            max_interval: Duration::from_secs(300),
            multiplier: 2.0,
            randomization_factor: 0.2,
            max_attempts: None,
            circuit_threshold: 5,
        }
    }
}

impl ReconnectConfig {
    /// Create an ExponentialBackoff from this config
    pub fn to_backoff(&self) -> ExponentialBackoff {
        let mut backoff = ExponentialBackoff {
            current_interval: self.initial_interval,
            initial_interval: self.initial_interval,
            max_interval: self.max_interval,
            multiplier: self.multiplier,
            randomization_factor: self.randomization_factor,
            max_elapsed_time: None,
            ..Default::default()
        };
        backoff.reset();
        backoff
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconnectDecision {
    Retry(Duration),
    GiveUp,
}

/// Counts consecutive failures and hands out the next delay.
pub struct ReconnectPolicy {
    config: ReconnectConfig,
    backoff: ExponentialBackoff,
    failures: u32,
}

impl ReconnectPolicy {
    pub fn new(config: ReconnectConfig) -> Self {
        let backoff = config.to_backoff();
        Self {
            config,
            backoff,
            failures: 0,
        }
    }

    pub fn record_failure(&mut self) -> ReconnectDecision {
        self.failures = self.failures.saturating_add(1);
        if let Some(max) = self.config.max_attempts {
            if self.failures >= max {
                return ReconnectDecision::GiveUp;
            }
        }
        let delay = self
            .backoff
            .next_backoff()
            .unwrap_or(self.config.max_interval);
        ReconnectDecision::Retry(delay)
    }

    /// A connection was acknowledged or a sweep completed.
    pub fn record_success(&mut self) {
        self.failures = 0;
        self.backoff.reset();
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.failures
    }

    pub fn circuit(&self) -> CircuitState {
        if self.config.circuit_threshold > 0 && self.failures >= self.config.circuit_threshold {
            CircuitState::Open
        } else {
            CircuitState::Closed
        }
    }
}

impl std::fmt::Debug for ReconnectPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReconnectPolicy")
            .field("failures", &self.failures)
            .field("circuit", &self.circuit())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn exact(max_attempts: Option<u32>) -> ReconnectConfig {
        ReconnectConfig {
            initial_interval: Duration::from_millis(100),
            max_interval: Duration::from_millis(350),
            randomization_factor: 0.0,
            max_attempts,
            circuit_threshold: 3,
            ..Default::default()
        }
    }

    fn millis(decision: ReconnectDecision) -> u128 {
        assert_matches!(decision, ReconnectDecision::Retry(d) => d.as_millis())
    }

    #[test]
    fn test_delays_grow_up_to_ceiling() {
        let mut policy = ReconnectPolicy::new(exact(None));
        let delays: Vec<_> = (0..4).map(|_| millis(policy.record_failure())).collect();
        assert_eq!(delays, vec![100, 200, 350, 350]);
    }

    #[test]
    fn test_jitter_stays_within_factor() {
        let mut policy = ReconnectPolicy::new(ReconnectConfig::default());
        let delay = assert_matches!(policy.record_failure(), ReconnectDecision::Retry(d) => d);
        assert!(delay >= Duration::from_secs(4) && delay <= Duration::from_secs(6));
    }

    #[test]
    fn test_success_resets_delay_and_circuit() {
        let mut policy = ReconnectPolicy::new(exact(None));
        for _ in 0..3 {
            policy.record_failure();
        }
        assert_eq!(policy.circuit(), CircuitState::Open);

        policy.record_success();
        assert_eq!(policy.circuit(), CircuitState::Closed);
        assert_eq!(policy.consecutive_failures(), 0);
        assert_eq!(millis(policy.record_failure()), 100);
    }

    #[test]
    fn test_gives_up_after_max_attempts() {
        let mut policy = ReconnectPolicy::new(exact(Some(2)));
        assert_matches!(policy.record_failure(), ReconnectDecision::Retry(_));
        assert_eq!(policy.record_failure(), ReconnectDecision::GiveUp);
    }

    #[test]
    fn test_unbounded_by_default() {
        let mut policy = ReconnectPolicy::new(exact(None));
        for _ in 0..50 {
            assert_matches!(policy.record_failure(), ReconnectDecision::Retry(_));
        }
    }
}
