//! # Budget Module
//!
//! Resource limits for the potentially long-running operators
//! (minimization, projection, infinite quantification).
//!
//! - `Limits` is the serializable configuration (state cap, timeout)
//! - `Budget` is one running call's view of those limits (absolute deadline)
//!
//! An exceeded budget surfaces as `AutstrError::ResourceExceeded`; partial
//! results are never returned.

use crate::primitives::{DEADLINE_CHECK_INTERVAL, DEFAULT_MAX_STATES};
use crate::types::AutstrError;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Configured limits for one boundary call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Limits {
    /// Maximum number of states a single operator may create.
    pub max_states: Option<usize>,
    /// Wall-clock budget in milliseconds.
    pub timeout_ms: Option<u64>,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_states: Some(DEFAULT_MAX_STATES),
            timeout_ms: None,
        }
    }
}

impl Limits {
    /// Limits that never trigger.
    #[must_use]
    pub const fn unlimited() -> Self {
        Self {
            max_states: None,
            timeout_ms: None,
        }
    }

    /// Replace the state cap.
    #[must_use]
    pub const fn with_max_states(mut self, max_states: usize) -> Self {
        self.max_states = Some(max_states);
        self
    }

    /// Replace the timeout.
    #[must_use]
    pub const fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = Some(timeout_ms);
        self
    }

    /// Start a budget: the deadline is fixed relative to now.
    #[must_use]
    pub fn start(&self) -> Budget {
        Budget {
            max_states: self.max_states,
            deadline: self
                .timeout_ms
                .map(|ms| Instant::now() + Duration::from_millis(ms)),
            timeout_ms: self.timeout_ms,
        }
    }
}

/// A running budget.
#[derive(Debug, Clone, Copy)]
pub struct Budget {
    max_states: Option<usize>,
    deadline: Option<Instant>,
    timeout_ms: Option<u64>,
}

impl Budget {
    /// A budget that never runs out.
    #[must_use]
    pub fn unlimited() -> Self {
        Limits::unlimited().start()
    }

    /// Check a state count produced by `operation`.
    ///
    /// The wall clock is consulted every `DEADLINE_CHECK_INTERVAL` states.
    pub fn check_states(&self, operation: &'static str, states: usize) -> Result<(), AutstrError> {
        if let Some(max) = self.max_states.filter(|&max| states > max) {
            return Err(AutstrError::ResourceExceeded {
                operation,
                limit: format!("more than {} states", max),
            });
        }
        if states % DEADLINE_CHECK_INTERVAL == 0 {
            self.check_deadline(operation)?;
        }
        Ok(())
    }

    /// A counter for the inner loops of `operation`.
    #[must_use]
    pub fn ticker(&self, operation: &'static str) -> Ticker<'_> {
        Ticker {
            budget: self,
            operation,
            work: 0,
        }
    }

    /// Check the wall-clock deadline.
    pub fn check_deadline(&self, operation: &'static str) -> Result<(), AutstrError> {
        match (self.deadline, self.timeout_ms) {
            (Some(deadline), Some(ms)) if Instant::now() > deadline => {
                Err(AutstrError::ResourceExceeded {
                    operation,
                    limit: format!("timeout of {} ms", ms),
                })
            }
            _ => Ok(()),
        }
    }
}

/// Counts units of work and consults the wall clock every
/// `DEADLINE_CHECK_INTERVAL` units.
///
/// A single new state can cost a sweep over every product symbol, so the
/// per-state checks alone overshoot the deadline on wide automata.
#[derive(Debug)]
pub struct Ticker<'a> {
    budget: &'a Budget,
    operation: &'static str,
    work: usize,
}

impl Ticker<'_> {
    /// Record one unit of work.
    pub fn tick(&mut self) -> Result<(), AutstrError> {
        self.work = self.work.wrapping_add(1);
        if self.work % DEADLINE_CHECK_INTERVAL == 0 {
            self.budget.check_deadline(self.operation)?;
        }
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    #[test]
    fn default_limits_cap_states() {
        let limits = Limits::default();
        assert_eq!(limits.max_states, Some(DEFAULT_MAX_STATES));
        assert_eq!(limits.timeout_ms, None);
    }

    #[test]
    fn state_cap_is_enforced() {
        let budget = Limits::unlimited().with_max_states(10).start();
        assert!(budget.check_states("test", 10).is_ok());
        let err = budget.check_states("test", 11).expect_err("over cap");
        assert_eq!(err.kind(), ErrorKind::ResourceExceeded);
    }

    #[test]
    fn expired_deadline_is_reported() {
        let budget = Limits::unlimited().with_timeout_ms(0).start();
        std::thread::sleep(Duration::from_millis(2));
        assert!(budget.check_deadline("test").is_err());
    }

    #[test]
    fn ticker_checks_the_clock_between_states() {
        let budget = Limits::unlimited().with_timeout_ms(0).start();
        std::thread::sleep(Duration::from_millis(2));
        let mut ticker = budget.ticker("sweep");
        let err = (0..DEADLINE_CHECK_INTERVAL)
            .try_for_each(|_| ticker.tick())
            .expect_err("deadline passed");
        assert!(matches!(
            err,
            AutstrError::ResourceExceeded {
                operation: "sweep",
                ..
            }
        ));
    }

    #[test]
    fn unlimited_never_fails() {
        let budget = Budget::unlimited();
        assert!(budget.check_states("test", usize::MAX).is_ok());
        assert!(budget.check_deadline("test").is_ok());
    }
}
