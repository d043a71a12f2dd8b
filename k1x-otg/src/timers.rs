//! Timers that are used by the state machine.

/// The timer trait to implement by the user application.
pub trait Timer {
    /// Expire after the specified number of milliseconds.
    fn after_millis(milliseconds: u64) -> impl Future<Output = ()>;

    /// A monotonic timestamp in milliseconds.
    fn now_millis() -> u64;
}

use core::fmt;
use core::future::{Future, pending};

use crate::config::Config;
use crate::state::OtgState;

/// Types of timers that are used for timeouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TimerType {
    /// Bounds the time that a B-device gets for connecting.
    AWaitBcon,
}

impl TimerType {
    /// The state in which this timer may be armed.
    pub const fn owner(self) -> OtgState {
        match self {
            TimerType::AWaitBcon => OtgState::AWaitBcon,
        }
    }

    /// Expiry duration, as configured.
    pub const fn duration_ms(self, config: &Config) -> u64 {
        match self {
            TimerType::AWaitBcon => config.a_wait_bcon_timeout_ms,
        }
    }
}

impl fmt::Display for TimerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimerType::AWaitBcon => f.write_str("a_wait_bcon"),
        }
    }
}

/// Errors of timer operations.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TimerError {
    /// The timer is still pending and must be cancelled first.
    #[error("timer `{0}` is already pending")]
    AlreadyPending(TimerType),
}

/// A one-shot, deadline based timer.
///
/// Only the worker arms, cancels and waits on it. Since the deadline is absolute,
/// waiting again after an unrelated wakeup does not restart the countdown.
#[derive(Debug)]
pub struct OtgTimer {
    timer_type: TimerType,
    deadline: Option<u64>,
}

impl OtgTimer {
    /// Create an idle timer.
    pub const fn new(timer_type: TimerType) -> Self {
        Self {
            timer_type,
            deadline: None,
        }
    }

    /// The type of this timer.
    pub fn timer_type(&self) -> TimerType {
        self.timer_type
    }

    /// Whether the timer is armed and has not expired yet.
    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Arm the timer, to expire after `milliseconds`.
    pub fn arm<TIMER: Timer>(&mut self, milliseconds: u64) -> Result<(), TimerError> {
        if self.deadline.is_some() {
            return Err(TimerError::AlreadyPending(self.timer_type));
        }

        self.deadline = Some(TIMER::now_millis().saturating_add(milliseconds));
        Ok(())
    }

    /// Cancel the timer. Does nothing, if it is not pending.
    ///
    /// Returns whether the timer was pending.
    pub fn cancel(&mut self) -> bool {
        self.deadline.take().is_some()
    }

    /// Consume an expiry. Returns `false` for a stale expiry of a timer that is no longer pending.
    pub(crate) fn expire(&mut self) -> bool {
        self.deadline.take().is_some()
    }

    /// Wait for the deadline. Never resolves while the timer is idle.
    pub async fn wait<TIMER: Timer>(&self) -> TimerType {
        match self.deadline {
            Some(deadline) => {
                TIMER::after_millis(deadline.saturating_sub(TIMER::now_millis())).await;
                self.timer_type
            }
            None => pending().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{OtgTimer, TimerError, TimerType};
    use crate::config::Config;
    use crate::dummy::DummyTimer;
    use crate::state::OtgState;

    #[test]
    fn test_arm_twice() {
        let mut timer = OtgTimer::new(TimerType::AWaitBcon);
        assert!(!timer.is_pending());

        timer.arm::<DummyTimer>(2000).unwrap();
        assert!(timer.is_pending());
        assert_eq!(
            timer.arm::<DummyTimer>(2000),
            Err(TimerError::AlreadyPending(TimerType::AWaitBcon))
        );

        assert!(timer.cancel());
        timer.arm::<DummyTimer>(2000).unwrap();
    }

    #[test]
    fn test_cancel_idle() {
        let mut timer = OtgTimer::new(TimerType::AWaitBcon);
        assert!(!timer.cancel());
        assert!(!timer.expire());
    }

    #[test]
    fn test_owner_and_duration() {
        let config = Config::default().with_a_wait_bcon_timeout_ms(500);

        assert_eq!(TimerType::AWaitBcon.owner(), OtgState::AWaitBcon);
        assert_eq!(TimerType::AWaitBcon.duration_ms(&config), 500);
    }

    #[tokio::test]
    async fn test_wait_idle() {
        let timer = OtgTimer::new(TimerType::AWaitBcon);

        let result = tokio::time::timeout(std::time::Duration::from_millis(10), timer.wait::<DummyTimer>()).await;
        assert!(result.is_err());
    }
}
