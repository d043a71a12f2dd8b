//! The evaluation work queue.
//!
//! Holds at most one pending request. Requests that arrive while one is pending are merged into it,
//! so that any number of events during an evaluation results in exactly one follow-up evaluation.
use core::cell::Cell;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::signal::Signal;

/// Why an evaluation was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Reason {
    /// First evaluation after start.
    Startup,
    /// An OTGSC interrupt.
    Interrupt,
    /// A cable notification.
    Cable,
    /// A write to the control surface.
    Control,
    /// The host stack reported a connection change.
    HostConnect,
}

impl Reason {
    const fn bit(self) -> u8 {
        1 << self as u8
    }
}

/// A set of [`Reason`]s.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Reasons(u8);

impl Reasons {
    /// Whether the set contains `reason`.
    pub const fn contains(self, reason: Reason) -> bool {
        self.0 & reason.bit() != 0
    }

    const fn with(self, reason: Reason) -> Self {
        Self(self.0 | reason.bit())
    }
}

impl From<Reason> for Reasons {
    fn from(reason: Reason) -> Self {
        Reasons::default().with(reason)
    }
}

/// A pending evaluation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Request {
    /// Delay before the evaluation runs.
    pub delay_ms: u64,
    /// All reasons that were merged into this request.
    pub reasons: Reasons,
}

impl Request {
    fn merge(self, reason: Reason) -> Self {
        Self {
            delay_ms: self.delay_ms,
            reasons: self.reasons.with(reason),
        }
    }
}

/// Single-slot, coalescing work queue.
pub struct WorkQueue<M: RawMutex> {
    /// The lock only guards the coalescing decision.
    pending: Mutex<M, Cell<Option<Request>>>,
    signal: Signal<M, ()>,
}

impl<M: RawMutex> WorkQueue<M> {
    /// Create an empty queue.
    pub const fn new() -> Self {
        Self {
            pending: Mutex::new(Cell::new(None)),
            signal: Signal::new(),
        }
    }

    /// Request an evaluation after `delay_ms`.
    ///
    /// Returns `false`, if the request was merged into one that is already pending.
    /// The pending request keeps its delay, so that an early event cannot cut the startup grace
    /// period short.
    pub fn request(&self, delay_ms: u64, reason: Reason) -> bool {
        let queued = self.pending.lock(|pending| match pending.get() {
            Some(request) => {
                pending.set(Some(request.merge(reason)));
                false
            }
            None => {
                pending.set(Some(Request {
                    delay_ms,
                    reasons: reason.into(),
                }));
                true
            }
        });

        self.signal.signal(());
        queued
    }

    /// Whether a request is pending.
    pub fn is_pending(&self) -> bool {
        self.pending.lock(|pending| pending.get().is_some())
    }

    /// Wait for the next request and take it from the queue.
    pub async fn wait(&self) -> Request {
        loop {
            self.signal.wait().await;

            if let Some(request) = self.pending.lock(|pending| pending.take()) {
                return request;
            }
        }
    }
}

impl<M: RawMutex> Default for WorkQueue<M> {
    fn default() -> Self {
        Self::new()
    }
}
