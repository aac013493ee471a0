//! Build Progress Signalling
//!
//! The producer bumps a generation counter and wakes every waiting reader.
//! A reader remembers the generation it probed under and sleeps only while
//! the counter still holds that value, so a pulse between its probe and its
//! wait is never lost.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Condvar, Mutex, PoisonError};

use crate::config::{PulsePolicy, WaitPolicy};

/// Build generation - advanced on every pulse
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Generation(u64);

impl Generation {
    /// Nothing pulsed yet
    pub const INITIAL: Self = Generation(0);

    #[inline]
    pub const fn value(self) -> u64 {
        self.0
    }

    #[inline]
    pub const fn next(self) -> Self {
        Generation(self.0.wrapping_add(1))
    }

    /// Check if this generation is newer than another
    #[inline]
    pub fn is_newer_than(self, other: Self) -> bool {
        let diff = self.0.wrapping_sub(other.0);
        diff > 0 && diff < u64::MAX / 2
    }
}

impl Default for Generation {
    fn default() -> Self {
        Self::INITIAL
    }
}

/// Process-wide grove identifiers
static NEXT_GROVE_ID: AtomicU64 = AtomicU64::new(1);

pub(crate) fn next_grove_id() -> u64 {
    NEXT_GROVE_ID.fetch_add(1, Ordering::Relaxed)
}

/// Generation counter plus the condition readers sleep on
#[derive(Debug, Default)]
pub(crate) struct Signal {
    generation: Mutex<Generation>,
    cond: Condvar,
}

impl Signal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Generation {
        *self.generation.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Advance the generation and wake all waiters
    pub fn pulse(&self) -> Generation {
        let mut current = self.generation.lock().unwrap_or_else(PoisonError::into_inner);
        *current = current.next();
        self.cond.notify_all();
        tracing::trace!(generation = current.value(), "grove pulse");
        *current
    }

    /// Wait until the generation moves past `since`
    ///
    /// Returns `true` when it has moved. Non-blocking policies only report
    /// whether a pulse already happened.
    pub fn wait_since(&self, since: Generation, policy: WaitPolicy) -> bool {
        let guard = self.generation.lock().unwrap_or_else(PoisonError::into_inner);
        match policy {
            WaitPolicy::Poll | WaitPolicy::TreatAsAbsent => *guard != since,
            WaitPolicy::Block(None) => {
                let guard = self
                    .cond
                    .wait_while(guard, |current| *current == since)
                    .unwrap_or_else(PoisonError::into_inner);
                *guard != since
            }
            WaitPolicy::Block(Some(timeout)) => {
                let (guard, _) = self
                    .cond
                    .wait_timeout_while(guard, timeout, |current| *current == since)
                    .unwrap_or_else(PoisonError::into_inner);
                *guard != since
            }
        }
    }
}

/// Decides which producer events wake readers
///
/// Early in a build every event pulses so readers see the first nodes at
/// once; as the grove grows, pulses thin out geometrically.
#[derive(Debug, Clone)]
pub struct PulseThrottle {
    policy: PulsePolicy,
    shift: u32,
    events: u64,
}

impl PulseThrottle {
    pub fn new(policy: PulsePolicy) -> Self {
        Self {
            shift: policy.initial_shift.min(63),
            policy,
            events: 0,
        }
    }

    /// Count one event; `true` when it should pulse
    pub fn record(&mut self) -> bool {
        self.events += 1;
        let mask = (1u64 << self.shift) - 1;
        if self.events & mask != 0 {
            return false;
        }
        let threshold = self.shift + self.policy.growth_shift;
        if self.shift < self.policy.max_shift && threshold < 64 && self.events > 1u64 << threshold {
            self.shift += 1;
        }
        true
    }

    pub fn events(&self) -> u64 {
        self.events
    }

    pub fn shift(&self) -> u32 {
        self.shift
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_generation_wraparound() {
        let old = Generation(u64::MAX);
        let new = old.next();
        assert_eq!(new, Generation(0));
        assert!(new.is_newer_than(old));
        assert!(!old.is_newer_than(new));
    }

    #[test]
    fn test_throttle_schedule() {
        let mut throttle = PulseThrottle::new(PulsePolicy {
            initial_shift: 0,
            max_shift: 2,
            growth_shift: 2,
        });
        let pulsed: Vec<u64> = (1..=16)
            .filter(|_| throttle.record())
            .collect();
        assert_eq!(pulsed, [1, 2, 3, 4, 5, 6, 8, 10, 12, 16]);
        assert_eq!(throttle.shift(), 2);
    }

    #[test]
    fn test_every_event_policy() {
        let mut throttle = PulseThrottle::new(PulsePolicy::EVERY_EVENT);
        assert!((0..100).all(|_| throttle.record()));
    }

    #[test]
    fn test_poll_does_not_block() {
        let signal = Signal::new();
        let since = signal.current();
        assert!(!signal.wait_since(since, WaitPolicy::Poll));
        signal.pulse();
        assert!(signal.wait_since(since, WaitPolicy::Poll));
    }

    #[test]
    fn test_timeout_expires() {
        let signal = Signal::new();
        let since = signal.current();
        let policy = WaitPolicy::Block(Some(Duration::from_millis(10)));
        assert!(!signal.wait_since(since, policy));
    }

    #[test]
    fn test_pulse_wakes_waiter() {
        let signal = Arc::new(Signal::new());
        let since = signal.current();
        let waiter = {
            let signal = Arc::clone(&signal);
            thread::spawn(move || signal.wait_since(since, WaitPolicy::Block(None)))
        };
        thread::sleep(Duration::from_millis(5));
        signal.pulse();
        assert!(waiter.join().unwrap());
    }
}
