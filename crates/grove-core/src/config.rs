//! Grove Configuration
//!
//! Per-grove policies fixed at construction: how readers wait for data
//! that has not been produced yet, and how often the producer wakes them.

use std::time::Duration;

use crate::AccessError;

/// What a reader does when the answer may still arrive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitPolicy {
    /// Block until the producer signals; `Some(timeout)` bounds each wait
    Block(Option<Duration>),
    /// Never block; report `Blocked` so the caller can retry later
    Poll,
    /// Never block; report `Absent` as if the grove were complete
    TreatAsAbsent,
}

impl WaitPolicy {
    /// Failure reported when waiting did not make progress
    pub(crate) fn unavailable(self) -> AccessError {
        match self {
            WaitPolicy::TreatAsAbsent => AccessError::Absent,
            WaitPolicy::Block(_) | WaitPolicy::Poll => AccessError::Blocked,
        }
    }
}

impl Default for WaitPolicy {
    fn default() -> Self {
        WaitPolicy::Block(None)
    }
}

/// Producer wakeup throttling
///
/// The producer signals after every `2^shift` events. `shift` starts at
/// `initial_shift` and grows by one, up to `max_shift`, each time the
/// event count passes `2^(shift + growth_shift)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PulsePolicy {
    pub initial_shift: u32,
    pub max_shift: u32,
    pub growth_shift: u32,
}

impl PulsePolicy {
    /// Signal on every event
    pub const EVERY_EVENT: Self = Self {
        initial_shift: 0,
        max_shift: 0,
        growth_shift: 0,
    };
}

impl Default for PulsePolicy {
    fn default() -> Self {
        Self {
            initial_shift: 0,
            max_shift: 8,
            growth_shift: 10,
        }
    }
}

/// Grove construction settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroveConfig {
    pub wait: WaitPolicy,
    pub pulse: PulsePolicy,
    /// Initial chunk arena capacity
    pub chunk_capacity: usize,
}

impl GroveConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_wait_policy(mut self, wait: WaitPolicy) -> Self {
        self.wait = wait;
        self
    }

    pub fn with_pulse_policy(mut self, pulse: PulsePolicy) -> Self {
        self.pulse = pulse;
        self
    }

    pub fn with_chunk_capacity(mut self, chunk_capacity: usize) -> Self {
        self.chunk_capacity = chunk_capacity;
        self
    }
}

impl Default for GroveConfig {
    fn default() -> Self {
        Self {
            wait: WaitPolicy::default(),
            pulse: PulsePolicy::default(),
            chunk_capacity: 1024,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unavailable_outcome() {
        assert_eq!(WaitPolicy::Poll.unavailable(), AccessError::Blocked);
        assert_eq!(WaitPolicy::Block(None).unavailable(), AccessError::Blocked);
        assert_eq!(WaitPolicy::TreatAsAbsent.unavailable(), AccessError::Absent);
    }

    #[test]
    fn test_builder_setters() {
        let config = GroveConfig::new()
            .with_wait_policy(WaitPolicy::Poll)
            .with_chunk_capacity(16);
        assert_eq!(config.wait, WaitPolicy::Poll);
        assert_eq!(config.chunk_capacity, 16);
        assert_eq!(config.pulse, PulsePolicy::default());
    }
}
