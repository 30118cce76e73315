//! Simulation clock and time-sequence triggers.
//!
//! The clock is a plain value owned by whoever drives the simulation (the
//! tissue). Nothing in the crate reads time from a shared global.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Monotonic simulation time plus the number of completed steps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulationClock {
    pub time: f64,
    pub step_index: u64,
}

impl SimulationClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Complete one step of length `dt`.
    pub fn advance(&mut self, dt: f64) {
        debug_assert!(dt >= 0.0, "time never runs backwards");
        self.time += dt;
        self.step_index += 1;
    }
}

/// Identifier of a one-shot trigger.
pub type TriggerId = u32;

/// One-shot and interval triggers evaluated against a clock time.
///
/// One-shot triggers are keyed by an explicit [`TriggerId`] rather than by
/// the floating-point trigger time, so a trigger fires at most once even when
/// irregular `dt` values jump past the exact trigger time.
#[derive(Debug, Clone, Default)]
pub struct Sequence {
    fired: HashSet<TriggerId>,
}

impl Sequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` the first time it is called with `time >= at` for `id`.
    pub fn once(&mut self, id: TriggerId, at: f64, time: f64) -> bool {
        if time < at || self.fired.contains(&id) {
            return false;
        }
        self.fired.insert(id);
        true
    }

    /// Returns `true` while `begin <= time < end`.
    pub fn during(begin: f64, end: f64, time: f64) -> bool {
        begin <= time && time < end
    }

    pub fn has_fired(&self, id: TriggerId) -> bool {
        self.fired.contains(&id)
    }

    /// Forget all fired triggers.
    pub fn reset(&mut self) {
        self.fired.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_advances_time_and_steps() {
        let mut clock = SimulationClock::new();
        clock.advance(0.5);
        clock.advance(0.25);
        assert_eq!(clock.time, 0.75);
        assert_eq!(clock.step_index, 2);
    }

    #[test]
    fn once_fires_a_single_time_even_when_dt_skips_the_mark() {
        let mut sequence = Sequence::new();
        let mut clock = SimulationClock::new();
        let mut fired = 0;
        for dt in [0.3, 0.9, 0.01, 2.0, 0.7] {
            clock.advance(dt);
            if sequence.once(1, 1.0, clock.time) {
                fired += 1;
            }
        }
        assert_eq!(fired, 1);
        assert!(sequence.has_fired(1));
    }

    #[test]
    fn triggers_are_independent_and_resettable() {
        let mut sequence = Sequence::new();
        assert!(sequence.once(1, 0.0, 0.0));
        assert!(sequence.once(2, 0.0, 0.0));
        assert!(!sequence.once(1, 0.0, 5.0));
        sequence.reset();
        assert!(sequence.once(1, 0.0, 5.0));
    }

    #[test]
    fn during_is_half_open() {
        assert!(Sequence::during(1.0, 2.0, 1.0));
        assert!(Sequence::during(1.0, 2.0, 1.5));
        assert!(!Sequence::during(1.0, 2.0, 2.0));
        assert!(!Sequence::during(1.0, 2.0, 0.5));
    }
}
