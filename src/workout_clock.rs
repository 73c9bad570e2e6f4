//! In-workout clock: total elapsed time plus a rest countdown.
//!
//! Both readings are [`SessionClock`]s, so pausing the workout also freezes
//! any running rest period.

use chrono::{DateTime, Utc};

use crate::clock::{ClockState, SessionClock};

#[derive(Debug, Clone)]
struct RestPeriod {
    clock: SessionClock,
    duration_secs: u64,
}

#[derive(Debug, Clone, Default)]
pub struct WorkoutClock {
    elapsed: SessionClock,
    rest: Option<RestPeriod>,
}

impl WorkoutClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self, now: DateTime<Utc>) {
        self.elapsed.start(now);
        self.rest = None;
    }

    pub fn pause(&mut self, now: DateTime<Utc>) {
        if self.elapsed.pause(now) {
            if let Some(rest) = self.rest.as_mut() {
                rest.clock.pause(now);
            }
        }
    }

    pub fn resume(&mut self, now: DateTime<Utc>) {
        if self.elapsed.resume(now) {
            if let Some(rest) = self.rest.as_mut() {
                rest.clock.resume(now);
            }
        }
    }

    pub fn is_paused(&self) -> bool {
        self.elapsed.state() == ClockState::Paused
    }

    pub fn elapsed_seconds(&self, now: DateTime<Utc>) -> u64 {
        self.elapsed.elapsed_active_seconds(now)
    }

    /// Begin a rest countdown, replacing any running one.
    pub fn start_rest(&mut self, now: DateTime<Utc>, duration_secs: u64) {
        let mut clock = SessionClock::new();
        clock.start(now);
        if self.is_paused() {
            clock.pause(now);
        }
        self.rest = Some(RestPeriod {
            clock,
            duration_secs,
        });
    }

    /// Seconds left in the current rest, or `None` when not resting.
    pub fn rest_remaining(&self, now: DateTime<Utc>) -> Option<u64> {
        self.rest.as_ref().map(|rest| {
            rest.duration_secs
                .saturating_sub(rest.clock.elapsed_active_seconds(now))
        })
    }

    pub fn skip_rest(&mut self) {
        self.rest = None;
    }

    pub fn finish(&mut self, now: DateTime<Utc>) -> u64 {
        self.elapsed.stop(now);
        self.rest = None;
        self.elapsed.elapsed_active_seconds(now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{Clock, ManualClock};

    #[test]
    fn test_rest_countdown() {
        let clock = ManualClock::at_secs(0);
        let mut workout = WorkoutClock::new();
        workout.start(clock.now());
        clock.advance_secs(120);

        workout.start_rest(clock.now(), 90);
        clock.advance_secs(30);
        assert_eq!(workout.rest_remaining(clock.now()), Some(60));
        clock.advance_secs(100);
        assert_eq!(workout.rest_remaining(clock.now()), Some(0));
        assert_eq!(workout.elapsed_seconds(clock.now()), 250);

        workout.skip_rest();
        assert_eq!(workout.rest_remaining(clock.now()), None);
    }

    #[test]
    fn test_pause_freezes_rest() {
        let clock = ManualClock::at_secs(0);
        let mut workout = WorkoutClock::new();
        workout.start(clock.now());
        workout.start_rest(clock.now(), 60);
        clock.advance_secs(10);

        workout.pause(clock.now());
        assert!(workout.is_paused());
        clock.advance_secs(300);
        assert_eq!(workout.rest_remaining(clock.now()), Some(50));

        workout.resume(clock.now());
        clock.advance_secs(5);
        assert_eq!(workout.rest_remaining(clock.now()), Some(45));
        assert_eq!(workout.finish(clock.now()), 15);
    }
}
