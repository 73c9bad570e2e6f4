//! Pause-aware elapsed time.
//!
//! [`SessionClock`] implements "wall clock minus accumulated pause" once, for
//! every consumer that needs it (run sessions, the in-workout clock). Time is
//! read through the [`Clock`] trait so callers and tests control "now".

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};

// ============================================================================
// Time Sources
// ============================================================================

/// Source of the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// The system wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A manually driven clock. Clones share the same instant.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now_ms: Arc<AtomicI64>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now_ms: Arc::new(AtomicI64::new(start.timestamp_millis())),
        }
    }

    /// A clock starting at the Unix epoch plus `secs`.
    pub fn at_secs(secs: i64) -> Self {
        Self::new(Utc.timestamp_opt(secs, 0).single().unwrap_or_default())
    }

    pub fn advance(&self, by: Duration) {
        self.now_ms.fetch_add(by.num_milliseconds(), Ordering::SeqCst);
    }

    pub fn advance_secs(&self, secs: i64) {
        self.advance(Duration::seconds(secs));
    }

    pub fn set(&self, to: DateTime<Utc>) {
        self.now_ms.store(to.timestamp_millis(), Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(self.now_ms.load(Ordering::SeqCst))
            .single()
            .unwrap_or_default()
    }
}

// ============================================================================
// Session Clock
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockState {
    Stopped,
    Running,
    Paused,
}

/// Active elapsed time excluding paused intervals.
///
/// Backward jumps of the underlying clock clamp to zero instead of producing
/// negative durations.
#[derive(Debug, Clone)]
pub struct SessionClock {
    state: ClockState,
    started_at_ms: i64,
    /// Active time carried over from a previous process
    offset_ms: i64,
    total_paused_ms: i64,
    pause_began_ms: Option<i64>,
    /// Final value once stopped
    frozen_ms: Option<i64>,
}

impl Default for SessionClock {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionClock {
    pub fn new() -> Self {
        Self {
            state: ClockState::Stopped,
            started_at_ms: 0,
            offset_ms: 0,
            total_paused_ms: 0,
            pause_began_ms: None,
            frozen_ms: None,
        }
    }

    pub fn state(&self) -> ClockState {
        self.state
    }

    pub fn start(&mut self, now: DateTime<Utc>) {
        self.start_from_offset(now, 0);
    }

    /// Start counting with `offset_seconds` of active time already accrued.
    pub fn start_from_offset(&mut self, now: DateTime<Utc>, offset_seconds: u64) {
        self.state = ClockState::Running;
        self.started_at_ms = now.timestamp_millis();
        self.offset_ms = (offset_seconds as i64).saturating_mul(1000);
        self.total_paused_ms = 0;
        self.pause_began_ms = None;
        self.frozen_ms = None;
    }

    /// Pause the clock. Returns false if it was not running.
    pub fn pause(&mut self, now: DateTime<Utc>) -> bool {
        if self.state != ClockState::Running {
            return false;
        }
        self.pause_began_ms = Some(now.timestamp_millis());
        self.state = ClockState::Paused;
        true
    }

    /// Resume the clock. Returns false if it was not paused.
    pub fn resume(&mut self, now: DateTime<Utc>) -> bool {
        if self.state != ClockState::Paused {
            return false;
        }
        if let Some(began) = self.pause_began_ms.take() {
            self.total_paused_ms += (now.timestamp_millis() - began).max(0);
        }
        self.state = ClockState::Running;
        true
    }

    /// Stop the clock, freezing the elapsed value.
    pub fn stop(&mut self, now: DateTime<Utc>) {
        if self.state == ClockState::Stopped {
            return;
        }
        self.frozen_ms = Some(self.active_ms(now));
        self.pause_began_ms = None;
        self.state = ClockState::Stopped;
    }

    fn active_ms(&self, now: DateTime<Utc>) -> i64 {
        if self.state == ClockState::Stopped {
            return self.frozen_ms.unwrap_or(0);
        }
        let now_ms = now.timestamp_millis();
        let ongoing_pause = self
            .pause_began_ms
            .map_or(0, |began| (now_ms - began).max(0));
        let live = now_ms - self.started_at_ms - self.total_paused_ms - ongoing_pause;
        self.offset_ms + live.max(0)
    }

    /// Whole seconds of active time as of `now`.
    pub fn elapsed_active_seconds(&self, now: DateTime<Utc>) -> u64 {
        (self.active_ms(now) / 1000) as u64
    }
}
