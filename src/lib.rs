//! # Run Tracker
//!
//! Resumable run-tracking session engine for mobile clients.
//!
//! This library provides:
//! - Incremental great-circle distance over a live, noisy stream of GPS fixes
//! - Pace (min/km) and MET-based calorie estimation
//! - A start / pause / resume / finish session lifecycle that survives process
//!   restarts without replaying raw track history
//! - SQLite persistence of sessions and track points
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use run_tracker::{
//!     ActivityType, ChannelPositionSource, RunSessionController, SqliteSessionStore,
//!     SystemClock, TrackerConfig,
//! };
//!
//! # async fn demo() -> run_tracker::Result<()> {
//! let config = TrackerConfig::default();
//! let store = Arc::new(SqliteSessionStore::from_config(&config)?);
//! let source = Arc::new(ChannelPositionSource::new());
//!
//! let controller =
//!     RunSessionController::initialize(store, source.clone(), Arc::new(SystemClock), config)
//!         .await?;
//! controller.start(ActivityType::Running).await?;
//! // ... the platform location provider pushes fixes into `source` ...
//! let kcal = controller.finish(70.0).await?;
//! println!("Burned {} kcal", kcal);
//! # Ok(())
//! # }
//! ```

// Unified error handling
pub mod error;
pub use error::{ErrorKind, Result, SourceError, TrackerError};

// Data model
pub mod types;
pub use types::{ActivityType, PositionFix, RunSession, TrackPoint};

// Configuration
pub mod config;
pub use config::TrackerConfig;

// Geographic utilities (haversine, distance accumulation)
pub mod geo_utils;
pub use geo_utils::{haversine_distance, segment_distance, DistanceAccumulator};

// Pace computation and display
pub mod pace;
pub use pace::{format_pace, pace_min_per_km};

// MET tables and energy expenditure
pub mod calories;
pub use calories::{calories, estimate_kcal, met_for};

// Pause-aware elapsed time
pub mod clock;
pub use clock::{Clock, ClockState, ManualClock, SessionClock, SystemClock};

// In-workout elapsed + rest countdown
pub mod workout_clock;
pub use workout_clock::WorkoutClock;

// Position stream abstraction
pub mod source;
pub use source::{ChannelPositionSource, FixStream, PositionSource};

// Durable session storage
pub mod store;
pub use store::{SessionStore, SqliteSessionStore};

// Session state machine
pub mod controller;
pub use controller::{
    DisplayTicker, FixOutcome, GpsStatus, LiveStats, RunSessionController, SessionState,
};

/// Initialize logging for Android
#[cfg(target_os = "android")]
pub fn init_logging() {
    use android_logger::Config;
    use log::LevelFilter;

    android_logger::init_once(
        Config::default()
            .with_max_level(LevelFilter::Debug)
            .with_tag("run_tracker"),
    );
}

#[cfg(not(target_os = "android"))]
pub fn init_logging() {
    // No-op on non-Android platforms
}
