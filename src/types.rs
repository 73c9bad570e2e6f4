//! Data model shared by the calculators, the store and the controller.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::TrackerError;

// ============================================================================
// Position Fix
// ============================================================================

/// A single reported geographic position with timestamp.
///
/// # Example
/// ```
/// use chrono::Utc;
/// use run_tracker::PositionFix;
/// let fix = PositionFix::new(51.5074, -0.1278, Utc::now()).with_accuracy(4.5);
/// assert!(fix.is_valid());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionFix {
    pub latitude: f64,
    pub longitude: f64,
    pub timestamp: DateTime<Utc>,
    /// Horizontal accuracy in meters, when the provider reports one
    pub accuracy: Option<f64>,
}

impl PositionFix {
    pub fn new(latitude: f64, longitude: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            latitude,
            longitude,
            timestamp,
            accuracy: None,
        }
    }

    pub fn with_accuracy(mut self, accuracy: f64) -> Self {
        self.accuracy = Some(accuracy);
        self
    }

    /// Check if the fix has valid coordinates.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

// ============================================================================
// Activity Type
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityType {
    #[default]
    Running,
    Walking,
    Cycling,
}

impl ActivityType {
    /// Stable storage key.
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityType::Running => "running",
            ActivityType::Walking => "walking",
            ActivityType::Cycling => "cycling",
        }
    }
}

impl fmt::Display for ActivityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActivityType {
    type Err = TrackerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "running" | "run" => Ok(ActivityType::Running),
            "walking" | "walk" => Ok(ActivityType::Walking),
            "cycling" | "ride" => Ok(ActivityType::Cycling),
            other => Err(TrackerError::config(format!(
                "unknown activity type '{}'",
                other
            ))),
        }
    }
}

// ============================================================================
// Run Session
// ============================================================================

/// One run-tracking activity from start to finish.
///
/// At most one session with `ended_at == None` exists at a time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSession {
    pub id: i64,
    pub started_at: DateTime<Utc>,
    /// `None` while the session is open
    pub ended_at: Option<DateTime<Utc>>,
    /// Monotonically non-decreasing within a session
    pub cumulative_distance_meters: f64,
    /// Active time, pauses excluded
    pub elapsed_active_seconds: u64,
    /// Minutes per kilometer; 0 means "no pace yet"
    pub pace_min_per_km: f64,
    /// Set once, at finish
    pub kcal: Option<u32>,
    pub activity_type: ActivityType,
}

impl RunSession {
    pub fn is_open(&self) -> bool {
        self.ended_at.is_none()
    }
}

// ============================================================================
// Track Point
// ============================================================================

/// One persisted fix tied to a session. Append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackPoint {
    pub session_id: i64,
    /// Strictly increasing per session, starting at 0
    pub sequence_index: u32,
    pub latitude: f64,
    pub longitude: f64,
    pub timestamp: DateTime<Utc>,
}

impl TrackPoint {
    pub fn from_fix(session_id: i64, sequence_index: u32, fix: &PositionFix) -> Self {
        Self {
            session_id,
            sequence_index,
            latitude: fix.latitude,
            longitude: fix.longitude,
            timestamp: fix.timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fix_validation() {
        let now = Utc::now();
        assert!(PositionFix::new(51.5074, -0.1278, now).is_valid());
        assert!(PositionFix::new(-90.0, 180.0, now).is_valid());
        assert!(!PositionFix::new(91.0, 0.0, now).is_valid());
        assert!(!PositionFix::new(0.0, -181.0, now).is_valid());
        assert!(!PositionFix::new(f64::NAN, 0.0, now).is_valid());
        assert!(!PositionFix::new(0.0, f64::INFINITY, now).is_valid());
    }

    #[test]
    fn test_activity_type_parse() {
        assert_eq!("Running".parse::<ActivityType>().unwrap(), ActivityType::Running);
        assert_eq!("ride".parse::<ActivityType>().unwrap(), ActivityType::Cycling);
        assert!("swimming".parse::<ActivityType>().is_err());
        for activity in [
            ActivityType::Running,
            ActivityType::Walking,
            ActivityType::Cycling,
        ] {
            assert_eq!(activity.as_str().parse::<ActivityType>().unwrap(), activity);
        }
    }

    #[test]
    fn test_run_session_serializes_camel_case() {
        let session = RunSession {
            id: 1,
            started_at: Utc::now(),
            ended_at: None,
            cumulative_distance_meters: 10.0,
            elapsed_active_seconds: 5,
            pace_min_per_km: 8.3,
            kcal: None,
            activity_type: ActivityType::Walking,
        };
        let json = serde_json::to_string(&session).unwrap();
        assert!(json.contains("cumulativeDistanceMeters"));
        assert!(json.contains("\"walking\""));
        assert!(session.is_open());
    }
}
