//! Geographic utilities: great-circle distance and incremental accumulation.
//!
//! No jitter filtering is performed. A stationary receiver that reports
//! wandering fixes accumulates that wander as distance.

use log::warn;

use crate::error::{Result, TrackerError};
use crate::types::PositionFix;

/// Earth's mean radius in meters.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Great-circle distance between two fixes in meters (haversine formula).
///
/// # Example
/// ```
/// use chrono::Utc;
/// use run_tracker::{haversine_distance, PositionFix};
/// let now = Utc::now();
/// let a = PositionFix::new(0.0, 0.0, now);
/// let b = PositionFix::new(0.0, 1.0, now);
/// let d = haversine_distance(&a, &b);
/// assert!((d - 111_195.0).abs() < 1_112.0);
/// ```
pub fn haversine_distance(p1: &PositionFix, p2: &PositionFix) -> f64 {
    let lat1 = p1.latitude.to_radians();
    let lat2 = p2.latitude.to_radians();
    let d_lat = (p2.latitude - p1.latitude).to_radians();
    let d_lng = (p2.longitude - p1.longitude).to_radians();

    let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);
    // Rounding can push `a` a hair past 1 for antipodal points
    let a = a.clamp(0.0, 1.0);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_METERS * c
}

/// Validate a fix, returning `InvalidFix` for non-finite or out-of-range coordinates.
pub fn validate_fix(fix: &PositionFix) -> Result<()> {
    if fix.is_valid() {
        return Ok(());
    }
    Err(TrackerError::InvalidFix {
        message: format!(
            "coordinates out of range: lat={}, lng={}",
            fix.latitude, fix.longitude
        ),
    })
}

/// Distance contributed by `curr` given the previous accepted fix.
///
/// The first fix of a session has no predecessor and contributes zero.
pub fn segment_distance(prev: Option<&PositionFix>, curr: &PositionFix) -> Result<f64> {
    validate_fix(curr)?;
    Ok(prev.map_or(0.0, |p| haversine_distance(p, curr)))
}

/// Running total of great-circle distance over a stream of fixes.
///
/// Totals depend only on the sequence of accepted fixes, never on how they
/// were batched into [`add_fix`](Self::add_fix) / [`extend`](Self::extend) calls.
#[derive(Debug, Clone, Default)]
pub struct DistanceAccumulator {
    last: Option<PositionFix>,
    total_meters: f64,
    accepted: u64,
}

impl DistanceAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a persisted total. The next fix establishes a fresh baseline.
    pub fn with_total(total_meters: f64) -> Self {
        Self {
            last: None,
            total_meters: total_meters.max(0.0),
            accepted: 0,
        }
    }

    /// Accept a fix and return the distance it added.
    ///
    /// Invalid fixes are rejected and leave the accumulator untouched.
    pub fn add_fix(&mut self, fix: &PositionFix) -> Result<f64> {
        let delta = segment_distance(self.last.as_ref(), fix)?;
        self.total_meters += delta;
        self.last = Some(*fix);
        self.accepted += 1;
        Ok(delta)
    }

    /// Accept a batch of fixes, skipping (and logging) invalid ones.
    pub fn extend<'a, I>(&mut self, fixes: I) -> f64
    where
        I: IntoIterator<Item = &'a PositionFix>,
    {
        let mut added = 0.0;
        for fix in fixes {
            match self.add_fix(fix) {
                Ok(delta) => added += delta,
                Err(e) => warn!("run_tracker: [Distance] Dropping fix: {}", e),
            }
        }
        added
    }

    pub fn total_meters(&self) -> f64 {
        self.total_meters
    }

    pub fn last_fix(&self) -> Option<&PositionFix> {
        self.last.as_ref()
    }

    /// Number of fixes accepted since construction.
    pub fn accepted_count(&self) -> u64 {
        self.accepted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn fix(lat: f64, lng: f64) -> PositionFix {
        PositionFix::new(lat, lng, Utc::now())
    }

    fn sample_track() -> Vec<PositionFix> {
        (0..20)
            .map(|i| fix(51.5074 + i as f64 * 0.0007, -0.1278 + i as f64 * 0.0004))
            .collect()
    }

    #[test]
    fn test_one_degree_of_longitude_at_equator() {
        let d = haversine_distance(&fix(0.0, 0.0), &fix(0.0, 1.0));
        assert!((d - 111_195.0).abs() / 111_195.0 < 0.01, "got {}", d);
    }

    #[test]
    fn test_identity_and_symmetry() {
        let a = fix(48.8566, 2.3522);
        let b = fix(51.5074, -0.1278);
        assert_eq!(haversine_distance(&a, &a), 0.0);
        assert_eq!(haversine_distance(&a, &b), haversine_distance(&b, &a));
    }

    #[test]
    fn test_antipodal_points_are_finite() {
        let d = haversine_distance(&fix(0.0, 0.0), &fix(0.0, 180.0));
        assert!(d.is_finite());
        assert!((d - std::f64::consts::PI * EARTH_RADIUS_METERS).abs() < 1.0);
    }

    #[test]
    fn test_first_fix_is_baseline() {
        let mut acc = DistanceAccumulator::new();
        assert_eq!(acc.add_fix(&fix(10.0, 10.0)).unwrap(), 0.0);
        assert_eq!(acc.total_meters(), 0.0);
        assert!(acc.add_fix(&fix(10.001, 10.0)).unwrap() > 100.0);
    }

    #[test]
    fn test_invalid_fix_rejected_without_side_effects() {
        let mut acc = DistanceAccumulator::new();
        acc.add_fix(&fix(10.0, 10.0)).unwrap();
        let err = acc.add_fix(&fix(95.0, 10.0)).unwrap_err();
        assert!(matches!(err, TrackerError::InvalidFix { .. }));
        assert!(acc.add_fix(&fix(f64::NAN, 10.0)).is_err());
        assert_eq!(acc.accepted_count(), 1);
        assert_eq!(acc.last_fix().unwrap().latitude, 10.0);
    }

    #[test]
    fn test_total_independent_of_batching() {
        let track = sample_track();
        let expected: f64 = track
            .windows(2)
            .map(|w| haversine_distance(&w[0], &w[1]))
            .sum();

        let mut one_by_one = DistanceAccumulator::new();
        for f in &track {
            one_by_one.add_fix(f).unwrap();
        }

        let mut batched = DistanceAccumulator::new();
        for chunk in track.chunks(7) {
            batched.extend(chunk);
        }

        assert!((one_by_one.total_meters() - expected).abs() < 1e-6);
        assert!((batched.total_meters() - expected).abs() < 1e-6);
    }

    #[test]
    fn test_extend_skips_invalid() {
        let mut acc = DistanceAccumulator::new();
        let fixes = vec![fix(0.0, 0.0), fix(0.0, 200.0), fix(0.0, 0.001)];
        let added = acc.extend(&fixes);
        assert_eq!(acc.accepted_count(), 2);
        assert!((added - haversine_distance(&fixes[0], &fixes[2])).abs() < 1e-9);
    }

    #[test]
    fn test_with_total_rebaselines() {
        let mut acc = DistanceAccumulator::with_total(1200.0);
        assert_eq!(acc.add_fix(&fix(1.0, 1.0)).unwrap(), 0.0);
        assert_eq!(acc.total_meters(), 1200.0);
    }
}
