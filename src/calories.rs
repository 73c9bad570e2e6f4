//! MET-based energy expenditure.
//!
//! kcal = MET × body weight (kg) × active duration (h). Duration is always the
//! pause-excluded active time, never wall-clock time.

use crate::pace::speed_kmh;
use crate::types::ActivityType;

/// MET value for an activity at a given pace (min/km).
///
/// A pace of 0 or less means speed 0 and lands in the lowest bucket.
pub fn met_for(activity: ActivityType, pace_min_per_km: f64) -> f64 {
    match activity {
        ActivityType::Running => {
            let pace = if pace_min_per_km > 0.0 {
                pace_min_per_km
            } else {
                f64::INFINITY
            };
            if pace <= 4.0 {
                12.0
            } else if pace <= 5.0 {
                10.0
            } else if pace <= 6.0 {
                8.5
            } else if pace <= 7.0 {
                7.0
            } else {
                5.5
            }
        }
        ActivityType::Walking => {
            let speed = speed_kmh(pace_min_per_km);
            if speed < 4.0 {
                2.8
            } else if speed < 5.5 {
                3.5
            } else if speed < 6.5 {
                4.3
            } else {
                5.0
            }
        }
        ActivityType::Cycling => {
            let speed = speed_kmh(pace_min_per_km);
            if speed < 16.0 {
                4.0
            } else if speed < 19.0 {
                6.0
            } else if speed < 22.0 {
                8.0
            } else if speed < 25.0 {
                10.0
            } else {
                12.0
            }
        }
    }
}

/// Kilocalories, rounded half away from zero.
pub fn calories(met: f64, weight_kg: f64, duration_hours: f64) -> u32 {
    let kcal = met * weight_kg * duration_hours;
    if !kcal.is_finite() || kcal <= 0.0 {
        return 0;
    }
    kcal.round() as u32
}

/// Kilocalories for a session given its pace and active seconds.
pub fn estimate_kcal(
    activity: ActivityType,
    pace_min_per_km: f64,
    elapsed_active_seconds: u64,
    weight_kg: f64,
) -> u32 {
    let met = met_for(activity, pace_min_per_km);
    calories(met, weight_kg, elapsed_active_seconds as f64 / 3600.0)
}
