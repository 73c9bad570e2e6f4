//! Pace (minutes per kilometer) from cumulative distance and active time.

/// Pace in minutes per kilometer.
///
/// Returns 0.0, the "no pace yet" sentinel, when either input is not positive.
pub fn pace_min_per_km(distance_meters: f64, elapsed_seconds: f64) -> f64 {
    if distance_meters.is_nan() || distance_meters <= 0.0 {
        return 0.0;
    }
    if elapsed_seconds.is_nan() || elapsed_seconds <= 0.0 {
        return 0.0;
    }
    (elapsed_seconds / 60.0) / (distance_meters / 1000.0)
}

/// Render a pace as `M:SS`; non-positive paces render as `--:--`.
///
/// Seconds are rounded, carrying into minutes (5:59.6 renders as `6:00`).
pub fn format_pace(pace_min_per_km: f64) -> String {
    if !pace_min_per_km.is_finite() || pace_min_per_km <= 0.0 {
        return "--:--".to_string();
    }
    let total_seconds = (pace_min_per_km * 60.0).round() as u64;
    format!("{}:{:02}", total_seconds / 60, total_seconds % 60)
}

/// Speed in km/h for a pace in min/km; 0 when there is no pace.
pub fn speed_kmh(pace_min_per_km: f64) -> f64 {
    if pace_min_per_km.is_finite() && pace_min_per_km > 0.0 {
        60.0 / pace_min_per_km
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_division_by_zero() {
        assert_eq!(pace_min_per_km(0.0, 600.0), 0.0);
        assert_eq!(pace_min_per_km(1000.0, 0.0), 0.0);
        assert_eq!(pace_min_per_km(-5.0, 600.0), 0.0);
        assert_eq!(pace_min_per_km(f64::NAN, 600.0), 0.0);
    }

    #[test]
    fn test_pace_value() {
        assert!((pace_min_per_km(1000.0, 300.0) - 5.0).abs() < 1e-9);
        assert!((pace_min_per_km(1200.0, 600.0) - 8.333_333).abs() < 1e-5);
    }

    #[test]
    fn test_format_pace() {
        assert_eq!(format_pace(5.0), "5:00");
        assert_eq!(format_pace(5.5), "5:30");
        assert_eq!(format_pace(4.999), "5:00");
        assert_eq!(format_pace(5.0 + 59.6 / 60.0), "6:00");
        assert_eq!(format_pace(12.25), "12:15");
        assert_eq!(format_pace(0.0), "--:--");
        assert_eq!(format_pace(-1.0), "--:--");
        assert_eq!(format_pace(f64::INFINITY), "--:--");
    }

    #[test]
    fn test_speed() {
        assert_eq!(speed_kmh(6.0), 10.0);
        assert_eq!(speed_kmh(0.0), 0.0);
    }
}
