/// Lower bound of every normalized progress scalar.
pub const UNIT_MIN: f64 = 0.0;

/// Upper bound of every normalized progress scalar.
pub const UNIT_MAX: f64 = 1.0;

/// Clamp a progress scalar to the closed `[0, 1]` interval.
///
/// Non-finite input collapses to `0.0` so a corrupted value can never leak
/// into the accumulators.
pub fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        return UNIT_MIN;
    }
    value.clamp(UNIT_MIN, UNIT_MAX)
}

/// Apply a signed delta to a progress scalar, returning the clamped value.
pub fn apply_unit_delta(current: f64, delta: f64) -> f64 {
    if !delta.is_finite() {
        return clamp_unit(current);
    }
    clamp_unit(current + delta)
}

/// Sanitize a frame delta in seconds.
///
/// Negative and non-finite deltas become `0.0`. When `max` is given, the
/// delta is capped to it.
pub fn sanitize_delta(delta_seconds: f64, max: Option<f64>) -> f64 {
    if !delta_seconds.is_finite() || delta_seconds < 0.0 {
        return 0.0;
    }
    match max {
        Some(limit) if limit.is_finite() && limit >= 0.0 => delta_seconds.min(limit),
        _ => delta_seconds,
    }
}

/// Linear interpolation between `a` and `b` with `t` clamped to `[0, 1]`.
pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * clamp_unit(t)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn nan_collapses_to_zero() {
        assert_eq!(clamp_unit(f64::NAN), 0.0);
        assert_eq!(apply_unit_delta(0.4, f64::NAN), 0.4);
        assert_eq!(sanitize_delta(f64::INFINITY, None), 0.0);
    }

    #[test]
    fn sanitize_caps_large_frames() {
        assert_eq!(sanitize_delta(3.0, Some(0.25)), 0.25);
        assert_eq!(sanitize_delta(0.1, Some(0.25)), 0.1);
        assert_eq!(sanitize_delta(-0.5, Some(0.25)), 0.0);
    }

    proptest! {
        #[test]
        fn clamp_unit_never_exits_bounds(value in -1.0e6f64..1.0e6f64) {
            let clamped = clamp_unit(value);
            prop_assert!((UNIT_MIN..=UNIT_MAX).contains(&clamped));
        }

        #[test]
        fn apply_unit_delta_never_exits_bounds(
            current in 0.0f64..=1.0,
            delta in -10.0f64..10.0,
        ) {
            let next = apply_unit_delta(current, delta);
            prop_assert!((UNIT_MIN..=UNIT_MAX).contains(&next));
        }

        #[test]
        fn sanitize_delta_is_never_negative(delta in -1.0e3f64..1.0e3f64) {
            prop_assert!(sanitize_delta(delta, None) >= 0.0);
        }
    }
}
