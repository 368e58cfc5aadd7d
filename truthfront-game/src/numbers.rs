//! Numeric conversion helpers centralizing safe numeric casts.

use num_traits::cast::cast;

use crate::constants::{SCORE_MAX, SCORE_MIN};

/// Round a f64 and clamp it to the i64 range, returning 0 for NaN values.
#[must_use]
pub fn round_f64_to_i64(value: f64) -> i64 {
    if value.is_nan() {
        return 0;
    }
    let min = cast::<i64, f64>(i64::MIN).unwrap_or(f64::MIN);
    let max = cast::<i64, f64>(i64::MAX).unwrap_or(f64::MAX);
    let clamped = value.clamp(min, max).round();
    // i64::MAX is not representable in f64; the clamp lands one past it.
    cast::<f64, i64>(clamped).unwrap_or(if clamped > 0.0 { i64::MAX } else { i64::MIN })
}

/// Convert i64 to f64 while allowing precision loss in a single location.
#[must_use]
pub fn i64_to_f64(value: i64) -> f64 {
    cast::<i64, f64>(value).unwrap_or(0.0)
}

/// Scale a signed magnitude by a policy ratio, rounding half away from zero.
#[must_use]
pub fn scale_by_ratio(value: i64, ratio: f32) -> i64 {
    round_f64_to_i64(i64_to_f64(value) * f64::from(ratio))
}

/// Add a signed delta to a score and saturate the result into `[0, 100]`.
#[must_use]
pub fn saturating_score(current: u8, delta: i64) -> u8 {
    let sum = i64::from(current).saturating_add(delta);
    let clamped = sum.clamp(i64::from(SCORE_MIN), i64::from(SCORE_MAX));
    cast::<i64, u8>(clamped).unwrap_or(SCORE_MIN)
}

/// Saturate an arbitrary signed value into the score range.
#[must_use]
pub fn clamp_score(value: i64) -> u8 {
    saturating_score(SCORE_MIN, value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounders_cover_ranges() {
        assert_eq!(round_f64_to_i64(1.6), 2);
        assert_eq!(round_f64_to_i64(f64::NAN), 0);
        assert_eq!(round_f64_to_i64(f64::MAX), i64::MAX);
    }

    #[test]
    fn ratio_scaling_rounds_half_away_from_zero() {
        assert_eq!(scale_by_ratio(6, 1.5), 9);
        assert_eq!(scale_by_ratio(1, 1.5), 2);
        assert_eq!(scale_by_ratio(-3, 1.5), -5);
        assert_eq!(scale_by_ratio(0, 1.5), 0);
    }

    #[test]
    fn scores_saturate_instead_of_wrapping() {
        assert_eq!(saturating_score(50, 1_000), 100);
        assert_eq!(saturating_score(50, -1_000), 0);
        assert_eq!(saturating_score(50, i64::MAX), 100);
        assert_eq!(saturating_score(50, i64::MIN), 0);
        assert_eq!(saturating_score(40, -10), 30);
        assert_eq!(clamp_score(250), 100);
    }
}
