//! Shared windowing primitives over a single slug's series.
//!
//! All functions treat `f64::NAN` as a missing value and return a series of
//! the same length as their input. Rolling windows count only present values
//! toward `min_periods`; shift-based helpers leave the first `n` slots missing.

/// Apply `reduce` to the present values of each trailing window of `window`
/// rows. Emits NaN where fewer than `min_periods` values are present.
pub fn rolling<F>(values: &[f64], window: usize, min_periods: usize, reduce: F) -> Vec<f64>
where
    F: Fn(&[f64]) -> f64,
{
    let window = window.max(1);
    let min_periods = min_periods.max(1);
    let mut buf = Vec::with_capacity(window);
    let mut out = Vec::with_capacity(values.len());

    for i in 0..values.len() {
        let start = (i + 1).saturating_sub(window);
        buf.clear();
        buf.extend(values[start..=i].iter().copied().filter(|v| !v.is_nan()));
        if buf.len() >= min_periods {
            out.push(reduce(&buf));
        } else {
            out.push(f64::NAN);
        }
    }

    out
}

pub fn rolling_mean(values: &[f64], window: usize, min_periods: usize) -> Vec<f64> {
    rolling(values, window, min_periods, |w| {
        w.iter().sum::<f64>() / w.len() as f64
    })
}

pub fn rolling_sum(values: &[f64], window: usize, min_periods: usize) -> Vec<f64> {
    rolling(values, window, min_periods, |w| w.iter().sum())
}

pub fn rolling_max(values: &[f64], window: usize, min_periods: usize) -> Vec<f64> {
    rolling(values, window, min_periods, |w| {
        w.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    })
}

pub fn rolling_min(values: &[f64], window: usize, min_periods: usize) -> Vec<f64> {
    rolling(values, window, min_periods, |w| {
        w.iter().copied().fold(f64::INFINITY, f64::min)
    })
}

/// Exponentially weighted mean with `alpha = 2 / (span + 1)`, no bias
/// adjustment.
///
/// Seeded at the first present value; leading missing values stay missing.
/// A missing value after the seed repeats the previous mean, and the weight
/// of that mean keeps decaying across the gap, so the next present value
/// counts for more than it would after a single step.
pub fn ewm_mean(values: &[f64], span: usize) -> Vec<f64> {
    let alpha = 2.0 / (span.max(1) as f64 + 1.0);
    let mut out = Vec::with_capacity(values.len());
    let mut mean = f64::NAN;
    let mut mean_weight = 1.0;

    for &v in values {
        if mean.is_nan() {
            mean = v;
        } else if v.is_nan() {
            mean_weight *= 1.0 - alpha;
        } else {
            mean_weight *= 1.0 - alpha;
            mean = (mean_weight * mean + alpha * v) / (mean_weight + alpha);
            mean_weight = 1.0;
        }
        out.push(mean);
    }

    out
}

/// Values shifted forward by `n` rows; the first `n` slots are missing.
pub fn shift(values: &[f64], n: usize) -> Vec<f64> {
    (0..values.len())
        .map(|i| if i >= n { values[i - n] } else { f64::NAN })
        .collect()
}

/// `x[i] - x[i-n]`.
pub fn diff(values: &[f64], n: usize) -> Vec<f64> {
    values
        .iter()
        .zip(shift(values, n))
        .map(|(&curr, prev)| curr - prev)
        .collect()
}

/// `x[i] / x[i-n] - 1`. A zero prior value yields ±inf (or NaN for 0/0).
pub fn pct_change(values: &[f64], n: usize) -> Vec<f64> {
    values
        .iter()
        .zip(shift(values, n))
        .map(|(&curr, prev)| curr / prev - 1.0)
        .collect()
}

/// Running sum that skips missing values; missing inputs stay missing in
/// the output without resetting the accumulator.
pub fn cumsum(values: &[f64]) -> Vec<f64> {
    let mut acc = 0.0;
    values
        .iter()
        .map(|&v| {
            if v.is_nan() {
                f64::NAN
            } else {
                acc += v;
                acc
            }
        })
        .collect()
}

/// Running product with the same missing-value handling as [`cumsum`].
pub fn cumprod(values: &[f64]) -> Vec<f64> {
    let mut acc = 1.0;
    values
        .iter()
        .map(|&v| {
            if v.is_nan() {
                f64::NAN
            } else {
                acc *= v;
                acc
            }
        })
        .collect()
}

/// Quantile of the present values using linear interpolation between
/// closest ranks. Returns NaN when nothing is present.
pub fn quantile(values: &[f64], q: f64) -> f64 {
    let mut present: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    if present.is_empty() {
        return f64::NAN;
    }
    present.sort_by(|a, b| a.total_cmp(b));

    let pos = q.clamp(0.0, 1.0) * (present.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    present[lo] + (present[hi] - present[lo]) * frac
}

/// Mean of the present values, NaN when nothing is present.
pub fn mean(values: &[f64]) -> f64 {
    let (sum, count) = values
        .iter()
        .filter(|v| !v.is_nan())
        .fold((0.0, 0usize), |(s, c), &v| (s + v, c + 1));
    if count == 0 {
        f64::NAN
    } else {
        sum / count as f64
    }
}

/// Sign as a float in {-1, 0, 1}; NaN stays NaN.
pub fn sign(value: f64) -> f64 {
    if value.is_nan() {
        f64::NAN
    } else if value > 0.0 {
        1.0
    } else if value < 0.0 {
        -1.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, DEFAULT_EPSILON};

    #[test]
    fn rolling_mean_uses_partial_windows() {
        let out = rolling_mean(&[1.0, 2.0, 3.0, 4.0], 3, 1);
        assert_approx(out[0], 1.0, DEFAULT_EPSILON);
        assert_approx(out[1], 1.5, DEFAULT_EPSILON);
        assert_approx(out[2], 2.0, DEFAULT_EPSILON);
        assert_approx(out[3], 3.0, DEFAULT_EPSILON);
    }

    #[test]
    fn rolling_skips_missing_values() {
        let out = rolling_sum(&[f64::NAN, 2.0, f64::NAN, 4.0], 2, 1);
        assert!(out[0].is_nan());
        assert_approx(out[1], 2.0, DEFAULT_EPSILON);
        assert_approx(out[2], 2.0, DEFAULT_EPSILON);
        assert_approx(out[3], 4.0, DEFAULT_EPSILON);
    }

    #[test]
    fn rolling_respects_min_periods() {
        let out = rolling_mean(&[1.0, 2.0, 3.0], 3, 3);
        assert!(out[0].is_nan());
        assert!(out[1].is_nan());
        assert_approx(out[2], 2.0, DEFAULT_EPSILON);
    }

    #[test]
    fn rolling_extremes() {
        let values = [3.0, 1.0, 4.0, 1.0, 5.0];
        let max = rolling_max(&values, 2, 1);
        let min = rolling_min(&values, 2, 1);
        assert_eq!(max, vec![3.0, 3.0, 4.0, 4.0, 5.0]);
        assert_eq!(min, vec![3.0, 1.0, 1.0, 1.0, 1.0]);
    }

    #[test]
    fn ewm_seeds_at_first_value() {
        // span 3 → alpha 0.5
        let out = ewm_mean(&[10.0, 12.0, 14.0], 3);
        assert_approx(out[0], 10.0, DEFAULT_EPSILON);
        assert_approx(out[1], 11.0, DEFAULT_EPSILON);
        assert_approx(out[2], 12.5, DEFAULT_EPSILON);
    }

    #[test]
    fn ewm_leading_missing_then_carry() {
        let out = ewm_mean(&[f64::NAN, 4.0, f64::NAN, 8.0], 3);
        assert!(out[0].is_nan());
        assert_approx(out[1], 4.0, DEFAULT_EPSILON);
        assert_approx(out[2], 4.0, DEFAULT_EPSILON);
        // Old weight 0.25 after the gap: (0.25 * 4 + 0.5 * 8) / 0.75.
        assert_approx(out[3], 20.0 / 3.0, DEFAULT_EPSILON);
    }

    #[test]
    fn ewm_gap_decays_the_previous_mean() {
        let out = ewm_mean(&[1.0, f64::NAN, 3.0], 3);
        assert_approx(out[1], 1.0, DEFAULT_EPSILON);
        assert_approx(out[2], 7.0 / 3.0, DEFAULT_EPSILON);
    }

    #[test]
    fn shift_based_helpers_leave_leading_gaps() {
        let values = [10.0, 11.0, 9.0];
        let d = diff(&values, 1);
        assert!(d[0].is_nan());
        assert_eq!(&d[1..], &[1.0, -2.0]);

        let p = pct_change(&values, 2);
        assert!(p[0].is_nan() && p[1].is_nan());
        assert_approx(p[2], -0.1, DEFAULT_EPSILON);
    }

    #[test]
    fn pct_change_from_zero_is_infinite() {
        let p = pct_change(&[0.0, 5.0, 0.0, 0.0], 1);
        assert!(p[1].is_infinite());
        assert_approx(p[2], -1.0, DEFAULT_EPSILON);
        assert!(p[3].is_nan());
    }

    #[test]
    fn cumulative_helpers_skip_missing() {
        let s = cumsum(&[1.0, f64::NAN, 2.0]);
        assert_eq!(s[0], 1.0);
        assert!(s[1].is_nan());
        assert_eq!(s[2], 3.0);

        let p = cumprod(&[f64::NAN, 2.0, 3.0]);
        assert!(p[0].is_nan());
        assert_eq!(&p[1..], &[2.0, 6.0]);
    }

    #[test]
    fn quantile_interpolates_linearly() {
        let values = [4.0, 1.0, f64::NAN, 3.0, 2.0];
        assert_approx(quantile(&values, 0.0), 1.0, DEFAULT_EPSILON);
        assert_approx(quantile(&values, 0.5), 2.5, DEFAULT_EPSILON);
        assert_approx(quantile(&values, 0.05), 1.15, DEFAULT_EPSILON);
        assert!(quantile(&[f64::NAN], 0.5).is_nan());
    }

    #[test]
    fn sign_and_mean() {
        assert_eq!(sign(-0.3), -1.0);
        assert_eq!(sign(0.0), 0.0);
        assert!(sign(f64::NAN).is_nan());
        assert_approx(mean(&[1.0, f64::NAN, 3.0]), 2.0, DEFAULT_EPSILON);
        assert!(mean(&[]).is_nan());
    }
}
