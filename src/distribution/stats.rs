//! Small order and moment statistics shared by the builders and processes.
//!
//! All helpers are total: empty input yields `None` instead of panicking, and
//! NaNs sort last under `f64::total_cmp`.

/// Round to one decimal place, ties to even.
///
/// Peak matching and onset detection compare rounded values, so this must
/// be the only rounding rule used for targets.
pub fn round1(x: f64) -> f64 {
    (x * 10.0).round_ties_even() / 10.0
}

/// Lower median: for an even count, the smaller of the two middle values.
pub fn median_low<T: Copy + PartialOrd>(values: &[T]) -> Option<T> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    Some(sorted[(sorted.len() - 1) / 2])
}

/// Median, averaging the two middle values for an even count.
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let n = sorted.len();
    if n % 2 == 1 { Some(sorted[n / 2]) } else { Some(0.5 * (sorted[n / 2 - 1] + sorted[n / 2])) }
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Unbiased sample variance (`ddof = 1`); `None` for fewer than two values.
pub fn sample_variance(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let ss: f64 = values.iter().map(|v| (v - m) * (v - m)).sum();
    Some(ss / (values.len() - 1) as f64)
}

pub fn sample_std(values: &[f64]) -> Option<f64> {
    sample_variance(values).map(f64::sqrt)
}
