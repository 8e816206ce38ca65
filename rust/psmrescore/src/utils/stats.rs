/// Median of an unsorted slice. Returns NaN for empty input.
pub fn median(vals: &[f32]) -> f32 {
    quantile(vals, 0.5)
}

/// Linear-interpolated quantile of an unsorted slice.
///
/// # Example
///
/// ```
/// use psmrescore::utils::stats::quantile;
///
/// let vals = vec![1.0, 2.0, 3.0, 4.0, 5.0];
/// assert_eq!(quantile(&vals, 0.5), 3.0);
/// assert_eq!(quantile(&vals, 0.0), 1.0);
/// assert_eq!(quantile(&vals, 1.0), 5.0);
/// ```
pub fn quantile(vals: &[f32], q: f64) -> f32 {
    if vals.is_empty() {
        return f32::NAN;
    }
    let mut sorted: Vec<f32> = vals.to_vec();
    sorted.sort_unstable_by(|a, b| a.partial_cmp(b).unwrap());
    quantile_sorted(&sorted, q)
}

/// Same as `quantile` but assumes `sorted` is already ascending.
pub fn quantile_sorted(sorted: &[f32], q: f64) -> f32 {
    if sorted.is_empty() {
        return f32::NAN;
    }
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    if lo == hi {
        return sorted[lo];
    }
    let frac = (pos - lo as f64) as f32;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

pub fn mean(vals: &[f32]) -> f32 {
    if vals.is_empty() {
        return f32::NAN;
    }
    (vals.iter().map(|&x| x as f64).sum::<f64>() / vals.len() as f64) as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_median_even_count() {
        let vals = vec![4.0, 1.0, 3.0, 2.0];
        assert_eq!(median(&vals), 2.5);
    }

    #[test]
    fn test_quantile_interpolates() {
        let vals = vec![1.0, 2.0, 3.0, 4.0];
        assert!((quantile(&vals, 0.25) - 1.75).abs() < 1e-6);
        assert!((quantile(&vals, 0.75) - 3.25).abs() < 1e-6);
    }

    #[test]
    fn test_empty_is_nan() {
        let vals: Vec<f32> = vec![];
        assert!(median(&vals).is_nan());
        assert!(mean(&vals).is_nan());
    }
}
