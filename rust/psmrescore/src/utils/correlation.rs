use crate::errors::{
    DataProcessingError,
    Result,
};

fn check_same_length(a: &[f32], b: &[f32], context: &str) -> Result<()> {
    if a.len() != b.len() || a.is_empty() {
        return Err(DataProcessingError::ExpectedSlicesSameLength {
            expected: a.len(),
            other: b.len(),
            context: context.to_string(),
        }
        .into());
    }
    Ok(())
}

/// Pearson correlation between two equally sized vectors.
///
/// Returns NaN when either vector has zero variance.
///
/// # Example
///
/// ```
/// use psmrescore::utils::correlation::pearson;
///
/// let a = vec![1.0, 2.0, 3.0, 4.0];
/// let b = vec![2.0, 4.0, 6.0, 8.0];
/// let result = pearson(&a, &b).unwrap();
/// assert!((result - 1.0).abs() < 1e-6);
/// ```
pub fn pearson(a: &[f32], b: &[f32]) -> Result<f32> {
    check_same_length(a, b, "pearson")?;
    let n = a.len() as f64;
    let mean_a: f64 = a.iter().map(|&x| x as f64).sum::<f64>() / n;
    let mean_b: f64 = b.iter().map(|&x| x as f64).sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_a = 0.0;
    let mut var_b = 0.0;
    for (&x, &y) in a.iter().zip(b.iter()) {
        let dx = x as f64 - mean_a;
        let dy = y as f64 - mean_b;
        cov += dx * dy;
        var_a += dx * dx;
        var_b += dy * dy;
    }

    if var_a == 0.0 || var_b == 0.0 {
        return Ok(f32::NAN);
    }
    Ok((cov / (var_a.sqrt() * var_b.sqrt())) as f32)
}

/// Spearman rank correlation, i.e. Pearson over the rank transform.
/// Ties get the average of the ranks they span.
pub fn spearman(a: &[f32], b: &[f32]) -> Result<f32> {
    check_same_length(a, b, "spearman")?;
    let ranks_a = ranks(a);
    let ranks_b = ranks(b);
    pearson(&ranks_a, &ranks_b)
}

fn ranks(vals: &[f32]) -> Vec<f32> {
    let mut order: Vec<usize> = (0..vals.len()).collect();
    order.sort_unstable_by(|&i, &j| vals[i].partial_cmp(&vals[j]).unwrap());

    let mut out = vec![0.0f32; vals.len()];
    let mut i = 0;
    while i < order.len() {
        let mut j = i;
        while j + 1 < order.len() && vals[order[j + 1]] == vals[order[i]] {
            j += 1;
        }
        // 1-based ranks, averaged over the tie block
        let avg_rank = ((i + 1 + j + 1) as f32) / 2.0;
        for &idx in &order[i..=j] {
            out[idx] = avg_rank;
        }
        i = j + 1;
    }
    out
}

/// Cosine similarity between two equally sized vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32> {
    check_same_length(a, b, "cosine_similarity")?;
    let dot: f64 = a.iter().zip(b.iter()).map(|(&x, &y)| (x as f64) * (y as f64)).sum();
    let mag_a: f64 = a.iter().map(|&x| (x as f64).powi(2)).sum::<f64>().sqrt();
    let mag_b: f64 = b.iter().map(|&x| (x as f64).powi(2)).sum::<f64>().sqrt();
    if mag_a == 0.0 || mag_b == 0.0 {
        return Ok(f32::NAN);
    }
    Ok((dot / (mag_a * mag_b)) as f32)
}

/// Plain dot product. Callers are expected to pass max-normalized
/// intensity vectors, so the magnitude stays comparable across PSMs.
pub fn dot_product(a: &[f32], b: &[f32]) -> Result<f32> {
    check_same_length(a, b, "dot_product")?;
    Ok(a.iter().zip(b.iter()).map(|(&x, &y)| x * y).sum())
}

/// Mean squared error between two equally sized vectors.
pub fn mean_squared_error(a: &[f32], b: &[f32]) -> Result<f32> {
    check_same_length(a, b, "mean_squared_error")?;
    let sum: f64 = a
        .iter()
        .zip(b.iter())
        .map(|(&x, &y)| ((x - y) as f64).powi(2))
        .sum();
    Ok((sum / a.len() as f64) as f32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pearson_anticorrelated() {
        let a = vec![1.0, 2.0, 3.0, 4.0];
        let b = vec![4.0, 3.0, 2.0, 1.0];
        let result = pearson(&a, &b).unwrap();
        assert!((result + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_pearson_zero_variance_is_nan() {
        let a = vec![1.0, 1.0, 1.0];
        let b = vec![1.0, 2.0, 3.0];
        assert!(pearson(&a, &b).unwrap().is_nan());
    }

    #[test]
    fn test_pearson_length_mismatch() {
        let a = vec![1.0, 2.0];
        let b = vec![1.0, 2.0, 3.0];
        assert!(pearson(&a, &b).is_err());
        let empty: Vec<f32> = vec![];
        assert!(pearson(&empty, &empty).is_err());
    }

    #[test]
    fn test_spearman_monotonic_nonlinear() {
        // Monotone but very non-linear, spearman should still be 1
        let a = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let b = vec![1.0, 10.0, 100.0, 1000.0, 10000.0];
        let result = spearman(&a, &b).unwrap();
        assert!((result - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_ranks_with_ties() {
        let vals = vec![10.0, 20.0, 20.0, 30.0];
        let r = ranks(&vals);
        assert_eq!(r, vec![1.0, 2.5, 2.5, 4.0]);
    }

    #[test]
    fn test_cosine_zero_vector_is_nan() {
        let a = vec![0.0, 0.0, 0.0];
        let b = vec![1.0, 2.0, 3.0];
        assert!(cosine_similarity(&a, &b).unwrap().is_nan());
    }

    #[test]
    fn test_mse() {
        let a = vec![1.0, 2.0, 3.0];
        let b = vec![1.0, 2.0, 6.0];
        let result = mean_squared_error(&a, &b).unwrap();
        assert!((result - 3.0).abs() < 1e-6);
    }
}
