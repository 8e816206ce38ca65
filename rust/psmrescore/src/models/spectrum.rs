use serde::{
    Deserialize,
    Serialize,
};
use std::collections::HashMap;

/// An MS2 peak list, sorted by increasing m/z.
///
/// Owned by the spectral reader; the engine only ever holds shared
/// references to it while computing features.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Spectrum {
    pub id: String,
    pub mz: Vec<f64>,
    pub intensity: Vec<f32>,
}

impl Spectrum {
    pub fn new(id: String, mut mz: Vec<f64>, mut intensity: Vec<f32>) -> Self {
        assert_eq!(
            mz.len(),
            intensity.len(),
            "Peak m/z and intensity arrays must have the same length"
        );
        if !mz.windows(2).all(|w| w[0] <= w[1]) {
            let mut order: Vec<usize> = (0..mz.len()).collect();
            order.sort_unstable_by(|&a, &b| mz[a].partial_cmp(&mz[b]).unwrap());
            mz = order.iter().map(|&i| mz[i]).collect();
            intensity = order.iter().map(|&i| intensity[i]).collect();
        }
        Self { id, mz, intensity }
    }

    pub fn num_peaks(&self) -> usize {
        self.mz.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mz.is_empty()
    }

    /// Index and absolute m/z error of the closest peak within `tolerance`
    /// of `target_mz`, if any. Relies on the sorted-by-m/z invariant.
    pub fn closest_peak(&self, target_mz: f64, tolerance: f64) -> Option<(usize, f64)> {
        if self.mz.is_empty() {
            return None;
        }
        let insert_at = self.mz.partition_point(|&x| x < target_mz);
        let mut best: Option<(usize, f64)> = None;
        for cand in [insert_at.wrapping_sub(1), insert_at] {
            if cand >= self.mz.len() {
                continue;
            }
            let err = (self.mz[cand] - target_mz).abs();
            if err <= tolerance && best.map_or(true, |(_, b)| err < b) {
                best = Some((cand, err));
            }
        }
        best
    }
}

/// Scan identifier to spectrum lookup for one spectral file.
#[derive(Debug, Default)]
pub struct SpectrumMap {
    spectra: HashMap<String, Spectrum>,
}

impl SpectrumMap {
    pub fn from_spectra(spectra: Vec<Spectrum>) -> Self {
        Self {
            spectra: spectra.into_iter().map(|s| (s.id.clone(), s)).collect(),
        }
    }

    pub fn get(&self, scan_id: &str) -> Option<&Spectrum> {
        self.spectra.get(scan_id)
    }

    pub fn len(&self) -> usize {
        self.spectra.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spectra.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_peaks_get_sorted_on_construction() {
        let spec = Spectrum::new(
            "scan=1".to_string(),
            vec![300.0, 100.0, 200.0],
            vec![3.0, 1.0, 2.0],
        );
        assert_eq!(spec.mz, vec![100.0, 200.0, 300.0]);
        assert_eq!(spec.intensity, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_closest_peak() {
        let spec = Spectrum::new(
            "scan=1".to_string(),
            vec![100.0, 200.0, 300.0],
            vec![1.0, 2.0, 3.0],
        );
        let (idx, err) = spec.closest_peak(200.01, 0.05).unwrap();
        assert_eq!(idx, 1);
        assert!((err - 0.01).abs() < 1e-9);
        assert!(spec.closest_peak(250.0, 0.05).is_none());
        assert!(spec.closest_peak(99.96, 0.05).is_some());
    }
}
