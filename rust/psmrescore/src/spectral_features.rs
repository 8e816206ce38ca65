use crate::features::{
    FeatureId,
    SpectrumDescriptor,
};
use crate::models::{
    Psm,
    Spectrum,
};
use crate::utils::stats::median;
use crate::utils::top_n::TopNArray;

/// Number of peaks whose summed ion current makes up the TIC
/// concentration descriptor.
const TIC_TOP_PEAKS: usize = 10;

/// Adds the model-free spectral quality descriptors to one PSM.
///
/// A spectrum with no peaks marks the PSM invalid (it gets dropped at
/// fusion, counted in the run statistics); everything else always yields
/// entropy, TIC concentration and weighted m/z spread. SNR additionally
/// needs at least two peaks to have a defined noise floor.
pub fn annotate_spectral(psm: &mut Psm, spectrum: &Spectrum) {
    if spectrum.is_empty() {
        psm.mark_invalid();
        return;
    }

    if let Some(snr) = signal_to_noise(&spectrum.intensity) {
        psm.features
            .insert_finite(FeatureId::Quantms(SpectrumDescriptor::Snr), snr);
    }
    psm.features.insert_finite(
        FeatureId::Quantms(SpectrumDescriptor::SpectralEntropy),
        spectral_entropy(&spectrum.intensity),
    );
    psm.features.insert_finite(
        FeatureId::Quantms(SpectrumDescriptor::FracTICinTop10Peaks),
        frac_tic_in_top_peaks(&spectrum.intensity),
    );
    psm.features.insert_finite(
        FeatureId::Quantms(SpectrumDescriptor::WeightedStdMz),
        weighted_std_mz(&spectrum.mz, &spectrum.intensity),
    );
}

/// Maximum peak intensity over the median intensity as a robust noise
/// floor. Undefined for fewer than two peaks.
pub fn signal_to_noise(intensities: &[f32]) -> Option<f64> {
    if intensities.len() < 2 {
        return None;
    }
    let max = intensities.iter().cloned().fold(f32::MIN, f32::max) as f64;
    let noise = median(intensities) as f64;
    if noise <= 0.0 {
        // All-zero or degenerate spectra have no meaningful noise floor
        return Some(0.0);
    }
    Some(max / noise)
}

/// Shannon entropy of the normalized intensity distribution.
///
/// Zero for a single peak, maximal (ln n) for a perfectly flat
/// spectrum.
///
/// # Example
///
/// ```
/// use psmrescore::spectral_features::spectral_entropy;
///
/// assert_eq!(spectral_entropy(&[5.0]), 0.0);
/// let flat = spectral_entropy(&[1.0, 1.0, 1.0, 1.0]);
/// assert!((flat - (4.0f64).ln()).abs() < 1e-9);
/// ```
pub fn spectral_entropy(intensities: &[f32]) -> f64 {
    let total: f64 = intensities.iter().map(|&x| x as f64).sum();
    if total <= 0.0 {
        return 0.0;
    }
    intensities
        .iter()
        .filter(|&&x| x > 0.0)
        .map(|&x| {
            let p = x as f64 / total;
            -p * p.ln()
        })
        .sum()
}

/// Fraction of the total ion current carried by the ten most intense
/// peaks.
pub fn frac_tic_in_top_peaks(intensities: &[f32]) -> f64 {
    let total: f64 = intensities.iter().map(|&x| x as f64).sum();
    if total <= 0.0 {
        return 0.0;
    }
    let mut top: TopNArray<TIC_TOP_PEAKS> = TopNArray::new();
    for &x in intensities {
        top.push(x);
    }
    top.sum() / total
}

/// Intensity-weighted standard deviation of the m/z values.
pub fn weighted_std_mz(mzs: &[f64], intensities: &[f32]) -> f64 {
    let total: f64 = intensities.iter().map(|&x| x as f64).sum();
    if total <= 0.0 {
        return 0.0;
    }
    let mean: f64 = mzs
        .iter()
        .zip(intensities.iter())
        .map(|(&mz, &i)| mz * (i as f64 / total))
        .sum();
    let variance: f64 = mzs
        .iter()
        .zip(intensities.iter())
        .map(|(&mz, &i)| (i as f64 / total) * (mz - mean).powi(2))
        .sum();
    variance.sqrt()
}
