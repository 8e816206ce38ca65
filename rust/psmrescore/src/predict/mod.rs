pub mod fragments;

pub use fragments::{
    IonSeries,
    TheoreticalFragment,
    by_fragments,
    peptide_mass,
};

use crate::errors::PredictionFailure;
use crate::models::DissociationMethod;

/// Declared instrument tolerance class of a fragmentation model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToleranceClass {
    /// High resolution instruments, e.g. Orbitrap HCD.
    High,
    Medium,
    /// Ion trap resolution, e.g. resonance CID.
    Low,
}

impl ToleranceClass {
    pub fn fragment_da(&self) -> f64 {
        match self {
            ToleranceClass::High => 0.02,
            ToleranceClass::Medium => 0.05,
            ToleranceClass::Low => 0.5,
        }
    }
}

/// Fragment intensity prediction shape of one backbone ion series.
///
/// The predictors behind real services are opaque; the engine only
/// depends on this parameterization of the sequence-in, intensities-out
/// contract.
#[derive(Debug, Clone, Copy)]
pub struct SeriesProfile {
    pub weight: f32,
    /// Position of the intensity apex as a fraction of the series length.
    pub apex: f64,
    pub width: f64,
}

impl SeriesProfile {
    fn intensity_at(&self, position: f64) -> f32 {
        let z = (position - self.apex) / self.width;
        self.weight * (-0.5 * z * z).exp() as f32
    }
}

/// A named fragment-ion intensity prediction configuration.
///
/// Spectrum-in is a peptide + charge, intensities-out is one predicted
/// relative intensity per theoretical b/y fragment.
#[derive(Debug, Clone)]
pub struct FragmentationModel {
    pub name: &'static str,
    pub family: &'static str,
    pub dissociation: &'static [DissociationMethod],
    pub tolerance: ToleranceClass,
    pub b_profile: SeriesProfile,
    pub y_profile: SeriesProfile,
}

impl FragmentationModel {
    pub fn supports(&self, method: DissociationMethod) -> bool {
        self.dissociation.contains(&method)
    }

    /// Predicts a relative intensity for every singly charged b/y ion of
    /// `peptide`, aligned with the output of `by_fragments`.
    pub fn predict(
        &self,
        peptide: &str,
    ) -> Result<Vec<(TheoreticalFragment, f32)>, PredictionFailure> {
        let frags = by_fragments(peptide)?;
        let series_len = (peptide.len() - 1).max(1) as f64;
        let out = frags
            .into_iter()
            .map(|frag| {
                let position = frag.ordinal as f64 / series_len;
                let profile = match frag.series {
                    IonSeries::B => &self.b_profile,
                    IonSeries::Y => &self.y_profile,
                };
                (frag, profile.intensity_at(position))
            })
            .collect();
        Ok(out)
    }
}

/// A named retention time prediction configuration: a retention
/// coefficient model over amino acid composition plus a length term.
#[derive(Debug, Clone)]
pub struct RetentionTimeModel {
    pub name: &'static str,
    pub family: &'static str,
    /// Retention coefficients for A..Z, unused letters are zero.
    pub coefficients: [f64; 26],
    pub length_coefficient: f64,
    pub intercept: f64,
}

impl RetentionTimeModel {
    /// Raw (uncalibrated) retention time prediction in model units.
    pub fn predict(&self, peptide: &str) -> Result<f64, PredictionFailure> {
        if peptide.len() < fragments::MIN_PEPTIDE_LEN {
            return Err(PredictionFailure::PeptideTooShort { len: peptide.len() });
        }
        let mut total = self.intercept + self.length_coefficient * peptide.len() as f64;
        for c in peptide.chars() {
            if !c.is_ascii_uppercase() {
                return Err(PredictionFailure::UnknownResidue { residue: c });
            }
            total += self.coefficients[(c as u8 - b'A') as usize];
        }
        Ok(total)
    }
}
