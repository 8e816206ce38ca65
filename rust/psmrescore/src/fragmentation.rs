use crate::errors::PredictionFailure;
use crate::features::{
    AgreementMetric,
    FeatureId,
    IonScope,
};
use crate::models::{
    Psm,
    Spectrum,
};
use crate::predict::{
    FragmentationModel,
    IonSeries,
};
use crate::utils::correlation::{
    cosine_similarity,
    dot_product,
    mean_squared_error,
    pearson,
    spearman,
};
use crate::utils::stats::{
    mean,
    quantile_sorted,
};

/// Predicted and observed relative intensities aligned per theoretical
/// b/y fragment, both max-normalized.
#[derive(Debug)]
pub struct AlignedIntensities {
    pub series: Vec<IonSeries>,
    pub predicted: Vec<f32>,
    pub observed: Vec<f32>,
}

impl AlignedIntensities {
    fn scoped(&self, scope: IonScope) -> (Vec<f32>, Vec<f32>) {
        let keep = |s: &IonSeries| match scope {
            IonScope::All => true,
            IonScope::B => *s == IonSeries::B,
            IonScope::Y => *s == IonSeries::Y,
        };
        let predicted = self
            .series
            .iter()
            .zip(self.predicted.iter())
            .filter(|(s, _)| keep(s))
            .map(|(_, &v)| v)
            .collect();
        let observed = self
            .series
            .iter()
            .zip(self.observed.iter())
            .filter(|(s, _)| keep(s))
            .map(|(_, &v)| v)
            .collect();
        (predicted, observed)
    }
}

fn max_normalize(vals: &mut [f32]) {
    let max = vals.iter().cloned().fold(0.0f32, f32::max);
    if max > 0.0 {
        for v in vals.iter_mut() {
            *v /= max;
        }
    }
}

/// Drives the model over the PSM's peptide and pairs every predicted
/// fragment with the closest observed peak within `tolerance` (zero
/// intensity when nothing matches).
pub fn align(
    peptide: &str,
    spectrum: &Spectrum,
    model: &FragmentationModel,
    tolerance: f64,
) -> Result<AlignedIntensities, PredictionFailure> {
    let predictions = model.predict(peptide)?;
    if predictions.len() < 2 {
        return Err(PredictionFailure::NotEnoughIons {
            have: predictions.len(),
        });
    }

    let mut series = Vec::with_capacity(predictions.len());
    let mut predicted = Vec::with_capacity(predictions.len());
    let mut observed = Vec::with_capacity(predictions.len());

    for (frag, intensity) in predictions {
        series.push(frag.series);
        predicted.push(intensity);
        let obs = spectrum
            .closest_peak(frag.mz, tolerance)
            .map_or(0.0, |(idx, _)| spectrum.intensity[idx]);
        observed.push(obs);
    }

    max_normalize(&mut predicted);
    max_normalize(&mut observed);

    Ok(AlignedIntensities {
        series,
        predicted,
        observed,
    })
}

/// Mean agreement (Pearson) between prediction and observation for one
/// PSM, the quantity the model validator thresholds on.
pub fn agreement_score(
    peptide: &str,
    spectrum: &Spectrum,
    model: &FragmentationModel,
    tolerance: f64,
) -> Option<f32> {
    let aligned = align(peptide, spectrum, model, tolerance).ok()?;
    pearson(&aligned.predicted, &aligned.observed)
        .ok()
        .filter(|x| x.is_finite())
}

/// Computes the full similarity battery between predicted and observed
/// fragmentation and inserts it into the PSM's feature record.
///
/// A prediction failure here degrades only this PSM (its fragmentation
/// features stay absent); the caller counts it, the run continues.
pub fn annotate_fragmentation(
    psm: &mut Psm,
    spectrum: &Spectrum,
    model: &FragmentationModel,
    tolerance: f64,
) -> Result<(), PredictionFailure> {
    let aligned = align(&psm.peptide, spectrum, model, tolerance)?;

    for scope in IonScope::ALL {
        let (predicted, observed) = aligned.scoped(scope);
        if predicted.len() < 2 {
            // Not enough ions in this series for any of the metrics
            continue;
        }

        let mut abs_diffs: Vec<f32> = predicted
            .iter()
            .zip(observed.iter())
            .map(|(&p, &o)| (p - o).abs())
            .collect();
        abs_diffs.sort_unstable_by(|a, b| a.partial_cmp(b).unwrap());
        let mean_abs = mean(&abs_diffs);
        let std_abs = {
            let var = abs_diffs
                .iter()
                .map(|&x| ((x - mean_abs) as f64).powi(2))
                .sum::<f64>()
                / abs_diffs.len() as f64;
            var.sqrt() as f32
        };

        let mut put = |metric: AgreementMetric, value: f32| {
            psm.features
                .insert_finite(FeatureId::Ms2pip(metric, scope), value as f64);
        };

        if let Ok(x) = pearson(&predicted, &observed) {
            put(AgreementMetric::Pearson, x);
        }
        if let Ok(x) = spearman(&predicted, &observed) {
            put(AgreementMetric::Spearman, x);
        }
        if let Ok(x) = cosine_similarity(&predicted, &observed) {
            put(AgreementMetric::Cosine, x);
        }
        if let Ok(x) = dot_product(&predicted, &observed) {
            put(AgreementMetric::DotProd, x);
        }
        if let Ok(x) = mean_squared_error(&predicted, &observed) {
            put(AgreementMetric::Mse, x);
        }
        put(AgreementMetric::MeanAbsDiff, mean_abs);
        put(AgreementMetric::StdAbsDiff, std_abs);
        put(AgreementMetric::AbsDiffQ25, quantile_sorted(&abs_diffs, 0.25));
        put(AgreementMetric::AbsDiffQ50, quantile_sorted(&abs_diffs, 0.50));
        put(AgreementMetric::AbsDiffQ75, quantile_sorted(&abs_diffs, 0.75));
        put(AgreementMetric::AbsDiffQ90, quantile_sorted(&abs_diffs, 0.90));
        put(
            AgreementMetric::MaxAbsDiff,
            *abs_diffs.last().unwrap_or(&f32::NAN),
        );
    }

    Ok(())
}
