use crate::catalog::ModelCatalog;
use crate::errors::EngineError;
use crate::fragmentation::agreement_score;
use crate::models::{
    Psm,
    RunDescriptor,
    Spectrum,
};
use crate::predict::FragmentationModel;
use tracing::{
    info,
    warn,
};

#[derive(Debug, Clone)]
pub struct ValidationConfig {
    /// Minimum mean predicted-vs-observed Pearson a model must reach.
    pub threshold: f64,
    /// Allowed ratio between the run's empirical fragment tolerance and
    /// a model's declared tolerance class, in either direction.
    pub tolerance_margin: f64,
    /// User override for the fragment matching tolerance (Da); falls
    /// back to the candidate model's declared class when absent.
    pub ms2_tolerance: Option<f64>,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            threshold: 0.7,
            tolerance_margin: 10.0,
            ms2_tolerance: None,
        }
    }
}

/// Outcome of validating a user-declared fragmentation model against a
/// sample of the run.
#[derive(Debug)]
pub enum ModelDecision<'a> {
    Accepted {
        model: &'a FragmentationModel,
        score: f64,
    },
    Replaced {
        model: &'a FragmentationModel,
        score: f64,
        declared_score: f64,
    },
}

impl<'a> ModelDecision<'a> {
    pub fn model(&self) -> &'a FragmentationModel {
        match self {
            ModelDecision::Accepted { model, .. } => model,
            ModelDecision::Replaced { model, .. } => model,
        }
    }
}

pub fn effective_tolerance(model: &FragmentationModel, config: &ValidationConfig) -> f64 {
    config
        .ms2_tolerance
        .unwrap_or_else(|| model.tolerance.fragment_da())
}

fn tolerance_compatible(
    model: &FragmentationModel,
    run: &RunDescriptor,
    margin: f64,
) -> bool {
    let declared = model.tolerance.fragment_da();
    let empirical = run.empirical_fragment_tolerance;
    empirical <= declared * margin && empirical >= declared / margin
}

/// Mean per-PSM agreement of `model` over the sample; NaN when nothing
/// could be scored.
fn score_model(
    model: &FragmentationModel,
    sample: &[(&Psm, &Spectrum)],
    config: &ValidationConfig,
) -> f64 {
    let tolerance = effective_tolerance(model, config);
    let scores: Vec<f64> = sample
        .iter()
        .filter_map(|(psm, spectrum)| {
            agreement_score(&psm.peptide, spectrum, model, tolerance).map(|x| x as f64)
        })
        .collect();
    if scores.is_empty() {
        return f64::NAN;
    }
    scores.iter().sum::<f64>() / scores.len() as f64
}

/// Validates the declared model against the run sample, replacing it
/// with the best catalog model for the run's dissociation method when
/// the declared one does not hold up.
///
/// Deterministic: ties between candidates break by catalog declaration
/// order (first listed wins). The replacement must itself clear the
/// threshold, otherwise the run fails with `NoUsableModel`.
pub fn validate_fragmentation<'a>(
    declared: &str,
    run: &RunDescriptor,
    sample: &[(&Psm, &Spectrum)],
    catalog: &'a ModelCatalog,
    config: &ValidationConfig,
) -> Result<ModelDecision<'a>, EngineError> {
    let declared_model = catalog.find_fragmentation(declared);
    let declared_score = match declared_model {
        Some(model) => {
            let score = score_model(model, sample, config);
            let compatible = tolerance_compatible(model, run, config.tolerance_margin);
            if score >= config.threshold && compatible && model.supports(run.dissociation) {
                info!(
                    "Declared model '{}' validated with mean agreement {:.4}",
                    declared, score
                );
                return Ok(ModelDecision::Accepted { model, score });
            }
            warn!(
                "Declared model '{}' rejected (agreement {:.4}, tolerance compatible: {}), \
                 searching catalog for a {} model",
                declared, score, compatible, run.dissociation
            );
            score
        }
        None => {
            warn!(
                "Declared model '{}' is not in the catalog, searching for a {} model",
                declared, run.dissociation
            );
            f64::NAN
        }
    };

    let mut best: Option<(&FragmentationModel, f64)> = None;
    for candidate in catalog.fragmentation_for(run.dissociation) {
        if !tolerance_compatible(candidate, run, config.tolerance_margin) {
            continue;
        }
        let score = score_model(candidate, sample, config);
        if score.is_nan() {
            continue;
        }
        // Strictly-greater keeps the first listed candidate on ties
        if best.map_or(true, |(_, b)| score > b) {
            best = Some((candidate, score));
        }
    }

    match best {
        Some((model, score)) if score >= config.threshold => {
            info!(
                "Replaced model '{}' with '{}' (mean agreement {:.4})",
                declared, model.name, score
            );
            Ok(ModelDecision::Replaced {
                model,
                score,
                declared_score,
            })
        }
        other => Err(EngineError::NoUsableModel {
            run_id: run.run_id.to_string(),
            declared: declared.to_string(),
            best_candidate: other.map(|(m, s)| (m.name.to_string(), s)),
            threshold: config.threshold,
        }),
    }
}
