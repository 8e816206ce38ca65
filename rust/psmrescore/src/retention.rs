use crate::catalog::ModelCatalog;
use crate::errors::{
    CalibrationFailure,
    EngineError,
    PredictionFailure,
};
use crate::features::{
    FeatureId,
    RtFeature,
};
use crate::models::Psm;
use crate::predict::RetentionTimeModel;
use regex::Regex;
use std::collections::HashMap;
use tracing::info;

#[derive(Debug, Clone)]
pub struct RtConfig {
    pub min_anchors: usize,
    /// Upper bound on the calibration RMSE normalized by the observed
    /// retention time span.
    pub max_residual: f64,
    /// Fraction of the non-decoy PSMs (best scoring first) used as
    /// calibration anchors.
    pub anchor_fraction: f64,
    pub lower_score_is_better: bool,
}

impl Default for RtConfig {
    fn default() -> Self {
        Self {
            min_anchors: 10,
            max_residual: 0.25,
            anchor_fraction: 0.6,
            lower_score_is_better: true,
        }
    }
}

/// Top-scoring non-decoy PSMs, the ground truth for calibration.
pub fn select_anchors<'a>(
    psms: &'a [Psm],
    decoy_pattern: &Regex,
    config: &RtConfig,
) -> Vec<&'a Psm> {
    let mut targets: Vec<&Psm> = psms
        .iter()
        .filter(|p| p.valid && !p.is_decoy(decoy_pattern))
        .collect();
    targets.sort_by(|a, b| {
        let ord = a.search_score.partial_cmp(&b.search_score).unwrap();
        if config.lower_score_is_better {
            ord
        } else {
            ord.reverse()
        }
    });
    let keep = ((targets.len() as f64 * config.anchor_fraction) as usize).max(1);
    targets.truncate(keep);
    targets
}

/// Linear mapping from raw model prediction to the run's observed
/// retention time scale.
#[derive(Debug, Clone, Copy)]
pub struct RtCalibration {
    pub slope: f64,
    pub intercept: f64,
    /// RMSE over the anchors, normalized by the observed RT span.
    pub residual: f64,
}

impl RtCalibration {
    pub fn identity(residual: f64) -> Self {
        Self {
            slope: 1.0,
            intercept: 0.0,
            residual,
        }
    }

    pub fn apply(&self, raw: f64) -> f64 {
        self.slope * raw + self.intercept
    }
}

/// Least squares fit of observed RT (y) against raw prediction (x).
fn fit_linear(points: &[(f64, f64)]) -> Result<RtCalibration, CalibrationFailure> {
    let n = points.len() as f64;
    let mean_x: f64 = points.iter().map(|(x, _)| x).sum::<f64>() / n;
    let mean_y: f64 = points.iter().map(|(_, y)| y).sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    for (x, y) in points {
        cov += (x - mean_x) * (y - mean_y);
        var_x += (x - mean_x).powi(2);
    }
    if var_x == 0.0 {
        return Err(CalibrationFailure::DegenerateFit);
    }

    let slope = cov / var_x;
    let intercept = mean_y - slope * mean_x;
    let fitted = RtCalibration {
        slope,
        intercept,
        residual: 0.0,
    };
    let residual = normalized_rmse(points, &fitted);
    Ok(RtCalibration { residual, ..fitted })
}

fn normalized_rmse(points: &[(f64, f64)], calibration: &RtCalibration) -> f64 {
    let mse: f64 = points
        .iter()
        .map(|(x, y)| (calibration.apply(*x) - y).powi(2))
        .sum::<f64>()
        / points.len() as f64;
    let span = points
        .iter()
        .map(|(_, y)| *y)
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), y| {
            (lo.min(y), hi.max(y))
        });
    mse.sqrt() / (span.1 - span.0).max(1e-9)
}

fn mean_abs_error(points: &[(f64, f64)], calibration: &RtCalibration) -> f64 {
    points
        .iter()
        .map(|(x, y)| (calibration.apply(*x) - y).abs())
        .sum::<f64>()
        / points.len() as f64
}

/// Per-run state of the retention time annotator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RtStage {
    Uncalibrated,
    Calibrating,
    Calibrated,
    Predicting,
    Done,
}

/// Calibrates a retention time model on anchors once per run, then
/// predicts for every PSM in the run.
#[derive(Debug)]
pub struct RtAnnotator<'a> {
    model: &'a RetentionTimeModel,
    calibration: Option<RtCalibration>,
    stage: RtStage,
    /// Anchor MAE in seconds, for downstream model comparison.
    pub anchor_mae: f64,
}

impl<'a> RtAnnotator<'a> {
    pub fn new(model: &'a RetentionTimeModel) -> Self {
        Self {
            model,
            calibration: None,
            stage: RtStage::Uncalibrated,
            anchor_mae: f64::INFINITY,
        }
    }

    pub fn model_name(&self) -> &'static str {
        self.model.name
    }

    pub fn stage(&self) -> RtStage {
        self.stage
    }

    /// Fits the transfer-learning adjustment against the anchors'
    /// observed retention times. Keeps the fitted mapping only when it
    /// beats the raw model on anchor MAE, mirroring the
    /// calibrated-vs-uncalibrated benchmark of the original tooling.
    pub fn calibrate(&mut self, anchors: &[&Psm], run_id: &str, config: &RtConfig) -> Result<(), EngineError> {
        assert_eq!(
            self.stage,
            RtStage::Uncalibrated,
            "RT calibration may only run once per run"
        );
        self.stage = RtStage::Calibrating;

        let points: Vec<(f64, f64)> = anchors
            .iter()
            .filter_map(|psm| {
                self.model
                    .predict(&psm.peptide)
                    .ok()
                    .map(|raw| (raw, psm.retention_time))
            })
            .collect();

        if points.len() < config.min_anchors {
            return Err(EngineError::Calibration {
                run_id: run_id.to_string(),
                reason: CalibrationFailure::TooFewAnchors {
                    have: points.len(),
                    need: config.min_anchors,
                },
            });
        }

        let fitted = fit_linear(&points).map_err(|reason| EngineError::Calibration {
            run_id: run_id.to_string(),
            reason,
        })?;
        let identity = RtCalibration::identity(normalized_rmse(&points, &RtCalibration::identity(0.0)));

        let fitted_mae = mean_abs_error(&points, &fitted);
        let identity_mae = mean_abs_error(&points, &identity);
        let (chosen, chosen_mae) = if fitted_mae <= identity_mae {
            (fitted, fitted_mae)
        } else {
            info!(
                "Raw '{}' predictions beat the calibrated fit on anchor MAE \
                 ({:.2}s vs {:.2}s), keeping them unadjusted",
                self.model.name, identity_mae, fitted_mae
            );
            (identity, identity_mae)
        };

        if chosen.residual > config.max_residual {
            return Err(EngineError::Calibration {
                run_id: run_id.to_string(),
                reason: CalibrationFailure::ResidualTooHigh {
                    residual: chosen.residual,
                    bound: config.max_residual,
                },
            });
        }

        info!(
            "RT model '{}' calibrated on {} anchors (slope {:.4}, residual {:.4}, MAE {:.2}s)",
            self.model.name, points.len(), chosen.slope, chosen.residual, chosen_mae
        );
        self.anchor_mae = chosen_mae;
        self.calibration = Some(chosen);
        self.stage = RtStage::Calibrated;
        Ok(())
    }

    /// Predicts the PSM's retention time and inserts the delta-RT
    /// features. Requires a calibrated annotator.
    pub fn annotate_psm(&self, psm: &mut Psm) -> Result<(), PredictionFailure> {
        let calibration = self
            .calibration
            .as_ref()
            .expect("annotate_psm called before calibration");
        let predicted = calibration.apply(self.model.predict(&psm.peptide)?);
        psm.features.insert_finite(
            FeatureId::Deeplc(RtFeature::ObservedRetentionTime),
            psm.retention_time,
        );
        psm.features
            .insert_finite(FeatureId::Deeplc(RtFeature::PredictedRetentionTime), predicted);
        psm.features.insert_finite(
            FeatureId::Deeplc(RtFeature::RtDiff),
            (predicted - psm.retention_time).abs(),
        );
        Ok(())
    }

    pub fn start_predicting(&mut self) {
        assert_eq!(self.stage, RtStage::Calibrated);
        self.stage = RtStage::Predicting;
    }

    pub fn finish(&mut self) {
        assert_eq!(self.stage, RtStage::Predicting);
        self.stage = RtStage::Done;
    }
}

/// Best-of-candidates pass: per peptide sequence, every PSM gets the
/// minimum delta-RT (and its observed/predicted pair) across all PSMs
/// sharing that sequence.
pub fn annotate_best_rt(psms: &mut [Psm]) {
    let mut best: HashMap<&str, (f64, f64, f64)> = HashMap::new();
    for psm in psms.iter() {
        let Some(diff) = psm.features.get(&FeatureId::Deeplc(RtFeature::RtDiff)) else {
            continue;
        };
        let observed = psm
            .features
            .get(&FeatureId::Deeplc(RtFeature::ObservedRetentionTime))
            .unwrap_or(f64::NAN);
        let predicted = psm
            .features
            .get(&FeatureId::Deeplc(RtFeature::PredictedRetentionTime))
            .unwrap_or(f64::NAN);
        best.entry(psm.peptide.as_str())
            .and_modify(|entry| {
                if diff < entry.0 {
                    *entry = (diff, observed, predicted);
                }
            })
            .or_insert((diff, observed, predicted));
    }

    let best: HashMap<String, (f64, f64, f64)> = best
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();

    for psm in psms.iter_mut() {
        let Some(&(diff, observed, predicted)) = best.get(psm.peptide.as_str()) else {
            continue;
        };
        psm.features
            .insert_finite(FeatureId::Deeplc(RtFeature::RtDiffBest), diff);
        psm.features.insert_finite(
            FeatureId::Deeplc(RtFeature::ObservedRetentionTimeBest),
            observed,
        );
        psm.features.insert_finite(
            FeatureId::Deeplc(RtFeature::PredictedRetentionTimeBest),
            predicted,
        );
    }
}

/// Picks the retention model for the run: candidates share the family
/// selected by the fragmentation validator, each is calibrated on the
/// anchors, and the lowest anchor MAE wins (catalog order on ties).
pub fn validate_retention<'a>(
    declared: &str,
    family: &'a str,
    anchors: &[&Psm],
    run_id: &str,
    catalog: &'a ModelCatalog,
    config: &RtConfig,
) -> Result<RtAnnotator<'a>, EngineError> {
    let mut candidates: Vec<&RetentionTimeModel> = Vec::new();
    if let Some(model) = catalog.find_retention(declared) {
        if model.family == family {
            candidates.push(model);
        }
    }
    for model in catalog.retention_for_family(family) {
        if !candidates.iter().any(|m| m.name == model.name) {
            candidates.push(model);
        }
    }
    if candidates.is_empty() {
        // No family-specific model in the catalog, benchmark them all
        candidates = catalog.retention_models().collect();
    }

    let mut best: Option<RtAnnotator> = None;
    let mut last_err = None;
    for model in candidates {
        let mut annotator = RtAnnotator::new(model);
        match annotator.calibrate(anchors, run_id, config) {
            Ok(()) => {
                if best
                    .as_ref()
                    .map_or(true, |b| annotator.anchor_mae < b.anchor_mae)
                {
                    best = Some(annotator);
                }
            }
            Err(e) => last_err = Some(e),
        }
    }

    match best {
        Some(annotator) => {
            info!(
                "Selected RT model '{}' (anchor MAE {:.2}s)",
                annotator.model_name(),
                annotator.anchor_mae
            );
            Ok(annotator)
        }
        None => Err(last_err.unwrap_or(EngineError::Calibration {
            run_id: run_id.to_string(),
            reason: CalibrationFailure::TooFewAnchors {
                have: anchors.len(),
                need: config.min_anchors,
            },
        })),
    }
}
