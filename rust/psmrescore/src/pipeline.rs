use crate::catalog::ModelCatalog;
use crate::errors::{
    EngineError,
    Result,
};
use crate::features::FeatureWhitelist;
use crate::fragmentation::annotate_fragmentation;
use crate::fusion::{
    fuse,
    RunStatistics,
};
use crate::models::{
    Psm,
    RunDescriptor,
    SpectrumMap,
};
use crate::predict::FragmentationModel;
use crate::retention::{
    annotate_best_rt,
    select_anchors,
    validate_retention,
    RtAnnotator,
    RtConfig,
};
use crate::run_inspector::inspect;
use crate::spectral_features::annotate_spectral;
use crate::validator::{
    effective_tolerance,
    validate_fragmentation,
    ModelDecision,
    ValidationConfig,
};
use rayon::prelude::*;
use regex::Regex;
use serde::{
    Deserialize,
    Serialize,
};
use std::time::Instant;
use tracing::info;

/// Full configuration surface of the annotation engine, as consumed
/// from the CLI layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Declared fragmentation model identifier.
    pub fragmentation_model: String,
    /// Declared retention time model identifier.
    pub retention_model: String,
    /// Fragment matching tolerance override in Da.
    pub ms2_tolerance: Option<f64>,
    /// Minimum mean agreement a fragmentation model must reach.
    pub validation_threshold: f64,
    /// Allowed empirical-vs-declared tolerance ratio, either direction.
    pub tolerance_margin: f64,
    /// Number of PSMs sampled for model validation.
    pub validation_sample_size: usize,
    pub min_calibration_anchors: usize,
    /// Normalized RMSE bound on the RT calibration fit.
    pub max_calibration_residual: f64,
    /// Fraction of non-decoy PSMs used as calibration anchors.
    pub anchor_fraction: f64,
    /// Regex matched against the protein accession to flag decoys.
    pub decoy_pattern: String,
    pub lower_score_is_better: bool,
    /// Feature whitelist; empty keeps every computed feature.
    pub only_features: Vec<String>,
    pub spectral_features: bool,
    pub fragmentation_features: bool,
    pub retention_features: bool,
    /// Worker thread count; 0 defers to the global pool.
    pub num_threads: usize,
    /// Minimum PSMs handed to a worker at a time.
    pub chunk_size: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            fragmentation_model: "HCD2021".to_string(),
            retention_model: "GenericRtHcd2021".to_string(),
            ms2_tolerance: None,
            validation_threshold: 0.7,
            tolerance_margin: 10.0,
            validation_sample_size: 64,
            min_calibration_anchors: 10,
            max_calibration_residual: 0.25,
            anchor_fraction: 0.6,
            decoy_pattern: "^DECOY_".to_string(),
            lower_score_is_better: true,
            only_features: Vec::new(),
            spectral_features: true,
            fragmentation_features: true,
            retention_features: true,
            num_threads: 0,
            chunk_size: 64,
        }
    }
}

impl EngineConfig {
    fn validation_config(&self) -> ValidationConfig {
        ValidationConfig {
            threshold: self.validation_threshold,
            tolerance_margin: self.tolerance_margin,
            ms2_tolerance: self.ms2_tolerance,
        }
    }

    fn rt_config(&self) -> RtConfig {
        RtConfig {
            min_anchors: self.min_calibration_anchors,
            max_residual: self.max_calibration_residual,
            anchor_fraction: self.anchor_fraction,
            lower_score_is_better: self.lower_score_is_better,
        }
    }
}

/// One fully annotated run, in the original input order.
#[derive(Debug)]
pub struct AnnotatedRun {
    pub psms: Vec<Psm>,
    pub run: RunDescriptor,
    pub statistics: RunStatistics,
    /// Name of the fragmentation model actually used, after validation.
    pub fragmentation_model: Option<String>,
    pub retention_model: Option<String>,
}

pub struct Engine<'c> {
    catalog: &'c ModelCatalog,
    config: EngineConfig,
    whitelist: FeatureWhitelist,
    decoy_pattern: Regex,
}

impl<'c> Engine<'c> {
    /// Fails fast on an unparseable decoy pattern or an unknown name in
    /// the feature whitelist, before any PSM is touched.
    pub fn new(catalog: &'c ModelCatalog, config: EngineConfig) -> Result<Self> {
        if !config.spectral_features
            && !config.fragmentation_features
            && !config.retention_features
        {
            return Err(EngineError::InvalidConfig {
                msg: "all feature generators are disabled, enable at least one".to_string(),
            }
            .into());
        }
        let whitelist = FeatureWhitelist::from_names(&config.only_features)?;
        let decoy_pattern =
            Regex::new(&config.decoy_pattern).map_err(|e| EngineError::InvalidConfig {
                msg: format!("invalid decoy pattern '{}': {}", config.decoy_pattern, e),
            })?;
        Ok(Self {
            catalog,
            config,
            whitelist,
            decoy_pattern,
        })
    }

    /// Annotates one run end to end: inspection, model validation, RT
    /// calibration, the parallel per-PSM feature pass, and fusion.
    ///
    /// Output PSMs keep the input order exactly; the parallel section is
    /// an indexed fan-out whose results are merged back by PSM index.
    pub fn annotate(&self, psms: Vec<Psm>, spectra: &SpectrumMap) -> Result<AnnotatedRun> {
        let run = inspect(&psms, spectra)?;
        let start = Instant::now();

        let needs_fragmentation_model =
            self.config.fragmentation_features || self.config.retention_features;
        let fragmentation_model: Option<&FragmentationModel> = if needs_fragmentation_model {
            let sample = validation_sample(&psms, spectra, self.config.validation_sample_size);
            let decision = validate_fragmentation(
                &self.config.fragmentation_model,
                &run,
                &sample,
                self.catalog,
                &self.config.validation_config(),
            )?;
            if let ModelDecision::Replaced { declared_score, .. } = &decision {
                info!(
                    "Declared fragmentation model scored {:.4}, below the {:.2} threshold",
                    declared_score, self.config.validation_threshold
                );
            }
            Some(decision.model())
        } else {
            None
        };

        let mut rt_annotator: Option<RtAnnotator> = if self.config.retention_features {
            let family = fragmentation_model
                .map(|m| m.family)
                .unwrap_or("HCD");
            let anchors = select_anchors(&psms, &self.decoy_pattern, &self.config.rt_config());
            Some(validate_retention(
                &self.config.retention_model,
                family,
                &anchors,
                &run.run_id,
                self.catalog,
                &self.config.rt_config(),
            )?)
        } else {
            None
        };

        let fragment_tolerance = fragmentation_model
            .map(|m| effective_tolerance(m, &self.config.validation_config()));

        if let Some(rt) = rt_annotator.as_mut() {
            rt.start_predicting();
        }
        let (mut indexed, prediction_failures) = self.parallel_feature_pass(
            psms,
            spectra,
            fragmentation_model,
            fragment_tolerance,
            rt_annotator.as_ref(),
        )?;
        if let Some(rt) = rt_annotator.as_mut() {
            rt.finish();
        }

        // Ordered merge: restore the original input order by PSM index
        indexed.sort_unstable_by_key(|(idx, _)| *idx);
        let mut psms: Vec<Psm> = indexed.into_iter().map(|(_, psm)| psm).collect();

        if self.config.retention_features {
            annotate_best_rt(&mut psms);
        }

        let mut statistics = RunStatistics {
            prediction_failures,
            ..RunStatistics::default()
        };
        let emitted: Vec<Psm> = psms
            .into_iter()
            .filter_map(|psm| fuse(psm, spectra, &self.whitelist, &mut statistics))
            .collect();

        statistics.log_summary(&run.run_id);
        info!(
            "Run '{}' annotated with {} distinct features in {:?}",
            run.run_id,
            statistics.features_added.len(),
            start.elapsed()
        );

        Ok(AnnotatedRun {
            psms: emitted,
            run,
            statistics,
            fragmentation_model: fragmentation_model.map(|m| m.name.to_string()),
            retention_model: rt_annotator.map(|rt| rt.model_name().to_string()),
        })
    }

    /// Indexed fan-out over the PSM collection. Workers own disjoint
    /// chunks and never touch shared mutable state; per-PSM prediction
    /// failures are summed, never raised.
    fn parallel_feature_pass(
        &self,
        psms: Vec<Psm>,
        spectra: &SpectrumMap,
        fragmentation_model: Option<&FragmentationModel>,
        fragment_tolerance: Option<f64>,
        rt_annotator: Option<&RtAnnotator>,
    ) -> Result<(Vec<(usize, Psm)>, usize)> {
        let work = |(idx, mut psm): (usize, Psm)| {
            let failures = self.annotate_one(
                &mut psm,
                spectra,
                fragmentation_model,
                fragment_tolerance,
                rt_annotator,
            );
            ((idx, psm), failures)
        };

        let chunk = self.config.chunk_size.max(1);
        let run_pass = || {
            psms.into_par_iter()
                .enumerate()
                .with_min_len(chunk)
                .map(work)
                .unzip()
        };

        let (indexed, failures): (Vec<(usize, Psm)>, Vec<usize>) = if self.config.num_threads > 0 {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(self.config.num_threads)
                .build()
                .map_err(|e| EngineError::InvalidConfig {
                    msg: format!("failed to build worker pool: {}", e),
                })?;
            pool.install(run_pass)
        } else {
            run_pass()
        };

        Ok((indexed, failures.into_iter().sum()))
    }

    fn annotate_one(
        &self,
        psm: &mut Psm,
        spectra: &SpectrumMap,
        fragmentation_model: Option<&FragmentationModel>,
        fragment_tolerance: Option<f64>,
        rt_annotator: Option<&RtAnnotator>,
    ) -> usize {
        let mut failures = 0;
        let spectrum = spectra.get(&psm.spectrum_ref);

        if self.config.spectral_features {
            if let Some(spectrum) = spectrum {
                annotate_spectral(psm, spectrum);
            }
        }

        if self.config.fragmentation_features && psm.valid {
            if let (Some(model), Some(tolerance), Some(spectrum)) =
                (fragmentation_model, fragment_tolerance, spectrum)
            {
                if annotate_fragmentation(psm, spectrum, model, tolerance).is_err() {
                    failures += 1;
                }
            }
        }

        if let Some(rt) = rt_annotator {
            if psm.valid && rt.annotate_psm(psm).is_err() {
                failures += 1;
            }
        }

        failures
    }
}

/// Evenly spaced sample of PSMs with resolvable spectra for model
/// validation.
fn validation_sample<'a>(
    psms: &'a [Psm],
    spectra: &'a SpectrumMap,
    size: usize,
) -> Vec<(&'a Psm, &'a crate::models::Spectrum)> {
    let step = (psms.len() / size.max(1)).max(1);
    psms.iter()
        .step_by(step)
        .filter_map(|psm| spectra.get(&psm.spectrum_ref).map(|s| (psm, s)))
        .filter(|(_, s)| !s.is_empty())
        .take(size)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::{
        FeatureId,
        RtFeature,
        SpectrumDescriptor,
    };
    use crate::models::{
        DissociationMethod,
        Spectrum,
    };

    const PEPTIDES: [&str; 10] = [
        "PEPTIDEK",
        "ELVISLIVESK",
        "ACDEFGHIK",
        "LMNPQRSTVK",
        "WYACDEFGK",
        "GGGGSSSSK",
        "WWWWLLLLK",
        "HIKLMNPQK",
        "VVVVAAAAK",
        "DEDEDEDEK",
    ];

    /// A run whose spectra follow the HCD2021 model and whose observed
    /// retention times are a linear image of the GenericRtHcd2021 raw
    /// predictions.
    fn hcd_run(n: usize) -> (Vec<Psm>, SpectrumMap) {
        let catalog = ModelCatalog::builtin();
        let frag = catalog.find_fragmentation("HCD2021").unwrap();
        let rt = catalog.find_retention("GenericRtHcd2021").unwrap();

        let mut psms = Vec::with_capacity(n);
        let mut spectra = Vec::with_capacity(n);
        for i in 0..n {
            let peptide = PEPTIDES[i % PEPTIDES.len()];
            let spectrum_ref = format!("scan={}", i);
            let preds = frag.predict(peptide).unwrap();
            let mz: Vec<f64> = preds.iter().map(|(f, _)| f.mz).collect();
            let intensity: Vec<f32> = preds.iter().map(|(_, x)| *x).collect();
            spectra.push(Spectrum::new(spectrum_ref.clone(), mz, intensity));
            psms.push(Psm {
                run_id: "run_a".into(),
                spectrum_ref,
                peptide: peptide.to_string(),
                charge: 2,
                retention_time: 60.0 * rt.predict(peptide).unwrap() + 30.0,
                dissociation: DissociationMethod::Hcd,
                ms_level: 2,
                search_score: 0.001 * (i + 1) as f64,
                protein_accession: "sp|P1|TEST".to_string(),
                features: crate::features::FeatureRecord::new(),
                valid: true,
            });
        }
        (psms, SpectrumMap::from_spectra(spectra))
    }

    #[test]
    fn test_declared_cid_replaced_on_hcd_run() {
        let catalog = ModelCatalog::builtin();
        let (psms, spectra) = hcd_run(100);
        let config = EngineConfig {
            fragmentation_model: "CID2020".to_string(),
            ..EngineConfig::default()
        };
        let engine = Engine::new(&catalog, config).unwrap();
        let out = engine.annotate(psms, &spectra).unwrap();
        assert_eq!(out.fragmentation_model.as_deref(), Some("HCD2021"));
        assert_eq!(out.psms.len(), 100);
    }

    #[test]
    fn test_empty_spectrum_dropped_not_fatal() {
        let catalog = ModelCatalog::builtin();
        let (mut psms, spectra) = hcd_run(50);
        let mut spectra_vec: Vec<Spectrum> = (0..50)
            .filter_map(|i| spectra.get(&format!("scan={}", i)).cloned())
            .collect();
        // Replace one spectrum with an empty peak list
        spectra_vec[7] = Spectrum::new("scan=7".to_string(), vec![], vec![]);
        psms[7].spectrum_ref = "scan=7".to_string();
        let spectra = SpectrumMap::from_spectra(spectra_vec);

        let engine = Engine::new(&catalog, EngineConfig::default()).unwrap();
        let out = engine.annotate(psms, &spectra).unwrap();
        assert_eq!(out.psms.len(), 49);
        assert_eq!(out.statistics.dropped(), 1);
        assert_eq!(
            out.statistics.emitted_psms + out.statistics.dropped(),
            out.statistics.input_psms
        );
    }

    #[test]
    fn test_empty_spectrum_dropped_with_spectral_generator_off() {
        // The drop must not depend on the spectral extractor setting
        // the invalid flag
        let catalog = ModelCatalog::builtin();
        let (mut psms, spectra) = hcd_run(50);
        let mut spectra_vec: Vec<Spectrum> = (0..50)
            .filter_map(|i| spectra.get(&format!("scan={}", i)).cloned())
            .collect();
        spectra_vec[7] = Spectrum::new("scan=7".to_string(), vec![], vec![]);
        psms[7].spectrum_ref = "scan=7".to_string();
        let spectra = SpectrumMap::from_spectra(spectra_vec);

        let config = EngineConfig {
            spectral_features: false,
            ..EngineConfig::default()
        };
        let engine = Engine::new(&catalog, config).unwrap();
        let out = engine.annotate(psms, &spectra).unwrap();
        assert_eq!(out.psms.len(), 49);
        assert_eq!(out.statistics.dropped(), 1);
    }

    #[test]
    fn test_only_features_masks_output() {
        let catalog = ModelCatalog::builtin();
        let (psms, spectra) = hcd_run(20);
        let config = EngineConfig {
            only_features: vec!["DeepLC:RtDiff".to_string(), "Quantms:Snr".to_string()],
            ..EngineConfig::default()
        };
        let engine = Engine::new(&catalog, config).unwrap();
        let out = engine.annotate(psms, &spectra).unwrap();
        for psm in &out.psms {
            assert_eq!(psm.features.len(), 2);
            assert!(psm.features.contains(&FeatureId::Deeplc(RtFeature::RtDiff)));
            assert!(psm
                .features
                .contains(&FeatureId::Quantms(SpectrumDescriptor::Snr)));
        }
    }

    #[test]
    fn test_unknown_whitelist_name_fails_before_processing() {
        let catalog = ModelCatalog::builtin();
        let config = EngineConfig {
            only_features: vec!["Quantms:Bogus".to_string()],
            ..EngineConfig::default()
        };
        assert!(matches!(
            Engine::new(&catalog, config),
            Err(crate::errors::RescoreError::Engine(
                EngineError::UnknownFeature { .. }
            ))
        ));
    }

    #[test]
    fn test_all_generators_disabled_is_invalid() {
        let catalog = ModelCatalog::builtin();
        let config = EngineConfig {
            spectral_features: false,
            fragmentation_features: false,
            retention_features: false,
            ..EngineConfig::default()
        };
        assert!(matches!(
            Engine::new(&catalog, config),
            Err(crate::errors::RescoreError::Engine(
                EngineError::InvalidConfig { .. }
            ))
        ));
    }

    #[test]
    fn test_output_order_matches_input() {
        let catalog = ModelCatalog::builtin();
        let (psms, spectra) = hcd_run(64);
        let refs: Vec<String> = psms.iter().map(|p| p.spectrum_ref.clone()).collect();
        let config = EngineConfig {
            num_threads: 4,
            chunk_size: 8,
            ..EngineConfig::default()
        };
        let engine = Engine::new(&catalog, config).unwrap();
        let out = engine.annotate(psms, &spectra).unwrap();
        let out_refs: Vec<String> = out.psms.iter().map(|p| p.spectrum_ref.clone()).collect();
        assert_eq!(refs, out_refs);
    }

    #[test]
    fn test_feature_families_all_present() {
        let catalog = ModelCatalog::builtin();
        let (psms, spectra) = hcd_run(30);
        let engine = Engine::new(&catalog, EngineConfig::default()).unwrap();
        let out = engine.annotate(psms, &spectra).unwrap();
        let psm = &out.psms[0];
        assert!(psm
            .features
            .contains(&FeatureId::Quantms(SpectrumDescriptor::SpectralEntropy)));
        assert!(psm.features.contains(&FeatureId::Deeplc(RtFeature::RtDiff)));
        assert!(psm
            .features
            .contains(&FeatureId::Deeplc(RtFeature::RtDiffBest)));
        assert!(psm.features.iter().any(|(id, _)| {
            matches!(id, FeatureId::Ms2pip(_, _))
        }));
    }
}
