use crate::errors::EngineError;
use crate::models::{
    DissociationMethod,
    Psm,
    RunDescriptor,
    SpectrumMap,
};
use crate::predict::by_fragments;
use crate::utils::stats::quantile;
use std::collections::BTreeMap;
use tracing::{
    debug,
    info,
};

/// Widest window considered when pairing theoretical fragments with
/// observed peaks for the tolerance estimate.
const MATCH_WINDOW_DA: f64 = 0.7;

/// Lower bound of the empirical tolerance estimate; sub-0.01 Da values
/// say more about synthetic inputs than about the instrument.
const MIN_EMPIRICAL_TOLERANCE_DA: f64 = 0.01;

/// Fallback tolerance when nothing could be matched at all.
const DEFAULT_TOLERANCE_DA: f64 = 0.05;

/// Number of PSMs sampled for the tolerance estimate.
const TOLERANCE_SAMPLE_SIZE: usize = 128;

/// Gates the whole invocation on acquisition homogeneity.
///
/// Groups PSMs by (MS level, dissociation method); anything other than a
/// single MS2 group aborts the run. Pure inspection, no PSM is touched.
pub fn inspect(psms: &[Psm], spectra: &SpectrumMap) -> Result<RunDescriptor, EngineError> {
    if psms.is_empty() {
        return Err(EngineError::ExpectedNonEmptyInput);
    }

    let mut groups: BTreeMap<(u8, DissociationMethod), usize> = BTreeMap::new();
    for psm in psms {
        *groups.entry((psm.ms_level, psm.dissociation)).or_insert(0) += 1;
    }

    let single_ms2 = groups.len() == 1 && groups.keys().next().unwrap().0 == 2;
    if !single_ms2 {
        return Err(EngineError::Heterogeneity {
            groups: groups
                .into_iter()
                .map(|((level, method), count)| (level, method, count))
                .collect(),
        });
    }

    let (_, dissociation) = *groups.keys().next().unwrap();
    let empirical_fragment_tolerance = estimate_fragment_tolerance(psms, spectra);
    info!(
        "Run '{}': {} MS2/{} PSMs, empirical fragment tolerance {:.4} Da",
        psms[0].run_id,
        psms.len(),
        dissociation,
        empirical_fragment_tolerance
    );

    Ok(RunDescriptor {
        run_id: psms[0].run_id.clone(),
        ms_level: 2,
        dissociation,
        empirical_fragment_tolerance,
        num_psms: psms.len(),
    })
}

/// Estimates the effective fragment tolerance of the run as the 90th
/// percentile of absolute m/z errors between theoretical b/y ions and
/// their closest observed peaks, over an evenly spaced PSM sample.
fn estimate_fragment_tolerance(psms: &[Psm], spectra: &SpectrumMap) -> f64 {
    let step = (psms.len() / TOLERANCE_SAMPLE_SIZE).max(1);
    let mut errors: Vec<f32> = Vec::new();

    for psm in psms.iter().step_by(step).take(TOLERANCE_SAMPLE_SIZE) {
        let Some(spectrum) = spectra.get(&psm.spectrum_ref) else {
            continue;
        };
        if spectrum.is_empty() {
            continue;
        }
        let Ok(frags) = by_fragments(&psm.peptide) else {
            continue;
        };
        for frag in frags {
            if let Some((_, err)) = spectrum.closest_peak(frag.mz, MATCH_WINDOW_DA) {
                errors.push(err as f32);
            }
        }
    }

    if errors.is_empty() {
        debug!("No fragment matches found for tolerance estimation, using default");
        return DEFAULT_TOLERANCE_DA;
    }
    (quantile(&errors, 0.9) as f64).max(MIN_EMPIRICAL_TOLERANCE_DA)
}
