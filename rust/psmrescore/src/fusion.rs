use crate::features::{
    FeatureId,
    FeatureWhitelist,
};
use crate::models::{
    DissociationMethod,
    Psm,
    SpectrumMap,
};
use std::collections::{
    BTreeMap,
    BTreeSet,
};
use tracing::info;

/// Recovered-condition tallies for one run, reported once at the end
/// instead of being raised per PSM.
#[derive(Debug, Default, Clone)]
pub struct RunStatistics {
    pub input_psms: usize,
    pub emitted_psms: usize,
    /// PSMs flagged invalid upstream or whose spectrum has no peaks.
    pub dropped_invalid: usize,
    /// PSMs whose spectrum reference resolves to nothing.
    pub dropped_missing_spectrum: usize,
    /// Isolated per-PSM prediction failures; the PSMs themselves are
    /// still emitted with their surviving feature subset.
    pub prediction_failures: usize,
    pub counts_by_group: BTreeMap<(u8, DissociationMethod), usize>,
    /// Union of the feature names actually emitted, for downstream
    /// classifier consumption. Sorted by catalog order.
    pub features_added: BTreeSet<FeatureId>,
}

impl RunStatistics {
    pub fn dropped(&self) -> usize {
        self.dropped_invalid + self.dropped_missing_spectrum
    }

    pub fn feature_names(&self) -> Vec<String> {
        self.features_added.iter().map(|id| id.to_string()).collect()
    }

    pub fn log_summary(&self, run_id: &str) {
        info!(
            "Run '{}': emitted {}/{} PSMs ({} invalid spectra, {} missing spectra, \
             {} per-PSM prediction failures)",
            run_id,
            self.emitted_psms,
            self.input_psms,
            self.dropped_invalid,
            self.dropped_missing_spectrum,
            self.prediction_failures,
        );
    }
}

/// Final per-PSM gate: filters the feature record down to the whitelist
/// and decides whether the PSM makes it into the output at all.
///
/// Returns `None` for dropped PSMs; the caller owns the statistics so
/// the conservation invariant (emitted + dropped == input) is kept in
/// one place.
pub fn fuse(
    mut psm: Psm,
    spectra: &SpectrumMap,
    whitelist: &FeatureWhitelist,
    stats: &mut RunStatistics,
) -> Option<Psm> {
    stats.input_psms += 1;
    *stats
        .counts_by_group
        .entry((psm.ms_level, psm.dissociation))
        .or_insert(0) += 1;

    match spectra.get(&psm.spectrum_ref) {
        None => {
            stats.dropped_missing_spectrum += 1;
            return None;
        }
        // Checked here rather than trusting the extractors' flag, so
        // peakless spectra are dropped whichever generators ran
        Some(spectrum) if spectrum.is_empty() => {
            stats.dropped_invalid += 1;
            return None;
        }
        Some(_) => {}
    }
    if !psm.valid {
        stats.dropped_invalid += 1;
        return None;
    }

    psm.features.retain_whitelisted(whitelist);
    stats
        .features_added
        .extend(psm.features.iter().map(|(id, _)| *id));
    stats.emitted_psms += 1;
    Some(psm)
}
