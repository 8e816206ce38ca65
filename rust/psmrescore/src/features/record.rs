use super::{
    FeatureId,
    FeatureWhitelist,
};
use serde::{
    Deserialize,
    Serialize,
};
use std::collections::BTreeMap;

/// Per-PSM mapping from canonical feature name to value.
///
/// Keys are `FeatureId`s, so an out-of-catalog name cannot be inserted
/// by construction. Iteration order is the catalog's `Ord`, which keeps
/// emitted columns stable across runs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeatureRecord {
    values: BTreeMap<FeatureId, f64>,
}

impl FeatureRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: FeatureId, value: f64) {
        self.values.insert(id, value);
    }

    /// Inserts only finite values; NaN/inf from degenerate spectra are
    /// treated as "feature absent" rather than poisoning the record.
    pub fn insert_finite(&mut self, id: FeatureId, value: f64) {
        if value.is_finite() {
            self.values.insert(id, value);
        }
    }

    pub fn get(&self, id: &FeatureId) -> Option<f64> {
        self.values.get(id).copied()
    }

    pub fn contains(&self, id: &FeatureId) -> bool {
        self.values.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&FeatureId, &f64)> {
        self.values.iter()
    }

    pub fn merge(&mut self, other: FeatureRecord) {
        self.values.extend(other.values);
    }

    pub fn retain_whitelisted(&mut self, whitelist: &FeatureWhitelist) {
        if whitelist.is_unrestricted() {
            return;
        }
        self.values.retain(|id, _| whitelist.keeps(id));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::SpectrumDescriptor;

    #[test]
    fn test_insert_finite_skips_nan() {
        let mut rec = FeatureRecord::new();
        rec.insert_finite(FeatureId::Quantms(SpectrumDescriptor::Snr), f64::NAN);
        assert!(rec.is_empty());
        rec.insert_finite(FeatureId::Quantms(SpectrumDescriptor::Snr), 3.5);
        assert_eq!(rec.get(&FeatureId::Quantms(SpectrumDescriptor::Snr)), Some(3.5));
    }

    #[test]
    fn test_whitelist_retain() {
        let mut rec = FeatureRecord::new();
        rec.insert(FeatureId::Quantms(SpectrumDescriptor::Snr), 1.0);
        rec.insert(FeatureId::Quantms(SpectrumDescriptor::SpectralEntropy), 2.0);
        let wl = FeatureWhitelist::from_names(&["Quantms:Snr".into()]).unwrap();
        rec.retain_whitelisted(&wl);
        assert_eq!(rec.len(), 1);
        assert!(rec.contains(&FeatureId::Quantms(SpectrumDescriptor::Snr)));
    }
}
