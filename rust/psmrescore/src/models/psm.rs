use super::DissociationMethod;
use crate::features::FeatureRecord;
use regex::Regex;
use serde::{
    Deserialize,
    Serialize,
};
use std::sync::Arc;

/// One peptide-to-spectrum candidate assignment.
///
/// Created by the reader, mutated in place by the annotators (feature
/// insertion only), then either emitted or dropped by the fusion step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Psm {
    pub run_id: Arc<str>,
    pub spectrum_ref: String,
    pub peptide: String,
    pub charge: u8,
    /// Observed retention time in seconds.
    pub retention_time: f64,
    pub dissociation: DissociationMethod,
    pub ms_level: u8,
    pub search_score: f64,
    pub protein_accession: String,
    #[serde(default)]
    pub features: FeatureRecord,
    #[serde(default = "default_true")]
    pub valid: bool,
}

fn default_true() -> bool {
    true
}

impl Psm {
    pub fn is_decoy(&self, decoy_pattern: &Regex) -> bool {
        decoy_pattern.is_match(&self.protein_accession)
    }

    pub fn mark_invalid(&mut self) {
        self.valid = false;
    }
}
