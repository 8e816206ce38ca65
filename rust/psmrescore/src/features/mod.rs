mod feature_id;
mod record;

pub use feature_id::{
    AgreementMetric,
    FeatureId,
    IonScope,
    RtFeature,
    SpectrumDescriptor,
};
pub use record::FeatureRecord;

use crate::errors::EngineError;
use std::collections::BTreeSet;

/// The user-selectable feature whitelist.
///
/// `None` keeps every computed feature; `Some` keeps only the listed
/// ones. Unknown names fail at construction, before any PSM work.
#[derive(Debug, Clone, Default)]
pub struct FeatureWhitelist(Option<BTreeSet<FeatureId>>);

impl FeatureWhitelist {
    pub fn unrestricted() -> Self {
        Self(None)
    }

    pub fn from_names(names: &[String]) -> Result<Self, EngineError> {
        if names.is_empty() {
            return Ok(Self(None));
        }
        let mut out = BTreeSet::new();
        for name in names {
            let name = name.trim();
            if name.is_empty() {
                continue;
            }
            match FeatureId::parse(name) {
                Some(id) => {
                    out.insert(id);
                }
                None => {
                    return Err(EngineError::UnknownFeature {
                        name: name.to_string(),
                    });
                }
            }
        }
        Ok(Self(Some(out)))
    }

    pub fn keeps(&self, id: &FeatureId) -> bool {
        match &self.0 {
            None => true,
            Some(set) => set.contains(id),
        }
    }

    pub fn is_unrestricted(&self) -> bool {
        self.0.is_none()
    }
}
