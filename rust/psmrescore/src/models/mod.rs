mod psm;
mod run;
mod spectrum;

pub use psm::Psm;
pub use run::RunDescriptor;
pub use spectrum::{
    Spectrum,
    SpectrumMap,
};

use serde::{
    Deserialize,
    Serialize,
};

/// Fragmentation technique used to generate a spectrum.
///
/// Must be uniform within one run, the run inspector enforces that.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
pub enum DissociationMethod {
    #[default]
    #[serde(rename = "HCD")]
    Hcd,
    #[serde(rename = "CID")]
    Cid,
    #[serde(rename = "ETD")]
    Etd,
    #[serde(rename = "ECD")]
    Ecd,
}

impl std::fmt::Display for DissociationMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let out = match self {
            DissociationMethod::Hcd => "HCD",
            DissociationMethod::Cid => "CID",
            DissociationMethod::Etd => "ETD",
            DissociationMethod::Ecd => "ECD",
        };
        write!(f, "{}", out)
    }
}
