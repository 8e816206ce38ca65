use serde::{
    Deserialize,
    Serialize,
};

/// Agreement metric between predicted and observed fragment intensities.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum AgreementMetric {
    Pearson,
    Spearman,
    Cosine,
    DotProd,
    Mse,
    MeanAbsDiff,
    StdAbsDiff,
    AbsDiffQ25,
    AbsDiffQ50,
    AbsDiffQ75,
    AbsDiffQ90,
    MaxAbsDiff,
}

impl AgreementMetric {
    pub const ALL: [AgreementMetric; 12] = [
        AgreementMetric::Pearson,
        AgreementMetric::Spearman,
        AgreementMetric::Cosine,
        AgreementMetric::DotProd,
        AgreementMetric::Mse,
        AgreementMetric::MeanAbsDiff,
        AgreementMetric::StdAbsDiff,
        AgreementMetric::AbsDiffQ25,
        AgreementMetric::AbsDiffQ50,
        AgreementMetric::AbsDiffQ75,
        AgreementMetric::AbsDiffQ90,
        AgreementMetric::MaxAbsDiff,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            AgreementMetric::Pearson => "Pearson",
            AgreementMetric::Spearman => "Spearman",
            AgreementMetric::Cosine => "Cosine",
            AgreementMetric::DotProd => "DotProd",
            AgreementMetric::Mse => "Mse",
            AgreementMetric::MeanAbsDiff => "MeanAbsDiff",
            AgreementMetric::StdAbsDiff => "StdAbsDiff",
            AgreementMetric::AbsDiffQ25 => "AbsDiffQ25",
            AgreementMetric::AbsDiffQ50 => "AbsDiffQ50",
            AgreementMetric::AbsDiffQ75 => "AbsDiffQ75",
            AgreementMetric::AbsDiffQ90 => "AbsDiffQ90",
            AgreementMetric::MaxAbsDiff => "MaxAbsDiff",
        }
    }
}

/// Which ion series an agreement metric is restricted to.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum IonScope {
    All,
    B,
    Y,
}

impl IonScope {
    pub const ALL: [IonScope; 3] = [IonScope::All, IonScope::B, IonScope::Y];

    fn suffix(&self) -> &'static str {
        match self {
            IonScope::All => "",
            IonScope::B => "B",
            IonScope::Y => "Y",
        }
    }
}

/// Retention time feature family, with per-sequence "Best" variants
/// (minimum delta across all PSMs sharing the peptide sequence).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum RtFeature {
    ObservedRetentionTime,
    PredictedRetentionTime,
    RtDiff,
    ObservedRetentionTimeBest,
    PredictedRetentionTimeBest,
    RtDiffBest,
}

impl RtFeature {
    pub const ALL: [RtFeature; 6] = [
        RtFeature::ObservedRetentionTime,
        RtFeature::PredictedRetentionTime,
        RtFeature::RtDiff,
        RtFeature::ObservedRetentionTimeBest,
        RtFeature::PredictedRetentionTimeBest,
        RtFeature::RtDiffBest,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            RtFeature::ObservedRetentionTime => "ObservedRetentionTime",
            RtFeature::PredictedRetentionTime => "PredictedRetentionTime",
            RtFeature::RtDiff => "RtDiff",
            RtFeature::ObservedRetentionTimeBest => "ObservedRetentionTimeBest",
            RtFeature::PredictedRetentionTimeBest => "PredictedRetentionTimeBest",
            RtFeature::RtDiffBest => "RtDiffBest",
        }
    }
}

/// Model-free spectral quality descriptors.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum SpectrumDescriptor {
    Snr,
    SpectralEntropy,
    FracTICinTop10Peaks,
    WeightedStdMz,
}

impl SpectrumDescriptor {
    pub const ALL: [SpectrumDescriptor; 4] = [
        SpectrumDescriptor::Snr,
        SpectrumDescriptor::SpectralEntropy,
        SpectrumDescriptor::FracTICinTop10Peaks,
        SpectrumDescriptor::WeightedStdMz,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            SpectrumDescriptor::Snr => "Snr",
            SpectrumDescriptor::SpectralEntropy => "SpectralEntropy",
            SpectrumDescriptor::FracTICinTop10Peaks => "FracTICinTop10Peaks",
            SpectrumDescriptor::WeightedStdMz => "WeightedStdMz",
        }
    }
}

/// A canonical, namespaced feature identifier.
///
/// This is a closed enumeration: a `FeatureId` existing at all means the
/// name is part of the catalog, so unknown names can only be rejected at
/// the parsing boundary (whitelist, wire formats), never after.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum FeatureId {
    Ms2pip(AgreementMetric, IonScope),
    Deeplc(RtFeature),
    Quantms(SpectrumDescriptor),
}

impl FeatureId {
    /// Every feature name this engine can ever emit, in catalog order.
    pub fn catalog() -> impl Iterator<Item = FeatureId> {
        let ms2pip = AgreementMetric::ALL
            .into_iter()
            .flat_map(|m| IonScope::ALL.into_iter().map(move |s| FeatureId::Ms2pip(m, s)));
        let deeplc = RtFeature::ALL.into_iter().map(FeatureId::Deeplc);
        let quantms = SpectrumDescriptor::ALL.into_iter().map(FeatureId::Quantms);
        ms2pip.chain(deeplc).chain(quantms)
    }

    pub fn parse(name: &str) -> Option<FeatureId> {
        Self::catalog().find(|id| id.to_string() == name)
    }

    pub fn namespace(&self) -> &'static str {
        match self {
            FeatureId::Ms2pip(..) => "MS2PIP",
            FeatureId::Deeplc(..) => "DeepLC",
            FeatureId::Quantms(..) => "Quantms",
        }
    }
}

impl std::fmt::Display for FeatureId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FeatureId::Ms2pip(metric, scope) => {
                write!(f, "MS2PIP:{}{}", metric.as_str(), scope.suffix())
            }
            FeatureId::Deeplc(x) => write!(f, "DeepLC:{}", x.as_str()),
            FeatureId::Quantms(x) => write!(f, "Quantms:{}", x.as_str()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn test_catalog_names_are_unique() {
        let names: BTreeSet<String> = FeatureId::catalog().map(|id| id.to_string()).collect();
        assert_eq!(names.len(), FeatureId::catalog().count());
        // 12 metrics x 3 scopes + 6 RT + 4 spectral
        assert_eq!(names.len(), 46);
    }

    #[test]
    fn test_parse_roundtrip() {
        for id in FeatureId::catalog() {
            assert_eq!(FeatureId::parse(&id.to_string()), Some(id));
        }
        assert_eq!(FeatureId::parse("MS2PIP:PearsonY"), Some(FeatureId::Ms2pip(
            AgreementMetric::Pearson,
            IonScope::Y
        )));
        assert!(FeatureId::parse("MS2PIP:pearson").is_none());
        assert!(FeatureId::parse("NotANamespace:Snr").is_none());
    }
}
