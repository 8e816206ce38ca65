use crate::models::DissociationMethod;
use crate::predict::{
    FragmentationModel,
    RetentionTimeModel,
    SeriesProfile,
    ToleranceClass,
};

/// Immutable registry of the prediction models this engine can drive.
///
/// Built once at startup and injected by reference into the validators,
/// which keeps tests free to substitute a reduced catalog. Declaration
/// order is load bearing: the model validator breaks score ties by
/// first-listed-wins.
#[derive(Debug)]
pub struct ModelCatalog {
    fragmentation: Vec<FragmentationModel>,
    retention: Vec<RetentionTimeModel>,
}

const HCD: &[DissociationMethod] = &[DissociationMethod::Hcd];
const CID: &[DissociationMethod] = &[DissociationMethod::Cid];

/// Reversed-phase retention coefficients (minutes-scale), indexed A..Z.
fn retention_coefficients(scale: f64) -> [f64; 26] {
    let mut out = [0.0; 26];
    let table: [(u8, f64); 20] = [
        (b'A', 0.8),
        (b'C', 0.3),
        (b'D', -0.5),
        (b'E', -0.2),
        (b'F', 8.1),
        (b'G', -0.9),
        (b'H', -1.3),
        (b'I', 5.9),
        (b'K', -1.9),
        (b'L', 6.6),
        (b'M', 4.3),
        (b'N', -1.2),
        (b'P', 1.0),
        (b'Q', -0.9),
        (b'R', -1.3),
        (b'S', -0.8),
        (b'T', 0.4),
        (b'V', 3.3),
        (b'W', 9.5),
        (b'Y', 4.0),
    ];
    for (aa, coeff) in table {
        out[(aa - b'A') as usize] = coeff * scale;
    }
    out
}

impl ModelCatalog {
    pub fn builtin() -> Self {
        let fragmentation = vec![
            FragmentationModel {
                name: "HCD2021",
                family: "HCD",
                dissociation: HCD,
                tolerance: ToleranceClass::Medium,
                b_profile: SeriesProfile {
                    weight: 0.2,
                    apex: 0.35,
                    width: 0.30,
                },
                y_profile: SeriesProfile {
                    weight: 1.0,
                    apex: 0.55,
                    width: 0.28,
                },
            },
            FragmentationModel {
                name: "HCD2019",
                family: "HCD",
                dissociation: HCD,
                tolerance: ToleranceClass::Medium,
                b_profile: SeriesProfile {
                    weight: 0.25,
                    apex: 0.40,
                    width: 0.32,
                },
                y_profile: SeriesProfile {
                    weight: 1.0,
                    apex: 0.52,
                    width: 0.30,
                },
            },
            FragmentationModel {
                name: "CID2020",
                family: "CID",
                dissociation: CID,
                tolerance: ToleranceClass::Low,
                b_profile: SeriesProfile {
                    weight: 1.0,
                    apex: 0.30,
                    width: 0.22,
                },
                y_profile: SeriesProfile {
                    weight: 0.2,
                    apex: 0.70,
                    width: 0.25,
                },
            },
            FragmentationModel {
                name: "CID2019",
                family: "CID",
                dissociation: CID,
                tolerance: ToleranceClass::Low,
                b_profile: SeriesProfile {
                    weight: 0.9,
                    apex: 0.32,
                    width: 0.25,
                },
                y_profile: SeriesProfile {
                    weight: 0.3,
                    apex: 0.68,
                    width: 0.28,
                },
            },
        ];

        let retention = vec![
            RetentionTimeModel {
                name: "GenericRtHcd2021",
                family: "HCD",
                coefficients: retention_coefficients(1.0),
                length_coefficient: 0.15,
                intercept: 2.0,
            },
            RetentionTimeModel {
                name: "GenericRtHcd2019",
                family: "HCD",
                coefficients: retention_coefficients(0.9),
                length_coefficient: 0.25,
                intercept: 3.5,
            },
            RetentionTimeModel {
                name: "GenericRtCid2020",
                family: "CID",
                coefficients: retention_coefficients(1.1),
                length_coefficient: 0.12,
                intercept: 1.5,
            },
        ];

        Self {
            fragmentation,
            retention,
        }
    }

    /// Test-oriented constructor for substitute catalogs.
    pub fn new(
        fragmentation: Vec<FragmentationModel>,
        retention: Vec<RetentionTimeModel>,
    ) -> Self {
        Self {
            fragmentation,
            retention,
        }
    }

    pub fn find_fragmentation(&self, name: &str) -> Option<&FragmentationModel> {
        self.fragmentation.iter().find(|m| m.name == name)
    }

    pub fn find_retention(&self, name: &str) -> Option<&RetentionTimeModel> {
        self.retention.iter().find(|m| m.name == name)
    }

    /// Fragmentation models applicable to `method`, in declaration order.
    pub fn fragmentation_for(
        &self,
        method: DissociationMethod,
    ) -> impl Iterator<Item = &FragmentationModel> {
        self.fragmentation.iter().filter(move |m| m.supports(method))
    }

    /// Every retention model, in declaration order.
    pub fn retention_models(&self) -> impl Iterator<Item = &RetentionTimeModel> {
        self.retention.iter()
    }

    /// Retention models of one model family, in declaration order.
    pub fn retention_for_family<'a>(
        &'a self,
        family: &'a str,
    ) -> impl Iterator<Item = &'a RetentionTimeModel> + 'a {
        self.retention.iter().filter(move |m| m.family == family)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_catalog_lookups() {
        let catalog = ModelCatalog::builtin();
        assert!(catalog.find_fragmentation("HCD2021").is_some());
        assert!(catalog.find_fragmentation("TOF5600").is_none());
        assert_eq!(
            catalog
                .fragmentation_for(DissociationMethod::Hcd)
                .map(|m| m.name)
                .collect::<Vec<_>>(),
            vec!["HCD2021", "HCD2019"]
        );
        assert_eq!(
            catalog
                .retention_for_family("CID")
                .map(|m| m.name)
                .collect::<Vec<_>>(),
            vec!["GenericRtCid2020"]
        );
    }
}
