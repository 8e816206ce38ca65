use super::DissociationMethod;
use std::sync::Arc;

/// Descriptor of one homogeneity-checked run, produced by the run
/// inspector and shared read-only with every later stage.
#[derive(Debug, Clone)]
pub struct RunDescriptor {
    pub run_id: Arc<str>,
    pub ms_level: u8,
    pub dissociation: DissociationMethod,
    /// Fragment m/z tolerance estimated from matched peaks (Da).
    pub empirical_fragment_tolerance: f64,
    pub num_psms: usize,
}
