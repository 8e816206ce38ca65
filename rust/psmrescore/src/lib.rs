pub mod catalog;
pub mod data_sources;
pub mod errors;
pub mod features;
pub mod fragmentation;
pub mod fusion;
pub mod models;
pub mod pipeline;
pub mod predict;
pub mod retention;
pub mod run_inspector;
pub mod spectral_features;
pub mod utils;
pub mod validator;

pub use catalog::ModelCatalog;
pub use data_sources::RunDocument;
pub use features::{
    FeatureId,
    FeatureRecord,
    FeatureWhitelist,
};
pub use fusion::RunStatistics;
pub use models::{
    DissociationMethod,
    Psm,
    RunDescriptor,
    Spectrum,
    SpectrumMap,
};
pub use pipeline::{
    AnnotatedRun,
    Engine,
    EngineConfig,
};
