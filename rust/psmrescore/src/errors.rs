use crate::models::DissociationMethod;
use std::path::PathBuf;

/// Errors raised by low level numeric helpers when their input
/// slices do not match the documented contract.
#[derive(Debug)]
pub enum DataProcessingError {
    ExpectedSlicesSameLength {
        expected: usize,
        other: usize,
        context: String,
    },
    ExpectedNonEmptyData {
        context: Option<String>,
    },
}

/// Fatal conditions that abort a whole annotation run.
///
/// Recovered per-PSM conditions (prediction failures, empty spectra)
/// never show up here, they are aggregated into `RunStatistics`.
#[derive(Debug)]
pub enum EngineError {
    /// The input mixes MS levels or dissociation methods, or contains
    /// non-MS2 spectra. Downstream models are calibrated per homogeneous
    /// run, so this aborts before any model work.
    Heterogeneity {
        groups: Vec<(u8, DissociationMethod, usize)>,
    },
    /// No catalog model cleared the validation threshold for this run.
    NoUsableModel {
        run_id: String,
        declared: String,
        best_candidate: Option<(String, f64)>,
        threshold: f64,
    },
    /// Retention time calibration lacked sufficient or consistent anchors.
    Calibration {
        run_id: String,
        reason: CalibrationFailure,
    },
    /// The feature whitelist references a name outside the canonical
    /// catalog. Checked before any PSM is processed.
    UnknownFeature {
        name: String,
    },
    /// Configuration that cannot be acted on, e.g. no feature family
    /// enabled at all.
    InvalidConfig {
        msg: String,
    },
    ExpectedNonEmptyInput,
}

#[derive(Debug)]
pub enum CalibrationFailure {
    TooFewAnchors { have: usize, need: usize },
    ResidualTooHigh { residual: f64, bound: f64 },
    DegenerateFit,
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::Heterogeneity { groups } => {
                write!(
                    f,
                    "Heterogeneous input, expected a single MS2 (level, method) group, found: "
                )?;
                for (level, method, count) in groups {
                    write!(f, "[MS{} {} x{}] ", level, method, count)?;
                }
                Ok(())
            }
            EngineError::NoUsableModel {
                run_id,
                declared,
                best_candidate,
                threshold,
            } => {
                write!(
                    f,
                    "No usable model for run '{}' (declared '{}', threshold {})",
                    run_id, declared, threshold
                )?;
                if let Some((name, score)) = best_candidate {
                    write!(f, ", best candidate was '{}' scoring {:.4}", name, score)?;
                }
                Ok(())
            }
            EngineError::Calibration { run_id, reason } => {
                write!(f, "RT calibration failed for run '{}': {:?}", run_id, reason)
            }
            EngineError::UnknownFeature { name } => {
                write!(f, "Unknown feature name requested: '{}'", name)
            }
            EngineError::InvalidConfig { msg } => write!(f, "Invalid configuration: {}", msg),
            EngineError::ExpectedNonEmptyInput => write!(f, "Input PSM collection is empty"),
        }
    }
}

/// A non fatal, per PSM prediction failure. Counted in run statistics,
/// never propagated as an error for the run.
#[derive(Debug, Clone)]
pub enum PredictionFailure {
    UnknownResidue { residue: char },
    PeptideTooLong { len: usize, max: usize },
    PeptideTooShort { len: usize },
    NotEnoughIons { have: usize },
}

#[derive(Debug)]
pub enum DocumentReadingError {
    ParsingError {
        source: serde_json::Error,
        context: &'static str,
    },
    FileReadingError {
        source: std::io::Error,
        context: &'static str,
        path: PathBuf,
    },
    /// A spectrum whose m/z and intensity arrays disagree in length.
    MismatchedPeakArrays {
        spectrum_id: String,
        mz_len: usize,
        intensity_len: usize,
    },
}

#[derive(Debug)]
pub enum RescoreError {
    Engine(EngineError),
    DocumentReading(DocumentReadingError),
    Io {
        source: std::io::Error,
        path: Option<PathBuf>,
    },
    ParseError {
        msg: String,
    },
    DataProcessingError(DataProcessingError),
}

impl std::fmt::Display for RescoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RescoreError::Engine(e) => write!(f, "{}", e),
            other => write!(f, "{:?}", other),
        }
    }
}

pub type Result<T> = std::result::Result<T, RescoreError>;

impl From<EngineError> for RescoreError {
    fn from(x: EngineError) -> Self {
        Self::Engine(x)
    }
}

impl From<DocumentReadingError> for RescoreError {
    fn from(x: DocumentReadingError) -> Self {
        Self::DocumentReading(x)
    }
}

impl From<DataProcessingError> for RescoreError {
    fn from(x: DataProcessingError) -> Self {
        Self::DataProcessingError(x)
    }
}

impl From<serde_json::Error> for RescoreError {
    fn from(val: serde_json::Error) -> Self {
        RescoreError::ParseError {
            msg: val.to_string(),
        }
    }
}

impl From<std::io::Error> for RescoreError {
    fn from(x: std::io::Error) -> Self {
        Self::Io {
            source: x,
            path: None,
        }
    }
}

impl From<csv::Error> for RescoreError {
    fn from(x: csv::Error) -> Self {
        RescoreError::ParseError {
            msg: x.to_string(),
        }
    }
}
