use psmrescore::errors::{
    EngineError,
    RescoreError,
};

#[derive(Debug)]
pub enum CliError {
    Config { source: String },
    ParseError { msg: String },
    Io { source: String, path: Option<String> },
    Rescore(RescoreError),
}

impl CliError {
    /// Distinct process exit code per fatal condition, so pipeline
    /// wrappers can tell a calibration failure from a bad whitelist.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Config { .. } => 2,
            CliError::ParseError { .. } => 3,
            CliError::Io { .. } => 4,
            CliError::Rescore(RescoreError::Engine(e)) => match e {
                EngineError::Heterogeneity { .. } => 10,
                EngineError::NoUsableModel { .. } => 11,
                EngineError::Calibration { .. } => 12,
                EngineError::UnknownFeature { .. } => 13,
                EngineError::InvalidConfig { .. } => 14,
                EngineError::ExpectedNonEmptyInput => 15,
            },
            CliError::Rescore(_) => 1,
        }
    }
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Config { source } => write!(f, "Error interpreting the config: {}", source),
            CliError::ParseError { msg } => write!(f, "Error parsing config: {}", msg),
            CliError::Io { source, path } => {
                if let Some(path) = path {
                    write!(f, "Error reading file {}: {}", path, source)
                } else {
                    write!(f, "Error reading file: {}", source)
                }
            }
            CliError::Rescore(e) => write!(f, "{}", e),
        }
    }
}

impl From<RescoreError> for CliError {
    fn from(x: RescoreError) -> Self {
        Self::Rescore(x)
    }
}
