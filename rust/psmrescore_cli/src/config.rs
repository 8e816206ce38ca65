use crate::cli::Cli;
use crate::errors::CliError;
use psmrescore::EngineConfig;
use serde::{
    Deserialize,
    Serialize,
};
use std::path::PathBuf;

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Identification document to annotate
    pub input: Option<PathBuf>,

    /// Output feature table path
    pub output: Option<PathBuf>,

    /// Engine parameters; omitted fields fall back to the defaults
    pub engine: EngineConfig,
}

impl Config {
    pub fn from_path(path: &std::path::Path) -> Result<Self, CliError> {
        let file = std::fs::File::open(path).map_err(|e| CliError::Io {
            source: e.to_string(),
            path: Some(path.display().to_string()),
        })?;
        serde_json::from_reader(file).map_err(|e| CliError::ParseError { msg: e.to_string() })
    }

    /// Command line arguments win over the config file.
    pub fn apply_overrides(&mut self, args: &Cli) {
        if let Some(input) = &args.input {
            self.input = Some(input.clone());
        }
        if let Some(output) = &args.output {
            self.output = Some(output.clone());
        }
        if let Some(model) = &args.fragmentation_model {
            self.engine.fragmentation_model = model.clone();
        }
        if let Some(model) = &args.retention_model {
            self.engine.retention_model = model.clone();
        }
        if let Some(tolerance) = args.ms2_tolerance {
            self.engine.ms2_tolerance = Some(tolerance);
        }
        if let Some(only) = &args.only_features {
            self.engine.only_features = only
                .split(',')
                .map(|x| x.trim().to_string())
                .filter(|x| !x.is_empty())
                .collect();
        }
        if let Some(n) = args.num_threads {
            self.engine.num_threads = n;
        }
    }

    pub fn input_path(&self) -> Result<&PathBuf, CliError> {
        self.input.as_ref().ok_or_else(|| CliError::Config {
            source: "no input document provided, use --input or the config file".to_string(),
        })
    }

    pub fn output_path(&self) -> Result<&PathBuf, CliError> {
        self.output.as_ref().ok_or_else(|| CliError::Config {
            source: "no output path provided, use --output or the config file".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_defaults_and_overrides() {
        let mut config = Config::default();
        assert_eq!(config.engine.fragmentation_model, "HCD2021");
        let args = Cli::parse_from([
            "psmrescore",
            "--input",
            "run.json",
            "--output",
            "features.tsv",
            "--only-features",
            "DeepLC:RtDiff, Quantms:Snr",
            "--ms2-tolerance",
            "0.02",
        ]);
        config.apply_overrides(&args);
        assert_eq!(config.input_path().unwrap(), &PathBuf::from("run.json"));
        assert_eq!(config.engine.ms2_tolerance, Some(0.02));
        assert_eq!(
            config.engine.only_features,
            vec!["DeepLC:RtDiff".to_string(), "Quantms:Snr".to_string()]
        );
    }

    #[test]
    fn test_partial_engine_section_parses() {
        let config: Config = serde_json::from_str(
            r#"{ "input": "run.json", "engine": { "validation_threshold": 0.8 } }"#,
        )
        .unwrap();
        assert_eq!(config.engine.validation_threshold, 0.8);
        assert_eq!(config.engine.tolerance_margin, 10.0);
    }
}
