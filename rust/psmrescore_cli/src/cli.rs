use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the JSON configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Path to the identification document (.json/.ndjson), overrides
    /// the config file
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Path to the output feature table (TSV), overrides the config file
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Declared fragmentation model identifier
    #[arg(long)]
    pub fragmentation_model: Option<String>,

    /// Declared retention time model identifier
    #[arg(long)]
    pub retention_model: Option<String>,

    /// Fragment matching tolerance override in Da
    #[arg(long)]
    pub ms2_tolerance: Option<f64>,

    /// Comma separated feature whitelist, e.g.
    /// "DeepLC:RtDiff,Quantms:Snr"
    #[arg(long)]
    pub only_features: Option<String>,

    /// Worker thread count (0 uses all cores)
    #[arg(short, long)]
    pub num_threads: Option<usize>,
}
