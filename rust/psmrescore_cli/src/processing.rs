use crate::config::Config;
use crate::errors::CliError;
use indicatif::{
    ProgressIterator,
    ProgressStyle,
};
use psmrescore::data_sources::feature_table::write_feature_table_to_path;
use psmrescore::{
    Engine,
    FeatureWhitelist,
    ModelCatalog,
    Psm,
    RunDocument,
};
use regex::Regex;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// Annotates every run in the input document and writes one combined
/// feature table.
///
/// Documents usually hold a single run, but a merged document is split
/// by run identifier (first-seen order) and each run is calibrated
/// independently. Any fatal engine error aborts the whole invocation.
pub fn process_document(config: &Config, catalog: &ModelCatalog) -> Result<(), CliError> {
    let input = config.input_path()?;
    let output = config.output_path()?;
    let document = RunDocument::from_path(input)?;
    log_target_decoy_counts(&document.psms, &config.engine.decoy_pattern)?;

    let runs = split_by_run(document.psms);
    let engine = Engine::new(catalog, config.engine.clone())?;

    let start = Instant::now();
    let style = ProgressStyle::with_template(
        "{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} ({eta})",
    )
    .unwrap();

    let mut annotated: Vec<Psm> = Vec::new();
    let mut total_dropped = 0;
    for run_psms in runs.into_iter().progress_with_style(style) {
        let out = engine.annotate(run_psms, &document.spectra)?;
        total_dropped += out.statistics.dropped();
        annotated.extend(out.psms);
    }
    info!(
        "Annotated {} PSMs ({} dropped) in {:?}",
        annotated.len(),
        total_dropped,
        start.elapsed()
    );

    let whitelist = FeatureWhitelist::from_names(&config.engine.only_features)
        .map_err(psmrescore::errors::RescoreError::from)?;
    write_feature_table_to_path(&annotated, &whitelist, output)?;
    Ok(())
}

/// Partitions PSMs by run identifier, keeping both the first-seen run
/// order and the PSM order within each run.
fn split_by_run(psms: Vec<Psm>) -> Vec<Vec<Psm>> {
    let mut order: Vec<Arc<str>> = Vec::new();
    let mut runs: Vec<Vec<Psm>> = Vec::new();
    for psm in psms {
        match order.iter().position(|id| *id == psm.run_id) {
            Some(idx) => runs[idx].push(psm),
            None => {
                order.push(psm.run_id.clone());
                runs.push(vec![psm]);
            }
        }
    }
    runs
}

fn log_target_decoy_counts(psms: &[Psm], decoy_pattern: &str) -> Result<(), CliError> {
    let pattern = Regex::new(decoy_pattern).map_err(|e| CliError::Config {
        source: format!("invalid decoy pattern '{}': {}", decoy_pattern, e),
    })?;
    let decoys = psms.iter().filter(|p| p.is_decoy(&pattern)).count();
    info!(
        "Input: {} PSMs ({} targets, {} decoys)",
        psms.len(),
        psms.len() - decoys,
        decoys
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use psmrescore::models::DissociationMethod;
    use psmrescore::FeatureRecord;

    fn psm(run_id: &str, scan: &str) -> Psm {
        Psm {
            run_id: run_id.into(),
            spectrum_ref: scan.to_string(),
            peptide: "PEPTIDEK".to_string(),
            charge: 2,
            retention_time: 100.0,
            dissociation: DissociationMethod::Hcd,
            ms_level: 2,
            search_score: 0.01,
            protein_accession: "sp|P1|TEST".to_string(),
            features: FeatureRecord::new(),
            valid: true,
        }
    }

    #[test]
    fn test_split_by_run_keeps_order() {
        let psms = vec![
            psm("run_a", "scan=1"),
            psm("run_b", "scan=1"),
            psm("run_a", "scan=2"),
        ];
        let runs = split_by_run(psms);
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].len(), 2);
        assert_eq!(runs[0][1].spectrum_ref, "scan=2");
        assert_eq!(runs[1][0].run_id.as_ref(), "run_b");
    }
}
