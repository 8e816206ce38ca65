use crate::errors::Result;
use crate::features::{
    FeatureId,
    FeatureWhitelist,
};
use crate::models::Psm;
use std::io::Write;
use std::path::Path;
use tracing::info;

/// Feature values are rounded to this many decimals on emission so the
/// table is stable across platforms.
const FEATURE_DECIMALS: usize = 6;

/// Writes the annotated PSMs as a TSV feature table.
///
/// Columns are the PSM identity fields followed by the canonical
/// feature catalog (restricted to the whitelist), in catalog order.
/// Absent features emit an empty cell, never a placeholder value.
pub fn write_feature_table(
    psms: &[Psm],
    whitelist: &FeatureWhitelist,
    writer: impl Write,
) -> Result<()> {
    let columns: Vec<FeatureId> = FeatureId::catalog()
        .filter(|id| whitelist.keeps(id))
        .collect();

    let mut wtr = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .from_writer(writer);

    let mut header: Vec<String> = vec![
        "run_id".to_string(),
        "spectrum_ref".to_string(),
        "peptide".to_string(),
        "charge".to_string(),
        "retention_time".to_string(),
        "search_score".to_string(),
        "protein_accession".to_string(),
    ];
    header.extend(columns.iter().map(|id| id.to_string()));
    wtr.write_record(&header)?;

    for psm in psms {
        let mut record: Vec<String> = vec![
            psm.run_id.to_string(),
            psm.spectrum_ref.clone(),
            psm.peptide.clone(),
            psm.charge.to_string(),
            format!("{:.4}", psm.retention_time),
            format!("{}", psm.search_score),
            psm.protein_accession.clone(),
        ];
        for id in &columns {
            match psm.features.get(id) {
                Some(value) => record.push(format!("{:.*}", FEATURE_DECIMALS, value)),
                None => record.push(String::new()),
            }
        }
        wtr.write_record(&record)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_feature_table_to_path(
    psms: &[Psm],
    whitelist: &FeatureWhitelist,
    path: &Path,
) -> Result<()> {
    let file = std::fs::File::create(path)?;
    write_feature_table(psms, whitelist, std::io::BufWriter::new(file))?;
    info!("Wrote {} annotated PSMs to {}", psms.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::{
        FeatureRecord,
        RtFeature,
        SpectrumDescriptor,
    };
    use crate::models::DissociationMethod;

    fn annotated_psm() -> Psm {
        let mut features = FeatureRecord::new();
        features.insert(FeatureId::Deeplc(RtFeature::RtDiff), 3.25);
        features.insert(FeatureId::Quantms(SpectrumDescriptor::Snr), 40.0);
        Psm {
            run_id: "run_a".into(),
            spectrum_ref: "scan=1".to_string(),
            peptide: "PEPTIDEK".to_string(),
            charge: 2,
            retention_time: 100.5,
            dissociation: DissociationMethod::Hcd,
            ms_level: 2,
            search_score: 0.01,
            protein_accession: "sp|P1|TEST".to_string(),
            features,
            valid: true,
        }
    }

    #[test]
    fn test_whitelisted_columns_only() {
        let whitelist = FeatureWhitelist::from_names(&[
            "DeepLC:RtDiff".to_string(),
            "Quantms:Snr".to_string(),
        ])
        .unwrap();
        let mut buf = Vec::new();
        write_feature_table(&[annotated_psm()], &whitelist, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let mut lines = text.lines();
        let header = lines.next().unwrap();
        assert!(header.ends_with("DeepLC:RtDiff\tQuantms:Snr"));
        assert!(!header.contains("MS2PIP"));
        let row = lines.next().unwrap();
        assert!(row.contains("3.250000"));
        assert!(row.contains("40.000000"));
    }

    #[test]
    fn test_absent_features_emit_empty_cells() {
        let whitelist = FeatureWhitelist::unrestricted();
        let mut buf = Vec::new();
        write_feature_table(&[annotated_psm()], &whitelist, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let header_cols = text.lines().next().unwrap().split('\t').count();
        let row_cols = text.lines().nth(1).unwrap().split('\t').count();
        assert_eq!(header_cols, row_cols);
        // 7 identity fields + the 46-name catalog
        assert_eq!(header_cols, 7 + FeatureId::catalog().count());
    }
}
