use crate::errors::{
    DocumentReadingError,
    Result,
};
use crate::models::{
    Psm,
    Spectrum,
    SpectrumMap,
};
use serde::{
    Deserialize,
    Serialize,
};
use std::io::{
    BufRead,
    BufReader,
};
use std::path::Path;
use tracing::info;

/// On-disk layout of an identification document: the PSM collection
/// plus the peak lists their spectrum references resolve against.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerRunDocument {
    pub psms: Vec<Psm>,
    pub spectra: Vec<Spectrum>,
}

/// One NDJSON line: a PSM paired with its spectrum. Spectra repeated
/// across lines (chimeric spectra, ranked candidates) are stored once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerPsmEntry {
    pub psm: Psm,
    pub spectrum: Option<Spectrum>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Json,
    NdJson,
}

impl DocumentFormat {
    pub fn detect_from_path(path: &Path) -> std::result::Result<Self, DocumentReadingError> {
        let path_str = path.to_string_lossy().to_lowercase();
        if path_str.ends_with(".ndjson") || path_str.ends_with(".jsonl") {
            Ok(DocumentFormat::NdJson)
        } else if path_str.ends_with(".json") {
            Ok(DocumentFormat::Json)
        } else {
            Err(DocumentReadingError::FileReadingError {
                source: std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    "expected a .json, .ndjson or .jsonl file",
                ),
                context: "detecting document format",
                path: path.to_path_buf(),
            })
        }
    }
}

/// In-memory PSM + spectrum view handed to the engine.
#[derive(Debug)]
pub struct RunDocument {
    pub psms: Vec<Psm>,
    pub spectra: SpectrumMap,
}

impl RunDocument {
    pub fn from_path(path: &Path) -> Result<Self> {
        let format = DocumentFormat::detect_from_path(path)?;
        let file = std::fs::File::open(path).map_err(|e| {
            DocumentReadingError::FileReadingError {
                source: e,
                context: "opening identification document",
                path: path.to_path_buf(),
            }
        })?;
        let reader = BufReader::new(file);
        let out = match format {
            DocumentFormat::Json => Self::from_json_reader(reader),
            DocumentFormat::NdJson => Self::from_ndjson_reader(reader),
        }?;
        info!(
            "Read {} PSMs over {} spectra from {}",
            out.psms.len(),
            out.spectra.len(),
            path.display()
        );
        Ok(out)
    }

    pub fn from_json_reader(reader: impl std::io::Read) -> Result<Self> {
        let doc: SerRunDocument =
            serde_json::from_reader(reader).map_err(|e| DocumentReadingError::ParsingError {
                source: e,
                context: "parsing identification document",
            })?;
        Self::assemble(doc.psms, doc.spectra)
    }

    pub fn from_ndjson_reader(reader: impl BufRead) -> Result<Self> {
        let mut psms = Vec::new();
        let mut spectra = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let entry: SerPsmEntry =
                serde_json::from_str(&line).map_err(|e| DocumentReadingError::ParsingError {
                    source: e,
                    context: "parsing NDJSON PSM entry",
                })?;
            psms.push(entry.psm);
            if let Some(spectrum) = entry.spectrum {
                spectra.push(spectrum);
            }
        }
        Self::assemble(psms, spectra)
    }

    /// Deserialized peak lists bypass the sorted-by-m/z constructor, so
    /// validate and re-normalize them here before the engine ever sees
    /// them. Mismatched peak arrays are a document defect, not a panic.
    fn assemble(psms: Vec<Psm>, spectra: Vec<Spectrum>) -> Result<Self> {
        let spectra = spectra
            .into_iter()
            .map(|s| {
                if s.mz.len() != s.intensity.len() {
                    return Err(DocumentReadingError::MismatchedPeakArrays {
                        spectrum_id: s.id,
                        mz_len: s.mz.len(),
                        intensity_len: s.intensity.len(),
                    });
                }
                Ok(Spectrum::new(s.id, s.mz, s.intensity))
            })
            .collect::<std::result::Result<Vec<Spectrum>, DocumentReadingError>>()?;
        Ok(Self {
            psms,
            spectra: SpectrumMap::from_spectra(spectra),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const JSON_DOC: &str = r#"{
        "psms": [
            {
                "run_id": "run_a",
                "spectrum_ref": "scan=1",
                "peptide": "PEPTIDEK",
                "charge": 2,
                "retention_time": 100.5,
                "dissociation": "HCD",
                "ms_level": 2,
                "search_score": 0.01,
                "protein_accession": "sp|P1|TEST"
            }
        ],
        "spectra": [
            { "id": "scan=1", "mz": [300.0, 100.0], "intensity": [3.0, 1.0] }
        ]
    }"#;

    #[test]
    fn test_json_document_roundtrip() {
        let doc = RunDocument::from_json_reader(JSON_DOC.as_bytes()).unwrap();
        assert_eq!(doc.psms.len(), 1);
        assert_eq!(doc.psms[0].peptide, "PEPTIDEK");
        assert!(doc.psms[0].valid);
        assert!(doc.psms[0].features.is_empty());
        // Peaks re-sorted on assembly
        let spectrum = doc.spectra.get("scan=1").unwrap();
        assert_eq!(spectrum.mz, vec![100.0, 300.0]);
    }

    #[test]
    fn test_ndjson_lines() {
        let lines = concat!(
            r#"{"psm": {"run_id": "run_a", "spectrum_ref": "scan=1", "peptide": "PEPTIDEK", "charge": 2, "retention_time": 100.5, "dissociation": "HCD", "ms_level": 2, "search_score": 0.01, "protein_accession": "sp|P1|TEST"}, "spectrum": {"id": "scan=1", "mz": [100.0], "intensity": [1.0]}}"#,
            "\n\n",
            r#"{"psm": {"run_id": "run_a", "spectrum_ref": "scan=1", "peptide": "ELVISLIVESK", "charge": 2, "retention_time": 120.5, "dissociation": "HCD", "ms_level": 2, "search_score": 0.02, "protein_accession": "sp|P2|TEST"}, "spectrum": null}"#,
            "\n",
        );
        let doc = RunDocument::from_ndjson_reader(lines.as_bytes()).unwrap();
        assert_eq!(doc.psms.len(), 2);
        assert_eq!(doc.spectra.len(), 1);
    }

    #[test]
    fn test_mismatched_peak_arrays_are_a_reading_error() {
        let doc = r#"{
            "psms": [],
            "spectra": [
                { "id": "scan=9", "mz": [100.0, 200.0], "intensity": [1.0] }
            ]
        }"#;
        let res = RunDocument::from_json_reader(doc.as_bytes());
        match res {
            Err(crate::errors::RescoreError::DocumentReading(
                DocumentReadingError::MismatchedPeakArrays {
                    spectrum_id,
                    mz_len,
                    intensity_len,
                },
            )) => {
                assert_eq!(spectrum_id, "scan=9");
                assert_eq!(mz_len, 2);
                assert_eq!(intensity_len, 1);
            }
            other => panic!("Expected MismatchedPeakArrays, got {:?}", other),
        }
    }

    #[test]
    fn test_format_detection() {
        assert_eq!(
            DocumentFormat::detect_from_path(Path::new("a/run.ndjson")).unwrap(),
            DocumentFormat::NdJson
        );
        assert_eq!(
            DocumentFormat::detect_from_path(Path::new("run.JSON")).unwrap(),
            DocumentFormat::Json
        );
        assert!(DocumentFormat::detect_from_path(Path::new("run.mzML")).is_err());
    }
}
