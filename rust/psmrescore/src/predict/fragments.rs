use crate::errors::PredictionFailure;
use serde::{
    Deserialize,
    Serialize,
};

const PROTON: f64 = 1.007_276_466_621;
const WATER: f64 = 18.010_564_684;

/// Peptides longer than this are rejected per PSM (matches the length
/// limit of the prediction backends this engine fronts).
pub const MAX_PEPTIDE_LEN: usize = 60;
pub const MIN_PEPTIDE_LEN: usize = 4;

/// Monoisotopic residue masses for the 20 proteinogenic amino acids.
fn residue_mass(residue: char) -> Option<f64> {
    let mass = match residue {
        'G' => 57.021_463_72,
        'A' => 71.037_113_79,
        'S' => 87.032_028_41,
        'P' => 97.052_763_85,
        'V' => 99.068_413_91,
        'T' => 101.047_678_47,
        'C' => 103.009_184_48,
        'L' => 113.084_063_98,
        'I' => 113.084_063_98,
        'N' => 114.042_927_44,
        'D' => 115.026_943_03,
        'Q' => 128.058_577_50,
        'K' => 128.094_963_01,
        'E' => 129.042_593_09,
        'M' => 131.040_484_62,
        'H' => 137.058_911_86,
        'F' => 147.068_413_91,
        'R' => 156.101_111_02,
        'Y' => 163.063_328_53,
        'W' => 186.079_312_95,
        _ => return None,
    };
    Some(mass)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum IonSeries {
    B,
    Y,
}

impl std::fmt::Display for IonSeries {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IonSeries::B => write!(f, "b"),
            IonSeries::Y => write!(f, "y"),
        }
    }
}

/// One singly charged theoretical backbone fragment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TheoreticalFragment {
    pub series: IonSeries,
    /// 1-based ordinal within the series (b1, y1, ...).
    pub ordinal: u8,
    pub mz: f64,
}

/// Generates singly charged b and y ion m/z values for a plain peptide
/// sequence, b ions first, both series by increasing ordinal.
pub fn by_fragments(peptide: &str) -> Result<Vec<TheoreticalFragment>, PredictionFailure> {
    let residues: Vec<f64> = peptide
        .chars()
        .map(|c| residue_mass(c).ok_or(PredictionFailure::UnknownResidue { residue: c }))
        .collect::<Result<_, _>>()?;

    if residues.len() < MIN_PEPTIDE_LEN {
        return Err(PredictionFailure::PeptideTooShort {
            len: residues.len(),
        });
    }
    if residues.len() > MAX_PEPTIDE_LEN {
        return Err(PredictionFailure::PeptideTooLong {
            len: residues.len(),
            max: MAX_PEPTIDE_LEN,
        });
    }

    let n = residues.len();
    let mut out = Vec::with_capacity(2 * (n - 1));

    let mut prefix = 0.0;
    for (i, mass) in residues[..n - 1].iter().enumerate() {
        prefix += mass;
        out.push(TheoreticalFragment {
            series: IonSeries::B,
            ordinal: (i + 1) as u8,
            mz: prefix + PROTON,
        });
    }

    let mut suffix = 0.0;
    for (i, mass) in residues[1..].iter().rev().enumerate() {
        suffix += mass;
        out.push(TheoreticalFragment {
            series: IonSeries::Y,
            ordinal: (i + 1) as u8,
            mz: suffix + WATER + PROTON,
        });
    }

    Ok(out)
}

/// Monoisotopic neutral mass of the intact peptide.
pub fn peptide_mass(peptide: &str) -> Result<f64, PredictionFailure> {
    let mut total = WATER;
    for c in peptide.chars() {
        total += residue_mass(c).ok_or(PredictionFailure::UnknownResidue { residue: c })?;
    }
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_by_fragment_counts() {
        let frags = by_fragments("PEPTIDEK").unwrap();
        // 7 b ions + 7 y ions for an 8-mer
        assert_eq!(frags.len(), 14);
        assert_eq!(
            frags.iter().filter(|f| f.series == IonSeries::B).count(),
            7
        );
    }

    #[test]
    fn test_b_and_y_complementarity() {
        // b_i + y_(n-i) = precursor neutral mass + water... expressed in
        // singly protonated m/z terms: b_i + y_{n-i} = M + 2 * proton
        let pep = "LESLIEK";
        let frags = by_fragments(pep).unwrap();
        let m = peptide_mass(pep).unwrap();
        let n = pep.len() as u8;
        for f in frags.iter().filter(|f| f.series == IonSeries::B) {
            let y = frags
                .iter()
                .find(|g| g.series == IonSeries::Y && g.ordinal == n - f.ordinal)
                .unwrap();
            assert!((f.mz + y.mz - (m + 2.0 * 1.007_276_466_621)).abs() < 1e-6);
        }
    }

    #[test]
    fn test_y1_of_lysine_terminal() {
        let frags = by_fragments("PEPTIDEK").unwrap();
        let y1 = frags
            .iter()
            .find(|f| f.series == IonSeries::Y && f.ordinal == 1)
            .unwrap();
        // K + water + proton
        assert!((y1.mz - 147.112_804).abs() < 1e-3);
    }

    #[test]
    fn test_unknown_residue_is_recovered_failure() {
        match by_fragments("PEPTIDEX") {
            Err(PredictionFailure::UnknownResidue { residue }) => assert_eq!(residue, 'X'),
            other => panic!("Expected UnknownResidue, got {:?}", other),
        }
    }

    #[test]
    fn test_too_short() {
        assert!(matches!(
            by_fragments("PEP"),
            Err(PredictionFailure::PeptideTooShort { .. })
        ));
    }
}
