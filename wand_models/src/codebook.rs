//! Text schema for quantizer codebooks.
//!
//! ```text
//! NumClusters: <K>
//! Clusters:
//! <K lines of D whitespace-separated floats>
//! ```
//!
//! `D` is fixed by the first centroid row; every other row must match it.

use std::fmt;

use tracing::warn;
use wand_hmm::{Codebook, HmmError};

use crate::error::{ModelError, Result};
use crate::reader::LineReader;

pub const NUM_CLUSTERS: &str = "NumClusters:";
pub const CLUSTERS:     &str = "Clusters:";

/// Parse a codebook file's contents.
pub fn parse_codebook(text: &str) -> Result<Codebook> {
    let mut reader = LineReader::new(text);

    let num_clusters = reader.header(NUM_CLUSTERS)?;
    let k: usize = num_clusters.single("NumClusters")?;
    if k == 0 {
        return Err(ModelError::Invalid(HmmError::Configuration(format!(
            "line {}: codebook declares zero clusters",
            num_clusters.line
        ))));
    }
    reader.bare_header(CLUSTERS)?;

    let mut rows: Vec<Vec<f64>> = Vec::new();
    for c in 0..k {
        let field = format!("cluster {}", c + 1);
        let row = reader.row(&field)?;
        let values = match rows.first() {
            Some(first) => row.values(&field, first.len())?,
            None        => row.all_values(&field)?,
        };
        rows.push(values);
    }

    if let Some(line) = reader.trailing_content() {
        warn!(line, "ignoring content after the last cluster");
    }
    Ok(Codebook::new(rows)?)
}

/// Displays a codebook in the exact layout [`parse_codebook`] accepts.
pub struct CodebookText<'a>(pub &'a Codebook);

impl fmt::Display for CodebookText<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} {}", NUM_CLUSTERS, self.0.len())?;
        writeln!(f, "{}", CLUSTERS)?;
        for centroid in self.0.centroids() {
            write_row(f, centroid)?;
        }
        Ok(())
    }
}

pub fn codebook_to_string(codebook: &Codebook) -> String {
    CodebookText(codebook).to_string()
}

/// One space-separated row of floats, newline-terminated.  `{:?}` keeps
/// enough digits to reparse the exact value.
pub(crate) fn write_row(f: &mut fmt::Formatter<'_>, values: &[f64]) -> fmt::Result {
    for (i, v) in values.iter().enumerate() {
        if i > 0 {
            f.write_str(" ")?;
        }
        write!(f, "{:?}", v)?;
    }
    f.write_str("\n")
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
