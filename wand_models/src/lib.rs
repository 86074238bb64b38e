//! # wand_models
//!
//! Persistence for the parameters `wand_hmm` runs on.
//!
//! | File | Format | Read | Write |
//! |---|---|---|---|
//! | Codebook | text ([`codebook`]) | [`load_codebook`] | [`save_codebook`] |
//! | Ensemble | text ([`ensemble`]) | [`load_ensemble`] | [`save_ensemble`] |
//! | Snapshot | binary ([`snapshot`]) | [`load_snapshot`] | [`save_snapshot`] |
//!
//! Text parsing is strict: each line must open with its exact header token,
//! every row must carry exactly the expected number of values, and the first
//! failure aborts the whole load with a [`ParseError`] naming the line (and
//! the 1-based model, inside an ensemble).  Loaders return fully built
//! values or an error, never anything in between.
//!
//! ```rust
//! use wand_models::{parse_codebook, codebook_to_string};
//!
//! let cb = parse_codebook("NumClusters: 1\nClusters:\n0.5 0.5 0.5\n").unwrap();
//! assert_eq!(codebook_to_string(&cb), "NumClusters: 1\nClusters:\n0.5 0.5 0.5\n");
//! ```

use std::fs;
use std::path::Path;

use tracing::info;
use wand_hmm::{ClassifierEnsemble, Codebook};

pub mod codebook;
pub mod ensemble;
pub mod error;
mod reader;
pub mod snapshot;

pub use codebook::{codebook_to_string, parse_codebook, CodebookText};
pub use ensemble::{ensemble_to_string, parse_ensemble, EnsembleText};
pub use error::{ModelError, ParseError, Result};
pub use snapshot::{Snapshot, SNAPSHOT_MAGIC, SNAPSHOT_VERSION};

// ════════════════════════════════════════════════════════════════════════════
// File helpers
// ════════════════════════════════════════════════════════════════════════════

fn read_text(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| ModelError::io(path, e))
}

fn write_bytes(path: &Path, bytes: &[u8]) -> Result<()> {
    fs::write(path, bytes).map_err(|e| ModelError::io(path, e))
}

pub fn load_codebook(path: impl AsRef<Path>) -> Result<Codebook> {
    let path = path.as_ref();
    let codebook = parse_codebook(&read_text(path)?)?;
    info!(
        path = %path.display(),
        clusters = codebook.len(),
        dimensions = codebook.dimensions(),
        "loaded codebook"
    );
    Ok(codebook)
}

pub fn save_codebook(path: impl AsRef<Path>, codebook: &Codebook) -> Result<()> {
    write_bytes(path.as_ref(), codebook_to_string(codebook).as_bytes())
}

pub fn load_ensemble(path: impl AsRef<Path>) -> Result<ClassifierEnsemble> {
    let path = path.as_ref();
    let ensemble = parse_ensemble(&read_text(path)?)?;
    info!(
        path = %path.display(),
        classes = ensemble.num_classes(),
        symbols = ensemble.num_symbols(),
        null_rejection = ensemble.use_null_rejection(),
        "loaded ensemble"
    );
    Ok(ensemble)
}

pub fn save_ensemble(path: impl AsRef<Path>, ensemble: &ClassifierEnsemble) -> Result<()> {
    write_bytes(path.as_ref(), ensemble_to_string(ensemble).as_bytes())
}

pub fn load_snapshot(path: impl AsRef<Path>) -> Result<Snapshot> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|e| ModelError::io(path, e))?;
    let snapshot = Snapshot::decode(&bytes)?;
    info!(path = %path.display(), bytes = bytes.len(), "loaded snapshot");
    Ok(snapshot)
}

pub fn save_snapshot(path: impl AsRef<Path>, snapshot: &Snapshot) -> Result<()> {
    let path = path.as_ref();
    let bytes = snapshot.encode()?;
    write_bytes(path, &bytes)?;
    info!(path = %path.display(), bytes = bytes.len(), "wrote snapshot");
    Ok(())
}
