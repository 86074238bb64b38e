//! Versioned binary snapshot of a codebook + ensemble pair.
//!
//! ## Layout
//!
//! | Offset | Size | Field |
//! |---|---|---|
//! | 0 | 4 | magic `WNDS` |
//! | 4 | 2 | format version, little-endian `u16` |
//! | 6 | … | bincode (standard config) payload |
//!
//! The payload is a plain record of the same fields the text schemas carry.
//! The version is checked before the payload is touched, and decoded
//! parameters go through the same constructors as parsed text, so a
//! snapshot can never smuggle in a model the text loader would refuse.

use serde::{Deserialize, Serialize};
use wand_hmm::{ClassifierEnsemble, Codebook, DiscreteHmm};

use crate::error::{ModelError, Result};

pub const SNAPSHOT_MAGIC:   [u8; 4] = *b"WNDS";
pub const SNAPSHOT_VERSION: u16     = 1;

const HEADER_LEN: usize = 6;

/// Decoded snapshot contents.
#[derive(Clone, Debug, PartialEq)]
pub struct Snapshot {
    pub codebook: Codebook,
    pub ensemble: ClassifierEnsemble,
}

// ════════════════════════════════════════════════════════════════════════════
// Wire records
// ════════════════════════════════════════════════════════════════════════════

#[derive(Serialize, Deserialize)]
struct CodebookRecord {
    dimensions: u32,
    centroids:  Vec<f64>,
}

#[derive(Serialize, Deserialize)]
struct HmmRecord {
    num_states:  u32,
    num_symbols: u32,
    pi:          Vec<f64>,
    a:           Vec<f64>,
    b:           Vec<f64>,
}

#[derive(Serialize, Deserialize)]
struct EnsembleRecord {
    use_null_rejection: bool,
    labels:             Vec<u32>,
    thresholds:         Vec<f64>,
    models:             Vec<HmmRecord>,
}

#[derive(Serialize, Deserialize)]
struct SnapshotRecord {
    codebook: CodebookRecord,
    ensemble: EnsembleRecord,
}

impl HmmRecord {
    fn from_model(m: &DiscreteHmm) -> Self {
        let n = m.num_states();
        HmmRecord {
            num_states:  n as u32,
            num_symbols: m.num_symbols() as u32,
            pi:          m.initial().to_vec(),
            a:           (0..n).flat_map(|i| m.transition_row(i).iter().copied()).collect(),
            b:           (0..n).flat_map(|i| m.emission_row(i).iter().copied()).collect(),
        }
    }

    fn into_model(self, model: usize) -> Result<DiscreteHmm> {
        let n = self.num_states as usize;
        let k = self.num_symbols as usize;
        if n == 0 || k == 0 || self.a.len() != n * n || self.b.len() != n * k {
            return Err(ModelError::Decode(format!(
                "model {} tables do not match {} states × {} symbols",
                model, n, k
            )));
        }
        let a = self.a.chunks_exact(n).map(<[f64]>::to_vec).collect();
        let b = self.b.chunks_exact(k).map(<[f64]>::to_vec).collect();
        DiscreteHmm::new(self.pi, a, b).map_err(|source| ModelError::InvalidModel { model, source })
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Encode / decode
// ════════════════════════════════════════════════════════════════════════════

impl Snapshot {
    pub fn new(codebook: Codebook, ensemble: ClassifierEnsemble) -> Self {
        Snapshot { codebook, ensemble }
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        let record = SnapshotRecord {
            codebook: CodebookRecord {
                dimensions: self.codebook.dimensions() as u32,
                centroids:  self.codebook.centroids().flatten().copied().collect(),
            },
            ensemble: EnsembleRecord {
                use_null_rejection: self.ensemble.use_null_rejection(),
                labels:             self.ensemble.class_labels().to_vec(),
                thresholds:         self.ensemble.thresholds().to_vec(),
                models:             self.ensemble.models().iter().map(HmmRecord::from_model).collect(),
            },
        };

        let mut out = Vec::with_capacity(HEADER_LEN + 256);
        out.extend_from_slice(&SNAPSHOT_MAGIC);
        out.extend_from_slice(&SNAPSHOT_VERSION.to_le_bytes());
        out.extend(bincode::serde::encode_to_vec(&record, bincode::config::standard())?);
        Ok(out)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_LEN {
            return Err(ModelError::TruncatedSnapshot);
        }
        if bytes[0..4] != SNAPSHOT_MAGIC {
            return Err(ModelError::BadMagic);
        }
        let version = u16::from_le_bytes([bytes[4], bytes[5]]);
        if version != SNAPSHOT_VERSION {
            return Err(ModelError::UnsupportedVersion { found: version, expected: SNAPSHOT_VERSION });
        }

        let payload = &bytes[HEADER_LEN..];
        let (record, used): (SnapshotRecord, usize) =
            bincode::serde::decode_from_slice(payload, bincode::config::standard())?;
        if used != payload.len() {
            return Err(ModelError::Decode(format!(
                "{} trailing bytes after payload",
                payload.len() - used
            )));
        }

        let codebook = Codebook::from_flat(record.codebook.dimensions as usize, record.codebook.centroids)?;
        let models = record
            .ensemble
            .models
            .into_iter()
            .enumerate()
            .map(|(k, m)| m.into_model(k + 1))
            .collect::<Result<Vec<_>>>()?;
        let ensemble = ClassifierEnsemble::new(
            record.ensemble.labels,
            models,
            record.ensemble.thresholds,
            record.ensemble.use_null_rejection,
        )?;

        Ok(Snapshot { codebook, ensemble })
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
