//! Where the recognizer loads its parameters from.

use std::env;
use std::path::PathBuf;

pub const DEFAULT_CODEBOOK_PATH: &str = "wf_hmm_quantizer.txt";
pub const DEFAULT_ENSEMBLE_PATH: &str = "wf_hmm_model.txt";

pub const CODEBOOK_ENV: &str = "WAND_CODEBOOK";
pub const ENSEMBLE_ENV: &str = "WAND_MODEL";
pub const SNAPSHOT_ENV: &str = "WAND_SNAPSHOT";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ModelSource {
    /// Codebook and ensemble in their text schemas.
    Text { codebook: PathBuf, ensemble: PathBuf },
    /// One binary snapshot holding both.
    Snapshot(PathBuf),
}

/// Configuration for [`Recognizer::from_config`](crate::Recognizer::from_config).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecognizerConfig {
    pub source: ModelSource,
}

impl Default for RecognizerConfig {
    fn default() -> Self {
        RecognizerConfig {
            source: ModelSource::Text {
                codebook: PathBuf::from(DEFAULT_CODEBOOK_PATH),
                ensemble: PathBuf::from(DEFAULT_ENSEMBLE_PATH),
            },
        }
    }
}

impl RecognizerConfig {
    pub fn text(codebook: impl Into<PathBuf>, ensemble: impl Into<PathBuf>) -> Self {
        RecognizerConfig {
            source: ModelSource::Text { codebook: codebook.into(), ensemble: ensemble.into() },
        }
    }

    pub fn snapshot(path: impl Into<PathBuf>) -> Self {
        RecognizerConfig { source: ModelSource::Snapshot(path.into()) }
    }

    /// Defaults overridden by the environment.
    ///
    /// `WAND_SNAPSHOT` wins if set; otherwise `WAND_CODEBOOK` / `WAND_MODEL`
    /// replace the default text paths individually.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(snapshot) = lookup(SNAPSHOT_ENV) {
            return Self::snapshot(snapshot);
        }
        Self::text(
            lookup(CODEBOOK_ENV).unwrap_or_else(|| DEFAULT_CODEBOOK_PATH.to_string()),
            lookup(ENSEMBLE_ENV).unwrap_or_else(|| DEFAULT_ENSEMBLE_PATH.to_string()),
        )
    }
}
