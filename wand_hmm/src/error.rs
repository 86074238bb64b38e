//! Error type shared by the quantizer, the HMMs and the ensemble.

use thiserror::Error;

/// Broad category of an [`HmmError`].
///
/// Configuration errors mean the loaded parameters cannot serve the request
/// at all; structural errors reject one malformed input and leave the
/// parameters usable.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    Structural,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum HmmError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("sample has {found} components, codebook expects {expected}")]
    SampleDimension { expected: usize, found: usize },

    #[error("alphabet mismatch: expected {expected} symbols, model uses {found}")]
    AlphabetMismatch { expected: usize, found: usize },

    #[error("sample component {index} is not a finite number")]
    NonFiniteSample { index: usize },

    #[error("observation sequence is empty")]
    EmptySequence,

    #[error("symbol {symbol} at position {position} is outside the alphabet of {alphabet} symbols")]
    SymbolOutOfRange {
        position: usize,
        symbol:   usize,
        alphabet: usize,
    },

    #[error("{labels} class labels supplied for {models} models")]
    LabelCountMismatch { labels: usize, models: usize },

    #[error("{thresholds} null-rejection thresholds supplied for {classes} classes")]
    ThresholdCountMismatch { thresholds: usize, classes: usize },

    #[error("class label {0} is invalid; labels start at 1 (0 means rejected)")]
    InvalidLabel(u32),
}

impl HmmError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            HmmError::Configuration(_)
            | HmmError::SampleDimension { .. }
            | HmmError::AlphabetMismatch { .. } => ErrorKind::Configuration,
            HmmError::NonFiniteSample { .. }
            | HmmError::EmptySequence
            | HmmError::SymbolOutOfRange { .. }
            | HmmError::LabelCountMismatch { .. }
            | HmmError::ThresholdCountMismatch { .. }
            | HmmError::InvalidLabel(_) => ErrorKind::Structural,
        }
    }
}

pub type Result<T> = std::result::Result<T, HmmError>;
