//! Errors surfaced by the recognizer façade.

use std::io;
use std::path::PathBuf;

use thiserror::Error;
use wand_hmm::{ErrorKind, HmmError};
use wand_models::ModelError;

#[derive(Error, Debug)]
pub enum SpellError {
    #[error("recognizer is not initialized")]
    NotInitialized,

    #[error("gesture trace is empty")]
    EmptyInput,

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Hmm(#[from] HmmError),

    #[error("cannot read trace {}: {source}", path.display())]
    TraceIo {
        path:   PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("trace line {line}: {message}")]
    TraceFormat { line: usize, message: String },
}

impl SpellError {
    /// True when the loaded parameters themselves are unusable, as opposed to
    /// one bad request.
    pub fn is_configuration(&self) -> bool {
        match self {
            SpellError::Hmm(e) => e.kind() == ErrorKind::Configuration,
            SpellError::Model(ModelError::Invalid(e)) => e.kind() == ErrorKind::Configuration,
            SpellError::Model(ModelError::InvalidModel { .. }) => true,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, SpellError>;
