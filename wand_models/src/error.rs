//! Error types for loading and saving model files.

use std::io;
use std::path::PathBuf;

use thiserror::Error;
use wand_hmm::HmmError;

/// A structural problem in one of the text schemas.
///
/// Line numbers are 1-based and count every physical line, blank or not.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("line {line}: expected header `{expected}`, found `{found}`")]
    HeaderMismatch {
        line:     usize,
        expected: &'static str,
        found:    String,
    },

    #[error("line {line}: malformed {field} token `{token}`")]
    MalformedToken {
        line:  usize,
        field: String,
        token: String,
    },

    #[error("line {line}: {field} expects {expected} values, found {found}")]
    FieldCount {
        line:     usize,
        field:    String,
        expected: usize,
        found:    usize,
    },

    #[error("input ends after line {line}, expected {expected}")]
    Truncated { line: usize, expected: String },

    #[error("line {line}: Model_ID {found} does not match its position {expected}")]
    ModelIdMismatch {
        line:     usize,
        expected: usize,
        found:    usize,
    },

    #[error("model {model}: {source}")]
    InModel {
        model:  usize,
        #[source]
        source: Box<ParseError>,
    },
}

impl ParseError {
    /// Line the error was detected on.
    pub fn line(&self) -> usize {
        match self {
            ParseError::HeaderMismatch { line, .. }
            | ParseError::MalformedToken { line, .. }
            | ParseError::FieldCount { line, .. }
            | ParseError::Truncated { line, .. }
            | ParseError::ModelIdMismatch { line, .. } => *line,
            ParseError::InModel { source, .. } => source.line(),
        }
    }

    /// 1-based class index the error occurred in, if any.
    pub fn model(&self) -> Option<usize> {
        match self {
            ParseError::InModel { model, .. } => Some(*model),
            _ => None,
        }
    }

    pub(crate) fn in_model(self, model: usize) -> Self {
        ParseError::InModel { model, source: Box::new(self) }
    }
}

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("cannot access {}: {source}", path.display())]
    Io {
        path:   PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("invalid parameters: {0}")]
    Invalid(#[from] HmmError),

    #[error("model {model}: invalid parameters: {source}")]
    InvalidModel {
        model:  usize,
        #[source]
        source: HmmError,
    },

    #[error("not a wand model snapshot")]
    BadMagic,

    #[error("snapshot version {found} is not supported (expected {expected})")]
    UnsupportedVersion { found: u16, expected: u16 },

    #[error("snapshot header is truncated")]
    TruncatedSnapshot,

    #[error("snapshot encoding failed: {0}")]
    Encode(String),

    #[error("snapshot decoding failed: {0}")]
    Decode(String),
}

impl ModelError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        ModelError::Io { path: path.into(), source }
    }

    /// True for parse failures, including those nested in a model.
    pub fn is_parse(&self) -> bool {
        matches!(self, ModelError::Parse(_))
    }
}

impl From<bincode::error::EncodeError> for ModelError {
    fn from(err: bincode::error::EncodeError) -> Self {
        ModelError::Encode(err.to_string())
    }
}

impl From<bincode::error::DecodeError> for ModelError {
    fn from(err: bincode::error::DecodeError) -> Self {
        ModelError::Decode(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ModelError>;
