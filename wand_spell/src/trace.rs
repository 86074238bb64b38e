//! Recorded gesture traces.
//!
//! A trace file holds one sample per line as three whitespace-separated
//! floats, `x y z`.  Blank lines and lines starting with `#` are skipped but
//! still counted, so errors name the line as an editor shows it.

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::error::{Result, SpellError};
use crate::shape::{Sample, SAMPLE_DIMENSIONS};

/// Read a trace file from disk.
pub fn read_trace(path: impl AsRef<Path>) -> Result<Vec<Sample>> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|source| SpellError::TraceIo {
        path: path.to_path_buf(),
        source,
    })?;
    let samples = parse_trace(&text)?;
    debug!(path = %path.display(), samples = samples.len(), "read trace");
    Ok(samples)
}

/// Parse trace text.  An empty trace parses to an empty vector; rejecting
/// it is the recognizer's job.
pub fn parse_trace(text: &str) -> Result<Vec<Sample>> {
    let mut samples = Vec::new();
    for (idx, raw) in text.lines().enumerate() {
        let line = idx + 1;
        let content = raw.trim();
        if content.is_empty() || content.starts_with('#') {
            continue;
        }

        let tokens: Vec<&str> = content.split_whitespace().collect();
        if tokens.len() != SAMPLE_DIMENSIONS {
            return Err(SpellError::TraceFormat {
                line,
                message: format!("expected {} values, found {}", SAMPLE_DIMENSIONS, tokens.len()),
            });
        }

        let mut v = [0.0; SAMPLE_DIMENSIONS];
        for (slot, token) in v.iter_mut().zip(&tokens) {
            *slot = token.parse().map_err(|_| SpellError::TraceFormat {
                line,
                message: format!("malformed value {:?}", token),
            })?;
        }
        samples.push(Sample::from(v));
    }
    Ok(samples)
}
