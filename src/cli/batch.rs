//! Batch file parsing.

use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::dispatch::NarrationJob;

/// Errors that can occur when parsing a batch file.
#[derive(Error, Debug)]
pub enum BatchParseError {
    #[error("Line {line}: expected 'output_path;text'")]
    InvalidFormat { line: usize },

    #[error("Line {line}: output path cannot be empty")]
    EmptyPath { line: usize },

    #[error("Line {line}: text cannot be empty")]
    EmptyText { line: usize },

    #[error("Failed to read batch file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Parse one "output_path;text" line.
///
/// Only the first semicolon separates; the text may contain more.
pub fn parse_line(input: &str, line: usize) -> Result<NarrationJob, BatchParseError> {
    let (path, text) = input
        .split_once(';')
        .ok_or(BatchParseError::InvalidFormat { line })?;

    let path = path.trim();
    let text = text.trim();
    if path.is_empty() {
        return Err(BatchParseError::EmptyPath { line });
    }
    if text.is_empty() {
        return Err(BatchParseError::EmptyText { line });
    }

    Ok(NarrationJob::new(path, text))
}

/// Parse a whole batch, skipping blank lines and `#` comments.
pub fn parse_batch(content: &str) -> Result<Vec<NarrationJob>, BatchParseError> {
    content
        .lines()
        .enumerate()
        .filter(|(_, l)| {
            let l = l.trim();
            !l.is_empty() && !l.starts_with('#')
        })
        .map(|(i, l)| parse_line(l, i + 1))
        .collect()
}

pub fn read_batch(path: &Path) -> Result<Vec<NarrationJob>, BatchParseError> {
    let content = std::fs::read_to_string(path).map_err(|source| BatchParseError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_batch(&content)
}
