//! Errors that abandon a pricing pass.
//!
//! Every variant is fatal for the pass it occurs in. One-shot runs surface it
//! as a non-zero exit; the monitor logs it and keeps watching.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PassError {
    /// The file could not be read, or its header is missing a required column.
    #[error("{}: {message}", path.display())]
    InputFormat { path: PathBuf, message: String },

    /// A numeric field could not be converted.
    #[error("{}:{line}: column '{column}': cannot parse {value:?} as {expected}", path.display())]
    ValueConversion {
        path: PathBuf,
        line: u64,
        column: &'static str,
        value: String,
        expected: &'static str,
    },

    /// The output file could not be written.
    #[error("failed to write {}: {source}", path.display())]
    SinkWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PassError {
    pub fn input_format(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        PassError::InputFormat {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn sink_write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PassError::SinkWrite {
            path: path.into(),
            source,
        }
    }

    /// Short label used in log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            PassError::InputFormat { .. } => "input format",
            PassError::ValueConversion { .. } => "value conversion",
            PassError::SinkWrite { .. } => "sink write",
        }
    }
}

pub type PassResult<T> = std::result::Result<T, PassError>;
