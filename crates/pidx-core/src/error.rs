use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Harness error type shared by the test driver and the log extractor.
#[derive(Debug, Error)]
pub enum HarnessError {
    /// OS-level I/O error without a known path
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// I/O error while touching a specific file
    #[error("{}: {source}", path.display())]
    File {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Process count has no entry in the grid table
    #[error("no process grid configured for {count} processes (available: {available:?})")]
    UnknownProcessCount { count: u32, available: Vec<u32> },

    /// Malformed `XxYxZ` extent
    #[error("invalid extent {0:?}: expected three positive integers like 12x12x12")]
    InvalidExtent(String),

    /// Extent arithmetic does not fit in 64 bits
    #[error("extent overflow: {0} does not fit in 64 bits")]
    ExtentOverflow(String),

    /// Malformed `<components>*<scalar>` variable type
    #[error("invalid variable type {0:?}: expected <components>*<scalar>, e.g. 1*float32")]
    InvalidVarType(String),

    /// Write or read executable does not exist
    #[error("{role} executable not found: {}", path.display())]
    ExecutableNotFound { role: &'static str, path: PathBuf },

    /// Launcher program could not be spawned
    #[error("failed to launch `{command}`: {source}")]
    Launch {
        command: String,
        #[source]
        source: io::Error,
    },

    /// Configuration file could not be decoded
    #[error("invalid configuration {}: {source}", path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Benchmark log line could not be decoded
    #[error("{}:{line}: {reason}", path.display())]
    LogParse {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    /// A required marker never appeared in a benchmark log
    #[error("{}: missing `{marker}` line", path.display())]
    MissingMarker { path: PathBuf, marker: &'static str },
}

impl HarnessError {
    /// Attach a path to an `io::Error`.
    pub fn file(path: impl Into<PathBuf>, source: io::Error) -> Self {
        HarnessError::File {
            path: path.into(),
            source,
        }
    }
}
