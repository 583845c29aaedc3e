//! Typed errors for the squash engine.
//!
//! Both variants are fatal for the output unit being assembled. An unclosed
//! leading block comment is deliberately *not* an error: ingestion truncates
//! silently at end of input instead (see `Squasher::ingest`).

use camino::Utf8PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SquashError {
    /// A requested fragment does not exist or cannot be opened.
    #[error("missing fragment: {path}")]
    MissingFragment {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The destination file cannot be created or written. Output is
    /// serialized fully in memory first, so a failed write never leaves a
    /// partially assembled file behind.
    #[error("failed to write output: {path}")]
    WriteFailure {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
}
