//! Errors raised while reading or writing coverage-database files.
//!
//! Every variant here is fatal for the file-level operation in progress:
//! the caller discards the in-progress result rather than resuming, and a
//! previously valid database is never left with inconsistent links.

use covdb_tree::TreeError;
use std::io;

/// Errors that can occur while reading or writing a CDD stream.
#[derive(Debug, thiserror::Error)]
pub enum CddError {
    /// An I/O error occurred while reading or writing.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A malformed record at a specific line number.
    #[error("parse error at line {line}: {message}")]
    Parse {
        /// The 1-based line number where the error occurred.
        line: usize,
        /// Description of the error.
        message: String,
    },

    /// The file has a structural format error not tied to one line.
    #[error("format error: {0}")]
    Format(String),

    /// The file was written by an incompatible tool version.
    #[error("CDD version {found:#x} does not match expected version {expected:#x}")]
    VersionMismatch {
        /// Version read from the INFO record.
        found: u32,
        /// Version this implementation expects.
        expected: u32,
    },

    /// A merge input's coverage-point counts differ from the database's.
    ///
    /// The two files were derived from different design elaborations and
    /// cannot be reconciled bit-for-bit.
    #[error("coverage-point counts do not match previously read database")]
    PointCountMismatch,

    /// An FSM record named state signals absent from its functional unit.
    #[error("state signals ({from}, {to}) not found in functional unit {funit:?}")]
    FsmSignalsNotFound {
        /// The from-signal name from the record.
        from: String,
        /// The to-signal name from the record.
        to: String,
        /// The functional unit being populated.
        funit: String,
    },

    /// A tree edit or merge failed underneath the reader.
    #[error(transparent)]
    Tree(#[from] TreeError),
}

impl CddError {
    pub(crate) fn parse(line: usize, message: impl Into<String>) -> Self {
        CddError::Parse {
            line,
            message: message.into(),
        }
    }
}
