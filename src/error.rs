//! Error types for the streaming QC engines.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, QcError>;

#[derive(Debug, Error)]
pub enum QcError {
    /// No records were available to sample or analyze.
    #[error("no FASTQ records found in input")]
    EmptyInput,

    /// Sampled quality codes fall outside every known encoding range.
    #[error(
        "no plausible quality encoding for raw codes {min}..={max}; quality characters must be >32 and <127"
    )]
    UnrecognizedEncoding { min: u8, max: u8 },

    /// A record is structurally broken. `record` is 1-based, `line` is the
    /// 1-based line where the problem was noticed.
    #[error("malformed FASTQ record {record} at line {line}: {reason}")]
    MalformedRecord {
        record: u64,
        line: u64,
        reason: String,
    },

    /// A sequence or quality line with nothing to average over.
    #[error("record {record} has no countable characters")]
    EmptyRead { record: u64 },

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
