//! Streaming, single-pass quality control for FASTQ files.
//!
//! Each analysis is an independent forward pass over a [`LineSource`]:
//!
//! - [`detect_encoding`] classifies the quality encoding from a prefix.
//! - [`analyze_quality`] reports per-read means, per-position means and
//!   per-position quantiles. It needs a [`Reopen`] source because it reads the
//!   data twice.
//! - [`analyze_gc`] reports the GC fraction of every read.
//! - [`count_duplicates`] counts full-sequence duplicates under a periodic
//!   pruning memory bound.

pub mod core;
pub mod error;
pub mod report;

pub use crate::core::fastq::{ErrorPolicy, FastqRecords, ReadView};
pub use crate::core::io::{FastqPath, LineSource, MemorySource, Reopen, SliceLines};
pub use crate::core::metrics::{
    SequenceCounts, analyze_gc, analyze_quality, count_duplicates, detect_encoding,
    overrepresented_rows,
};
pub use crate::core::model::{
    EmptyReadPolicy, EncodingChoice, EncodingScheme, QualityReport, QuantileSummary, translate,
};
pub use crate::error::{QcError, Result};
