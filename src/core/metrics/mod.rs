pub mod encoding;
pub mod gc;
pub mod overrepresented;
pub mod quality;
pub mod quantile;

pub use encoding::{
    DEFAULT_SAMPLE_READS, ENCODING_RULES, QualRange, classify, detect_encoding,
    detect_encoding_with, scan_qual_range,
};
pub use gc::{BaseCounts, GcOptions, analyze_gc, analyze_gc_with};
pub use overrepresented::{
    DEFAULT_BUFFER_SIZE, DEFAULT_MIN_SIZE, DuplicateOptions, LineIntervalPrune, NeverPrune,
    OverrepRow, PrunePolicy, SequenceCounter, SequenceCounts, classify_source, count_duplicates,
    count_duplicates_with, overrepresented_rows,
};
pub use quality::{QualityAgg, QualityOptions, analyze_quality, analyze_quality_with};
pub use quantile::{
    CodeHist, PositionTable, rank_indices, select_quantiles, summarize_collections,
};
