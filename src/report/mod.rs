pub mod qc_txt;
pub mod summary_txt;
pub mod zip;

pub const QUALITY_PER_READ: &str = "quality_per_read.txt";
pub const QUALITY_PER_POSITION: &str = "quality_per_position.txt";
pub const GC_PER_READ: &str = "gc_per_read.txt";
pub const OVERREPRESENTED: &str = "overrepresented.txt";
pub const SUMMARY: &str = "summary.txt";
