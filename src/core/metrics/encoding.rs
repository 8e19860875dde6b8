use crate::core::fastq::{ErrorPolicy, FastqRecords};
use crate::core::io::LineSource;
use crate::core::model::EncodingScheme;
use crate::error::{QcError, Result};

/// Default number of records sampled before the main quality pass.
pub const DEFAULT_SAMPLE_READS: usize = 10_000;

/// Observed raw quality codes over a sampled prefix.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct QualRange {
    pub min: u8,
    pub max: u8,
    pub records: u64,
}

pub struct EncodingRule {
    pub scheme: EncodingScheme,
    pub matches: fn(min: u8, max: u8) -> bool,
}

/// Evaluated top to bottom; the first match wins. Ranges follow
/// https://en.wikipedia.org/wiki/FASTQ_format#Encoding
pub const ENCODING_RULES: [EncodingRule; 4] = [
    EncodingRule {
        scheme: EncodingScheme::Sanger,
        matches: is_sanger,
    },
    EncodingRule {
        scheme: EncodingScheme::Solexa,
        matches: is_solexa,
    },
    EncodingRule {
        scheme: EncodingScheme::Illumina13,
        matches: is_illumina13,
    },
    EncodingRule {
        scheme: EncodingScheme::Illumina15,
        matches: is_illumina15,
    },
];

fn is_sanger(min: u8, max: u8) -> bool {
    min > 32 && min < 59 && max < 127
}

fn is_solexa(min: u8, max: u8) -> bool {
    min > 58 && min < 64 && max < 127
}

fn is_illumina13(min: u8, max: u8) -> bool {
    min > 63 && min < 66 && max < 127
}

// Illumina 1.5 never emits 64 or 65.
fn is_illumina15(min: u8, max: u8) -> bool {
    min > 65 && max < 127
}

pub fn classify(min: u8, max: u8) -> Result<EncodingScheme> {
    ENCODING_RULES
        .iter()
        .find(|rule| (rule.matches)(min, max))
        .map(|rule| rule.scheme)
        .ok_or(QcError::UnrecognizedEncoding { min, max })
}

/// Scans up to `sample_size` records and returns the raw code range of their
/// quality strings.
pub fn scan_qual_range<L: LineSource>(
    lines: L,
    sample_size: usize,
    policy: ErrorPolicy,
) -> Result<QualRange> {
    if sample_size == 0 {
        return Err(QcError::InvalidParameter(
            "encoding sample size must be >= 1".to_string(),
        ));
    }
    let mut records = FastqRecords::new(lines, policy);
    let mut min = u8::MAX;
    let mut max = u8::MIN;
    let mut seen_chars = false;
    let mut sampled = 0u64;
    while sampled < sample_size as u64 {
        let Some(read) = records.next_record()? else {
            break;
        };
        sampled += 1;
        for &c in read.qual {
            min = min.min(c);
            max = max.max(c);
            seen_chars = true;
        }
    }
    if !seen_chars {
        return Err(QcError::EmptyInput);
    }
    Ok(QualRange {
        min,
        max,
        records: sampled,
    })
}

pub fn detect_encoding<L: LineSource>(lines: L, sample_size: usize) -> Result<EncodingScheme> {
    detect_encoding_with(lines, sample_size, ErrorPolicy::Fail)
}

pub fn detect_encoding_with<L: LineSource>(
    lines: L,
    sample_size: usize,
    policy: ErrorPolicy,
) -> Result<EncodingScheme> {
    let range = scan_qual_range(lines, sample_size, policy)?;
    let scheme = classify(range.min, range.max)?;
    log::info!(
        "quality codes {}..={} over {} record(s) => {}",
        range.min,
        range.max,
        range.records,
        scheme
    );
    Ok(scheme)
}
