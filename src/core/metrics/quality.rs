use crate::core::fastq::{ErrorPolicy, FastqRecords};
use crate::core::io::Reopen;
use crate::core::metrics::encoding::{DEFAULT_SAMPLE_READS, detect_encoding_with};
use crate::core::metrics::quantile::PositionTable;
use crate::core::model::{EmptyReadPolicy, EncodingChoice, EncodingScheme, QualityReport};
use crate::error::{QcError, Result};

#[derive(Clone, Copy, Debug)]
pub struct QualityOptions {
    /// Records sampled for encoding detection.
    pub sample_size: usize,
    pub encoding: EncodingChoice,
    pub error_policy: ErrorPolicy,
    pub empty_read: EmptyReadPolicy,
}

impl Default for QualityOptions {
    fn default() -> Self {
        Self {
            sample_size: DEFAULT_SAMPLE_READS,
            encoding: EncodingChoice::Auto,
            error_policy: ErrorPolicy::Fail,
            empty_read: EmptyReadPolicy::Nan,
        }
    }
}

/// Running per-read and per-position quality state for one pass.
pub struct QualityAgg {
    encoding: EncodingScheme,
    empty_read: EmptyReadPolicy,
    per_read_mean: Vec<f64>,
    table: PositionTable,
}

impl QualityAgg {
    pub fn new(encoding: EncodingScheme, empty_read: EmptyReadPolicy) -> Self {
        Self {
            encoding,
            empty_read,
            per_read_mean: Vec::new(),
            table: PositionTable::new(),
        }
    }

    /// `record` is the 1-based record number, used for error reporting.
    pub fn update(&mut self, record: u64, qual: &[u8]) -> Result<()> {
        if qual.is_empty() {
            return match self.empty_read {
                EmptyReadPolicy::Fail => Err(QcError::EmptyRead { record }),
                EmptyReadPolicy::Nan => {
                    self.per_read_mean.push(f64::NAN);
                    Ok(())
                }
            };
        }
        let sum: i64 = qual.iter().map(|&c| self.encoding.score(c) as i64).sum();
        self.per_read_mean.push(sum as f64 / qual.len() as f64);
        self.table.add_read(qual);
        Ok(())
    }

    pub fn reads(&self) -> usize {
        self.per_read_mean.len()
    }

    pub fn finish(self, skipped_records: u64) -> QualityReport {
        QualityReport {
            encoding: self.encoding,
            per_position_mean: self.table.means(self.encoding),
            quantiles: self.table.quantiles(self.encoding),
            per_read_mean: self.per_read_mean,
            skipped_records,
        }
    }
}

pub fn analyze_quality<S: Reopen + ?Sized>(source: &S) -> Result<QualityReport> {
    analyze_quality_with(source, &QualityOptions::default())
}

/// Two passes: encoding detection over a prefix, then a full scan from the
/// start of a freshly reopened source.
pub fn analyze_quality_with<S: Reopen + ?Sized>(
    source: &S,
    opts: &QualityOptions,
) -> Result<QualityReport> {
    let encoding = match opts.encoding {
        EncodingChoice::Fixed(scheme) => scheme,
        EncodingChoice::Auto => {
            detect_encoding_with(source.reopen()?, opts.sample_size, opts.error_policy)?
        }
    };

    let mut agg = QualityAgg::new(encoding, opts.empty_read);
    let mut records = FastqRecords::new(source.reopen()?, opts.error_policy);
    while records.advance()? {
        let record = records.records() + records.skipped();
        agg.update(record, records.current().qual)?;
    }
    if agg.reads() == 0 {
        return Err(QcError::EmptyInput);
    }
    log::debug!(
        "quality pass: {} read(s), {} position(s), {} skipped",
        agg.reads(),
        agg.table.positions(),
        records.skipped()
    );
    Ok(agg.finish(records.skipped()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::io::MemorySource;

    fn sanger() -> QualityOptions {
        QualityOptions {
            encoding: EncodingChoice::Fixed(EncodingScheme::Sanger),
            ..QualityOptions::default()
        }
    }

    #[test]
    fn constant_file_under_sanger() {
        let src = MemorySource::new(b"@a\nACGT\n+\nIIII\n".repeat(4));
        let report = analyze_quality_with(&src, &sanger()).unwrap();
        assert_eq!(report.encoding, EncodingScheme::Sanger);
        assert_eq!(report.per_read_mean, vec![40.0; 4]);
        assert_eq!(report.per_position_mean, vec![40.0; 4]);
        assert_eq!(report.quantiles.q10, vec![40; 4]);
        assert_eq!(report.quantiles.q90, vec![40; 4]);
    }

    #[test]
    fn constant_file_detected_as_illumina15() {
        // Minimum code 73 is above 65, so the rule table picks Illumina1.5.
        let src = MemorySource::new(b"@a\nACGT\n+\nIIII\n".repeat(4));
        let report = analyze_quality(&src).unwrap();
        assert_eq!(report.encoding, EncodingScheme::Illumina15);
        assert_eq!(report.per_read_mean, vec![9.0; 4]);
        assert_eq!(report.quantiles.q50, vec![9; 4]);
    }

    #[test]
    fn uneven_reads_and_positions() {
        let src = MemorySource::new(b"@a\nAC\n+\n5I\n@b\nACG\n+\n+++\n".to_vec());
        let report = analyze_quality(&src).unwrap();
        assert_eq!(report.per_read_mean, vec![30.0, 10.0]);
        assert_eq!(report.per_position_mean, vec![15.0, 25.0, 10.0]);
        // Position 1 holds {10, 20}: Q10 = 0, Q25 = 0, Q50 = 1, Q75 = 1, Q90 = 1.
        assert_eq!(report.quantiles.q10[0], 10);
        assert_eq!(report.quantiles.q50[0], 20);
        assert_eq!(report.quantiles.q75[0], 20);
        assert_eq!(report.quantiles.q50[2], 10);
    }

    #[test]
    fn fixed_encoding_skips_detection() {
        let src = MemorySource::new(b"@a\nAC\n+\nhh\n".to_vec());
        let opts = QualityOptions {
            encoding: EncodingChoice::Fixed(EncodingScheme::Sanger),
            ..QualityOptions::default()
        };
        let report = analyze_quality_with(&src, &opts).unwrap();
        assert_eq!(report.per_read_mean, vec![71.0]);
        let report = analyze_quality(&src).unwrap();
        assert_eq!(report.encoding, EncodingScheme::Illumina15);
        assert_eq!(report.per_read_mean, vec![40.0]);
    }

    #[test]
    fn detection_failure_aborts() {
        let src = MemorySource::new(b"@a\nA\n+\n\x7f\n".to_vec());
        assert!(matches!(
            analyze_quality(&src),
            Err(QcError::UnrecognizedEncoding { .. })
        ));
        let src = MemorySource::new(Vec::new());
        assert!(matches!(analyze_quality(&src), Err(QcError::EmptyInput)));
    }

    #[test]
    fn empty_read_policy() {
        let src = MemorySource::new(b"@a\nAC\n+\n55\n@b\n\n+\n\n".to_vec());
        let report = analyze_quality(&src).unwrap();
        assert_eq!(report.encoding, EncodingScheme::Sanger);
        assert_eq!(report.per_read_mean[0], 20.0);
        assert!(report.per_read_mean[1].is_nan());
        assert_eq!(report.per_position_mean.len(), 2);

        let opts = QualityOptions {
            empty_read: EmptyReadPolicy::Fail,
            ..QualityOptions::default()
        };
        assert!(matches!(
            analyze_quality_with(&src, &opts),
            Err(QcError::EmptyRead { record: 2 })
        ));
    }

    #[test]
    fn empty_read_number_counts_skipped_records() {
        let src = MemorySource::new(b"@a\nAC\n+\n5\n@b\nAC\n+\n55\n@c\n\n+\n\n".to_vec());
        let opts = QualityOptions {
            error_policy: ErrorPolicy::Skip,
            empty_read: EmptyReadPolicy::Fail,
            ..QualityOptions::default()
        };
        assert!(matches!(
            analyze_quality_with(&src, &opts),
            Err(QcError::EmptyRead { record: 3 })
        ));
    }

    #[test]
    fn truncated_record_does_not_contribute() {
        let src = MemorySource::new(b"@a\nAC\n+\nII\n@b\nACGT\n+\n".to_vec());
        assert!(matches!(
            analyze_quality(&src),
            Err(QcError::MalformedRecord { record: 2, .. })
        ));
        let opts = QualityOptions {
            error_policy: ErrorPolicy::Skip,
            ..QualityOptions::default()
        };
        let report = analyze_quality_with(&src, &opts).unwrap();
        assert_eq!(report.per_position_mean.len(), 2);
        assert_eq!(report.skipped_records, 1);
    }
}
