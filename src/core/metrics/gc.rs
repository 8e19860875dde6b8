use crate::core::fastq::{ErrorPolicy, FastqRecords};
use crate::core::io::LineSource;
use crate::core::model::EmptyReadPolicy;
use crate::error::{QcError, Result};

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct BaseCounts {
    pub a: u64,
    pub c: u64,
    pub g: u64,
    pub t: u64,
    pub n: u64,
}

impl BaseCounts {
    /// Case-sensitive tally; anything other than `A`, `C`, `G`, `T`, `N` is
    /// ignored.
    pub fn count(seq: &[u8]) -> Self {
        let mut counts = BaseCounts::default();
        for &b in seq {
            match b {
                b'A' => counts.a += 1,
                b'C' => counts.c += 1,
                b'G' => counts.g += 1,
                b'T' => counts.t += 1,
                b'N' => counts.n += 1,
                _ => {}
            }
        }
        counts
    }

    pub fn total(&self) -> u64 {
        self.a + self.c + self.g + self.t + self.n
    }

    /// `(G + C) / (A + C + G + T + N)`, or `None` when nothing was counted.
    pub fn gc_fraction(&self) -> Option<f64> {
        let total = self.total();
        if total == 0 {
            return None;
        }
        Some((self.g + self.c) as f64 / total as f64)
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct GcOptions {
    pub error_policy: ErrorPolicy,
    pub empty_read: EmptyReadPolicy,
}

pub fn analyze_gc<L: LineSource>(lines: L) -> Result<Vec<f64>> {
    analyze_gc_with(lines, &GcOptions::default())
}

/// One GC fraction per record, in read order.
pub fn analyze_gc_with<L: LineSource>(lines: L, opts: &GcOptions) -> Result<Vec<f64>> {
    let mut records = FastqRecords::new(lines, opts.error_policy);
    let mut out = Vec::new();
    while records.advance()? {
        let counts = BaseCounts::count(records.current().seq);
        match (counts.gc_fraction(), opts.empty_read) {
            (Some(gc), _) => out.push(gc),
            (None, EmptyReadPolicy::Nan) => out.push(f64::NAN),
            (None, EmptyReadPolicy::Fail) => {
                return Err(QcError::EmptyRead {
                    record: records.records() + records.skipped(),
                });
            }
        }
    }
    log::debug!(
        "gc pass: {} read(s), {} skipped",
        out.len(),
        records.skipped()
    );
    Ok(out)
}
