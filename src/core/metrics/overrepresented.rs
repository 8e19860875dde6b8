use crate::core::fastq::{ErrorPolicy, FastqRecords};
use crate::core::io::LineSource;
use crate::error::{QcError, Result};
use aho_corasick::{AhoCorasick, AhoCorasickBuilder};
use std::collections::HashMap;
use std::sync::OnceLock;

pub const DEFAULT_MIN_SIZE: u64 = 5;
pub const DEFAULT_BUFFER_SIZE: u64 = 1_000_000;

/// Final duplicate counts keyed by the exact sequence bytes.
pub type SequenceCounts = HashMap<Box<[u8]>, u64>;

#[derive(Clone, Copy, Debug)]
pub struct DuplicateOptions {
    pub min_size: u64,
    /// Prune cadence in raw lines, not records.
    pub buffer_size: u64,
    pub error_policy: ErrorPolicy,
}

impl Default for DuplicateOptions {
    fn default() -> Self {
        Self {
            min_size: DEFAULT_MIN_SIZE,
            buffer_size: DEFAULT_BUFFER_SIZE,
            error_policy: ErrorPolicy::Fail,
        }
    }
}

/// Decides when the sequence counter is pruned and what survives.
pub trait PrunePolicy {
    /// Called once for every raw line number consumed (1-based).
    fn due(&self, lines_consumed: u64) -> bool;

    /// Entries with a count at or below this are evicted on prune.
    fn min_size(&self) -> u64;
}

/// Prune every `buffer_size` raw lines, evicting counts `<= min_size`. A
/// sequence rare inside one window is forgotten even if it turns frequent
/// later.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct LineIntervalPrune {
    min_size: u64,
    buffer_size: u64,
}

impl LineIntervalPrune {
    pub fn new(min_size: u64, buffer_size: u64) -> Result<Self> {
        if buffer_size == 0 {
            return Err(QcError::InvalidParameter(
                "buffer size must be >= 1 line".to_string(),
            ));
        }
        Ok(Self {
            min_size,
            buffer_size,
        })
    }
}

impl PrunePolicy for LineIntervalPrune {
    fn due(&self, lines_consumed: u64) -> bool {
        lines_consumed % self.buffer_size == 0
    }

    fn min_size(&self) -> u64 {
        self.min_size
    }
}

/// Exact counting with no eviction.
#[derive(Clone, Copy, Debug, Default)]
pub struct NeverPrune;

impl PrunePolicy for NeverPrune {
    fn due(&self, _lines_consumed: u64) -> bool {
        false
    }

    fn min_size(&self) -> u64 {
        0
    }
}

/// Full-sequence occurrence counts, bounded by periodic pruning.
#[derive(Clone, Debug, Default)]
pub struct SequenceCounter {
    counts: SequenceCounts,
    prunes: u64,
    evicted: u64,
}

impl SequenceCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_or_increment(&mut self, seq: &[u8]) {
        if let Some(count) = self.counts.get_mut(seq) {
            *count += 1;
        } else {
            self.counts.insert(seq.into(), 1);
        }
    }

    /// Drops every entry with a count `<= min_size`. Returns how many went.
    pub fn prune(&mut self, min_size: u64) -> usize {
        let before = self.counts.len();
        self.counts.retain(|_, count| *count > min_size);
        let removed = before - self.counts.len();
        self.prunes += 1;
        self.evicted += removed as u64;
        removed
    }

    pub fn get(&self, seq: &[u8]) -> Option<u64> {
        self.counts.get(seq).copied()
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn prunes(&self) -> u64 {
        self.prunes
    }

    pub fn evicted(&self) -> u64 {
        self.evicted
    }

    pub fn into_counts(self) -> SequenceCounts {
        self.counts
    }
}

pub fn count_duplicates<L: LineSource>(
    lines: L,
    min_size: u64,
    buffer_size: u64,
) -> Result<SequenceCounts> {
    let policy = LineIntervalPrune::new(min_size, buffer_size)?;
    Ok(count_duplicates_with(lines, &policy, ErrorPolicy::Fail)?.into_counts())
}

/// Counts every record's sequence, consulting `policy` after each raw line
/// exactly as a line-at-a-time loop would. The map is returned as it stands
/// at end of stream.
pub fn count_duplicates_with<L, P>(
    lines: L,
    policy: &P,
    error_policy: ErrorPolicy,
) -> Result<SequenceCounter>
where
    L: LineSource,
    P: PrunePolicy + ?Sized,
{
    let mut records = FastqRecords::new(lines, error_policy);
    let mut counter = SequenceCounter::new();
    let mut done = 0u64;
    while records.advance()? {
        let seq_line = records.seq_line();
        let end = records.lines_consumed();
        if (done + 1..seq_line).any(|l| policy.due(l)) {
            counter.prune(policy.min_size());
        }
        counter.insert_or_increment(records.current().seq);
        if (seq_line..=end).any(|l| policy.due(l)) {
            counter.prune(policy.min_size());
        }
        done = end;
    }
    if (done + 1..=records.lines_consumed()).any(|l| policy.due(l)) {
        counter.prune(policy.min_size());
    }
    log::debug!(
        "duplicate pass: {} record(s), {} distinct kept, {} prune(s), {} evicted",
        records.records(),
        counter.len(),
        counter.prunes(),
        counter.evicted()
    );
    Ok(counter)
}

#[derive(Clone, Debug, PartialEq)]
pub struct OverrepRow {
    pub sequence: String,
    pub count: u64,
    pub percent: f64,
    pub source: &'static str,
}

/// Ranks surviving sequences by count, most frequent first.
pub fn overrepresented_rows(counts: &SequenceCounts, total_reads: u64) -> Vec<OverrepRow> {
    let mut rows: Vec<OverrepRow> = counts
        .iter()
        .map(|(seq, &count)| OverrepRow {
            sequence: String::from_utf8_lossy(seq).into_owned(),
            count,
            percent: if total_reads == 0 {
                0.0
            } else {
                count as f64 * 100.0 / total_reads as f64
            },
            source: classify_source(seq),
        })
        .collect();
    rows.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| a.sequence.cmp(&b.sequence))
    });
    rows
}

const ADAPTERS: [(&str, &str); 5] = [
    ("Illumina Universal Adapter", "AGATCGGAAGAG"),
    ("Illumina Small RNA 3' Adapter", "TGGAATTCTCGG"),
    ("Illumina Small RNA 5' Adapter", "GTTCAGAGTTCT"),
    ("Nextera Transposase Sequence", "CTGTCTCTTATA"),
    ("SOLiD Small RNA Adapter", "CGCCTTGGCCGT"),
];

fn adapter_matcher() -> &'static AhoCorasick {
    static AC: OnceLock<AhoCorasick> = OnceLock::new();
    AC.get_or_init(|| {
        AhoCorasickBuilder::new()
            .ascii_case_insensitive(true)
            .build(ADAPTERS.iter().map(|(_, seq)| seq))
            .expect("adapter automaton")
    })
}

pub fn classify_source(seq: &[u8]) -> &'static str {
    if is_poly(seq, b'A') {
        return "Poly-A";
    }
    if is_poly(seq, b'T') {
        return "Poly-T";
    }
    match adapter_matcher().find(seq) {
        Some(m) => ADAPTERS[m.pattern().as_usize()].0,
        None => "No Hit",
    }
}

fn is_poly(seq: &[u8], base: u8) -> bool {
    seq.len() >= 20 && seq.iter().all(|&b| b.to_ascii_uppercase() == base)
}
