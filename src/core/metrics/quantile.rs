use crate::core::model::{EncodingScheme, QuantileSummary};
use crate::error::{QcError, Result};

const CODE_BINS: usize = 256;

/// Multiset of raw quality codes seen at one read position.
#[derive(Clone, Debug)]
pub struct CodeHist {
    counts: Box<[u64; CODE_BINS]>,
    total: u64,
}

impl CodeHist {
    pub fn new() -> Self {
        Self {
            counts: Box::new([0u64; CODE_BINS]),
            total: 0,
        }
    }

    pub fn add(&mut self, code: u8) {
        self.counts[code as usize] += 1;
        self.total += 1;
    }

    pub fn len(&self) -> u64 {
        self.total
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    /// The `r`-th smallest code (0-based). Ranks past the end clamp to the
    /// largest observation.
    pub fn nth(&self, r: u64) -> Option<u8> {
        if self.total == 0 {
            return None;
        }
        let r = r.min(self.total - 1);
        let mut cum = 0u64;
        for (code, &c) in self.counts.iter().enumerate() {
            cum += c;
            if cum > r {
                return Some(code as u8);
            }
        }
        None
    }

    pub fn mean_score(&self, scheme: EncodingScheme) -> f64 {
        if self.total == 0 {
            return f64::NAN;
        }
        let sum: i64 = self
            .counts
            .iter()
            .enumerate()
            .map(|(code, &c)| scheme.score(code as u8) as i64 * c as i64)
            .sum();
        sum as f64 / self.total as f64
    }
}

impl Default for CodeHist {
    fn default() -> Self {
        Self::new()
    }
}

/// Quality observations keyed by position within a read. Index 0 holds
/// position 1. A position exists once any read reaches it.
#[derive(Clone, Debug, Default)]
pub struct PositionTable {
    columns: Vec<CodeHist>,
}

impl PositionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_read(&mut self, qual: &[u8]) {
        if self.columns.len() < qual.len() {
            self.columns.resize_with(qual.len(), CodeHist::new);
        }
        for (col, &c) in self.columns.iter_mut().zip(qual) {
            col.add(c);
        }
    }

    pub fn positions(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[CodeHist] {
        &self.columns
    }

    pub fn means(&self, scheme: EncodingScheme) -> Vec<f64> {
        self.columns.iter().map(|c| c.mean_score(scheme)).collect()
    }

    pub fn quantiles(&self, scheme: EncodingScheme) -> QuantileSummary {
        let mut out = QuantileSummary::with_capacity(self.columns.len());
        for col in &self.columns {
            let ranks = rank_indices(col.len());
            let mut q = [0i32; 5];
            for (slot, &r) in q.iter_mut().zip(ranks.iter()) {
                // Columns are created by their first observation.
                *slot = col.nth(r).map(|c| scheme.score(c)).unwrap_or_default();
            }
            out.push(q);
        }
        out
    }
}

/// Q10/Q25/Q50/Q75/Q90 ranks for `n` values. Q75 is `Q25 + Q50`; callers
/// clamp every rank to `n - 1`.
pub fn rank_indices(n: u64) -> [u64; 5] {
    let q10 = (n as f64 * 0.1) as u64;
    let q25 = (n + 1) / 4;
    let q50 = (n + 1) / 2;
    let q75 = q25 + q50;
    let q90 = (n as f64 * 0.9) as u64;
    [q10, q25, q50, q75, q90]
}

/// Five-rank selection over an explicit collection using linear-time
/// selection. Reorders `values`.
pub fn select_quantiles(values: &mut [i32]) -> Option<[i32; 5]> {
    if values.is_empty() {
        return None;
    }
    let last = values.len() as u64 - 1;
    let mut q = [0i32; 5];
    for (slot, r) in q.iter_mut().zip(rank_indices(values.len() as u64)) {
        let (_, nth, _) = values.select_nth_unstable(r.min(last) as usize);
        *slot = *nth;
    }
    Some(q)
}

/// Position aggregator over explicit per-position collections.
pub fn summarize_collections(table: &mut [Vec<i32>]) -> Result<QuantileSummary> {
    let mut out = QuantileSummary::with_capacity(table.len());
    for (i, values) in table.iter_mut().enumerate() {
        let q = select_quantiles(values).ok_or_else(|| {
            QcError::InvalidParameter(format!("position {} has no observations", i + 1))
        })?;
        out.push(q);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn rank_indices_for_small_columns() {
        assert_eq!(rank_indices(1), [0, 0, 1, 1, 0]);
        assert_eq!(rank_indices(4), [0, 1, 2, 3, 3]);
        assert_eq!(rank_indices(10), [1, 2, 5, 7, 9]);
        assert_eq!(rank_indices(100), [10, 25, 50, 75, 90]);
    }

    #[test]
    fn single_observation_gives_constant_quantiles() {
        let mut table = PositionTable::new();
        table.add_read(b"I");
        let q = table.quantiles(EncodingScheme::Sanger);
        assert_eq!(q.q10, vec![40]);
        assert_eq!(q.q25, vec![40]);
        assert_eq!(q.q50, vec![40]);
        assert_eq!(q.q75, vec![40]);
        assert_eq!(q.q90, vec![40]);
        assert_eq!(select_quantiles(&mut [7]), Some([7; 5]));
    }

    #[test]
    fn q75_overshoot_clamps_to_max() {
        // n = 3: Q25 = 1, Q50 = 2, Q75 = 3 which is past the end.
        let mut values = vec![30, 10, 20];
        assert_eq!(select_quantiles(&mut values), Some([10, 20, 30, 30, 30]));
    }

    #[test]
    fn longer_reads_extend_the_table() {
        let mut table = PositionTable::new();
        table.add_read(b"II");
        table.add_read(b"5555");
        assert_eq!(table.positions(), 4);
        assert_eq!(table.columns()[0].len(), 2);
        assert_eq!(table.columns()[3].len(), 1);
        let means = table.means(EncodingScheme::Sanger);
        assert_eq!(means, vec![30.0, 30.0, 20.0, 20.0]);
    }

    #[test]
    fn explicit_collections_reject_empty_positions() {
        let mut table = vec![vec![1, 2], Vec::new()];
        assert!(summarize_collections(&mut table).is_err());
    }

    proptest! {
        #[test]
        fn histogram_matches_selection(
            columns in prop::collection::vec(prop::collection::vec(33u8..127, 1..60), 1..8)
        ) {
            let mut table = PositionTable::new();
            let width = columns.iter().map(Vec::len).max().unwrap_or(0);
            let mut explicit: Vec<Vec<i32>> = vec![Vec::new(); width];
            for read in &columns {
                table.add_read(read);
                for (i, &c) in read.iter().enumerate() {
                    explicit[i].push(EncodingScheme::Sanger.score(c));
                }
            }
            let from_hist = table.quantiles(EncodingScheme::Sanger);
            let from_select = summarize_collections(&mut explicit).unwrap();
            prop_assert_eq!(from_hist, from_select);
        }

        #[test]
        fn selection_matches_sorting(mut values in prop::collection::vec(-10i32..100, 1..200)) {
            let mut sorted = values.clone();
            sorted.sort_unstable();
            let last = sorted.len() as u64 - 1;
            let expected: Vec<i32> = rank_indices(sorted.len() as u64)
                .iter()
                .map(|&r| sorted[r.min(last) as usize])
                .collect();
            let got = select_quantiles(&mut values).unwrap();
            prop_assert_eq!(got.to_vec(), expected);
        }
    }
}
