use crate::core::engine::RunOutput;
use crate::core::metrics::overrepresented_rows;
use crate::core::model::Status;
use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Statuses {
    pub basic: Status,
    pub per_base_qual: Status,
    pub per_seq_qual: Status,
    pub overrepresented: Status,
}

pub fn statuses(output: &RunOutput) -> Statuses {
    let mut per_base_qual = Status::Pass;
    for &median in &output.quality.quantiles.q50 {
        if median < 20 {
            per_base_qual = Status::Fail;
            break;
        }
        if median < 25 {
            per_base_qual = Status::Warn;
        }
    }

    let means = &output.quality.per_read_mean;
    let scored = means.iter().filter(|m| !m.is_nan()).count();
    let low = means.iter().filter(|&&m| m < 20.0).count();
    let per_seq_qual = if scored == 0 {
        Status::Pass
    } else {
        let pct = low as f64 * 100.0 / scored as f64;
        if pct > 20.0 {
            Status::Fail
        } else if pct > 10.0 {
            Status::Warn
        } else {
            Status::Pass
        }
    };

    let top = overrepresented_rows(&output.duplicates, output.gc.len() as u64)
        .first()
        .map(|row| row.percent)
        .unwrap_or(0.0);
    let overrepresented = if top > 1.0 {
        Status::Fail
    } else if top > 0.1 {
        Status::Warn
    } else {
        Status::Pass
    };

    Statuses {
        basic: Status::Pass,
        per_base_qual,
        per_seq_qual,
        overrepresented,
    }
}

pub fn write(path: &Path, output: &RunOutput) -> Result<()> {
    let st = statuses(output);
    let mut w = BufWriter::new(File::create(path).with_context(|| "create summary.txt failed")?);
    let file = &output.file_name;

    writeln!(w, "{}\tBasic Statistics\t{}", st.basic.as_str_upper(), file)?;
    writeln!(
        w,
        "{}\tPer base sequence quality\t{}",
        st.per_base_qual.as_str_upper(),
        file
    )?;
    writeln!(
        w,
        "{}\tPer sequence quality scores\t{}",
        st.per_seq_qual.as_str_upper(),
        file
    )?;
    writeln!(
        w,
        "{}\tOverrepresented sequences\t{}",
        st.overrepresented.as_str_upper(),
        file
    )?;
    w.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::metrics::SequenceCounts;
    use crate::core::model::{EncodingScheme, QualityReport, QuantileSummary};

    fn output(q50: &[i32], per_read: Vec<f64>, top_count: u64, reads: usize) -> RunOutput {
        let mut quantiles = QuantileSummary::default();
        for &m in q50 {
            quantiles.push([m; 5]);
        }
        let mut duplicates = SequenceCounts::new();
        if top_count > 0 {
            duplicates.insert(b"ACGT".as_slice().into(), top_count);
        }
        RunOutput {
            file_name: "x.fq".to_string(),
            quality: QualityReport {
                encoding: EncodingScheme::Sanger,
                per_position_mean: vec![0.0; q50.len()],
                per_read_mean: per_read,
                quantiles,
                skipped_records: 0,
            },
            gc: vec![0.5; reads],
            duplicates,
        }
    }

    #[test]
    fn clean_run_passes() {
        let st = statuses(&output(&[38, 36], vec![38.0; 10], 0, 10_000));
        assert_eq!(st.per_base_qual, Status::Pass);
        assert_eq!(st.per_seq_qual, Status::Pass);
        assert_eq!(st.overrepresented, Status::Pass);
    }

    #[test]
    fn low_medians_warn_then_fail() {
        assert_eq!(
            statuses(&output(&[38, 22], vec![38.0], 0, 1)).per_base_qual,
            Status::Warn
        );
        assert_eq!(
            statuses(&output(&[22, 15], vec![38.0], 0, 1)).per_base_qual,
            Status::Fail
        );
    }

    #[test]
    fn low_quality_reads_and_duplicates() {
        let mut per_read = vec![38.0; 7];
        per_read.extend([10.0, 10.0, 10.0]);
        let st = statuses(&output(&[38], per_read, 5, 1000));
        assert_eq!(st.per_seq_qual, Status::Fail);
        assert_eq!(st.overrepresented, Status::Warn);
        assert_eq!(
            statuses(&output(&[38], vec![38.0], 50, 1000)).overrepresented,
            Status::Fail
        );
    }
}
