use crate::core::engine::RunOutput;
use crate::core::metrics::overrepresented_rows;
use crate::report::{GC_PER_READ, OVERREPRESENTED, QUALITY_PER_POSITION, QUALITY_PER_READ};
use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Writes the four data tables into `dir` and returns their paths.
pub fn write(dir: &Path, output: &RunOutput) -> Result<Vec<PathBuf>> {
    let tables = vec![
        write_table(dir.join(QUALITY_PER_READ), |w| {
            write_per_read_quality(w, output)
        })?,
        write_table(dir.join(QUALITY_PER_POSITION), |w| {
            write_per_position_quality(w, output)
        })?,
        write_table(dir.join(GC_PER_READ), |w| write_gc(w, output))?,
        write_table(dir.join(OVERREPRESENTED), |w| write_overrep(w, output))?,
    ];
    Ok(tables)
}

fn write_table<F>(path: PathBuf, body: F) -> Result<PathBuf>
where
    F: FnOnce(&mut dyn Write) -> Result<()>,
{
    let file =
        File::create(&path).with_context(|| format!("failed to create {}", path.display()))?;
    let mut w = BufWriter::new(file);
    body(&mut w).with_context(|| format!("failed to write {}", path.display()))?;
    w.flush()
        .with_context(|| format!("failed to flush {}", path.display()))?;
    Ok(path)
}

fn write_per_read_quality(w: &mut dyn Write, output: &RunOutput) -> Result<()> {
    writeln!(w, "#Encoding\t{}", output.quality.encoding)?;
    writeln!(w, "#Read\tMean")?;
    for (i, mean) in output.quality.per_read_mean.iter().enumerate() {
        writeln!(w, "{}\t{:.3}", i + 1, mean)?;
    }
    Ok(())
}

fn write_per_position_quality(w: &mut dyn Write, output: &RunOutput) -> Result<()> {
    let q = &output.quality.quantiles;
    writeln!(w, "#Base\tMean\tQ10\tQ25\tQ50\tQ75\tQ90")?;
    for (i, mean) in output.quality.per_position_mean.iter().enumerate() {
        writeln!(
            w,
            "{}\t{:.3}\t{}\t{}\t{}\t{}\t{}",
            i + 1,
            mean,
            q.q10[i],
            q.q25[i],
            q.q50[i],
            q.q75[i],
            q.q90[i]
        )?;
    }
    Ok(())
}

fn write_gc(w: &mut dyn Write, output: &RunOutput) -> Result<()> {
    writeln!(w, "#Read\tGC")?;
    for (i, gc) in output.gc.iter().enumerate() {
        writeln!(w, "{}\t{:.4}", i + 1, gc)?;
    }
    Ok(())
}

fn write_overrep(w: &mut dyn Write, output: &RunOutput) -> Result<()> {
    let rows = overrepresented_rows(&output.duplicates, output.gc.len() as u64);
    writeln!(w, "#Sequence\tCount\tPercentage\tPossible Source")?;
    for row in rows {
        writeln!(
            w,
            "{}\t{}\t{:.4}\t{}",
            row.sequence, row.count, row.percent, row.source
        )?;
    }
    Ok(())
}
