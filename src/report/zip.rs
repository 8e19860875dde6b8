use anyhow::{Context, Result, bail};
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter};
use std::path::{Path, PathBuf};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

/// Packs `files` into `<report_dir>.zip`, each stored under
/// `<report_dir name>/<file name>`. Returns the archive path.
pub fn bundle(report_dir: &Path, files: &[PathBuf]) -> Result<PathBuf> {
    let root = report_dir
        .file_name()
        .and_then(|s| s.to_str())
        .with_context(|| format!("report dir {} has no usable name", report_dir.display()))?;
    let archive = sibling_with_suffix(report_dir, ".zip");
    let partial = sibling_with_suffix(report_dir, ".zip.partial");

    let written = File::create(&partial)
        .with_context(|| format!("failed to create {}", partial.display()))
        .and_then(|file| pack(BufWriter::new(file), root, files));
    if let Err(e) = written {
        let _ = fs::remove_file(&partial);
        return Err(e);
    }
    fs::rename(&partial, &archive)
        .with_context(|| format!("failed to move zip to {}", archive.display()))?;
    log::debug!("bundled {} file(s) into {}", files.len(), archive.display());
    Ok(archive)
}

fn sibling_with_suffix(dir: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(dir.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

fn pack(sink: BufWriter<File>, root: &str, files: &[PathBuf]) -> Result<()> {
    // Identical inputs give byte-identical archives.
    let stamp = DateTime::from_date_and_time(1980, 1, 1, 0, 0, 0)
        .map_err(|e| anyhow::anyhow!("invalid zip timestamp: {e:?}"))?;
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(stamp);

    let mut zip = ZipWriter::new(sink);
    for path in files {
        let Some(name) = path.file_name().and_then(|s| s.to_str()) else {
            bail!("cannot bundle {}: no file name", path.display());
        };
        let mut src = BufReader::new(
            File::open(path).with_context(|| format!("failed to open {}", path.display()))?,
        );
        zip.start_file(format!("{}/{}", root, name), options)
            .with_context(|| format!("failed to add {} to zip", name))?;
        io::copy(&mut src, &mut zip).with_context(|| format!("failed to compress {}", name))?;
    }
    let mut sink = zip.finish().context("failed to finalize zip")?;
    io::Write::flush(&mut sink)?;
    Ok(())
}
