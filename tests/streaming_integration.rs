//! End-to-end runs over on-disk FASTQ files, plain and gzipped.

use flate2::Compression;
use flate2::write::GzEncoder;
use qckit_fastq::core::engine::{self, RunConfig};
use qckit_fastq::core::metrics::{
    DuplicateOptions, GcOptions, QualityOptions, analyze_quality_with,
};
use qckit_fastq::{
    EncodingChoice, EncodingScheme, FastqPath, MemorySource, QcError, analyze_gc,
    analyze_quality, count_duplicates, detect_encoding, report,
};
use std::fs;
use std::io::Write;

fn four_identical_records() -> Vec<u8> {
    b"@read\nACGT\n+\nIIII\n".repeat(4)
}

fn write_plain(data: &[u8]) -> tempfile::NamedTempFile {
    let mut tmp = tempfile::Builder::new().suffix(".fastq").tempfile().unwrap();
    tmp.write_all(data).unwrap();
    tmp.flush().unwrap();
    tmp
}

fn write_gzip(data: &[u8]) -> tempfile::NamedTempFile {
    let mut enc = GzEncoder::new(Vec::new(), Compression::default());
    enc.write_all(data).unwrap();
    let bytes = enc.finish().unwrap();
    let mut tmp = tempfile::Builder::new().suffix(".fq.gz").tempfile().unwrap();
    tmp.write_all(&bytes).unwrap();
    tmp.flush().unwrap();
    tmp
}

#[test]
fn constant_file_end_to_end() {
    let src = MemorySource::new(four_identical_records());

    let sanger = QualityOptions {
        encoding: EncodingChoice::Fixed(EncodingScheme::Sanger),
        ..QualityOptions::default()
    };
    let report = analyze_quality_with(&src, &sanger).unwrap();
    assert_eq!(report.encoding, EncodingScheme::Sanger);
    assert_eq!(report.per_read_mean, vec![40.0; 4]);
    for q in [
        &report.quantiles.q10,
        &report.quantiles.q25,
        &report.quantiles.q50,
        &report.quantiles.q75,
        &report.quantiles.q90,
    ] {
        assert_eq!(q, &vec![40; 4]);
    }

    // Left to detection, code 73 falls in the Illumina1.5 range.
    let detected = analyze_quality(&src).unwrap();
    assert_eq!(detected.encoding, EncodingScheme::Illumina15);
    assert_eq!(detected.per_read_mean, vec![9.0; 4]);

    assert_eq!(analyze_gc(src.lines()).unwrap(), vec![0.5; 4]);

    let counts = count_duplicates(src.lines(), 0, 1_000_000).unwrap();
    assert_eq!(counts.len(), 1);
    assert_eq!(counts[b"ACGT".as_slice()], 4);
}

#[test]
fn code_70_resolves_to_illumina15() {
    let src = MemorySource::new(b"@r\nACGT\n+\nFFFF\n".repeat(3));
    assert_eq!(
        detect_encoding(src.lines(), 100).unwrap(),
        EncodingScheme::Illumina15
    );
}

#[test]
fn plain_and_gzip_files_agree() {
    let mut data = Vec::new();
    for (i, (seq, qual)) in [("ACGTN", "II5#I"), ("GGGCC", "?????"), ("AT", "++")]
        .iter()
        .enumerate()
    {
        data.extend_from_slice(format!("@r{}\n{}\n+\n{}\n", i, seq, qual).as_bytes());
    }
    let plain_file = write_plain(&data);
    let plain = FastqPath::new(plain_file.path());
    let gz_file = write_gzip(&data);
    let gzip = FastqPath::new(gz_file.path());

    let a = analyze_quality(&plain).unwrap();
    let b = analyze_quality(&gzip).unwrap();
    assert_eq!(a.per_read_mean, b.per_read_mean);
    assert_eq!(a.per_position_mean, b.per_position_mean);
    assert_eq!(a.quantiles, b.quantiles);

    assert_eq!(
        analyze_gc(plain.open().unwrap()).unwrap(),
        analyze_gc(gzip.open().unwrap()).unwrap()
    );
    assert_eq!(
        count_duplicates(plain.open().unwrap(), 0, 4).unwrap(),
        count_duplicates(gzip.open().unwrap(), 0, 4).unwrap()
    );
}

#[test]
fn empty_file_is_empty_input() {
    let tmp = write_plain(b"");
    let src = FastqPath::new(tmp.path());
    assert!(matches!(analyze_quality(&src), Err(QcError::EmptyInput)));
    assert!(analyze_gc(src.open().unwrap()).unwrap().is_empty());
    assert!(count_duplicates(src.open().unwrap(), 5, 100).unwrap().is_empty());
}

#[test]
fn full_run_writes_report_bundle() {
    let tmp = write_plain(&four_identical_records());
    let out = tempfile::tempdir().unwrap();
    let output = engine::run(RunConfig {
        reads: tmp.path().to_path_buf(),
        threads: 3,
        quality: QualityOptions::default(),
        gc: GcOptions::default(),
        duplicates: DuplicateOptions {
            min_size: 0,
            ..DuplicateOptions::default()
        },
    })
    .unwrap();

    let dir = out.path().join("s_qc");
    fs::create_dir_all(&dir).unwrap();
    let mut written = report::qc_txt::write(&dir, &output).unwrap();
    let summary_path = dir.join(report::SUMMARY);
    report::summary_txt::write(&summary_path, &output).unwrap();
    written.push(summary_path);
    let archive = report::zip::bundle(&dir, &written).unwrap();

    for name in [
        report::QUALITY_PER_READ,
        report::QUALITY_PER_POSITION,
        report::GC_PER_READ,
        report::OVERREPRESENTED,
        report::SUMMARY,
    ] {
        assert!(dir.join(name).is_file(), "missing {}", name);
    }
    assert_eq!(archive, out.path().join("s_qc.zip"));
    assert!(archive.is_file());

    let summary = fs::read_to_string(dir.join(report::SUMMARY)).unwrap();
    assert!(summary.starts_with("PASS\tBasic Statistics\t"));
    // Every read is the same sequence.
    assert!(summary.contains("FAIL\tOverrepresented sequences\t"));
}
