use crate::cli::args::{Cli, Commands, EmptyReadsArg, EncodingArg, FormatArgs, RunArgs};
use anyhow::{Context, Result, bail};
use clap::Parser;
use qckit_fastq::core::engine::{self, RunConfig, log_stage, stats_enabled};
use qckit_fastq::core::io::FastqPath;
use qckit_fastq::core::metrics::{
    DuplicateOptions, GcOptions, QualityOptions, classify, scan_qual_range,
};
use qckit_fastq::core::model::{EmptyReadPolicy, EncodingChoice, EncodingScheme};
use qckit_fastq::report;
use qckit_fastq::ErrorPolicy;
use std::fs;
use std::time::Instant;

pub fn entry() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    match cli.command {
        Commands::Run(args) => run(args),
        Commands::Format(args) => format(args),
    }
}

fn init_logging(verbose: u8) {
    let mut level = match verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    if stats_enabled() && level < log::LevelFilter::Info {
        level = log::LevelFilter::Info;
    }
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .format_timestamp(None)
        .format_target(false)
        .init();
}

fn error_policy(skip_malformed: bool) -> ErrorPolicy {
    if skip_malformed {
        ErrorPolicy::Skip
    } else {
        ErrorPolicy::Fail
    }
}

fn run(args: RunArgs) -> Result<()> {
    let stats = stats_enabled();
    let t0 = Instant::now();

    let t_pre = Instant::now();
    if args.reads.as_os_str() == "-" {
        bail!("stdin is not supported; provide a FASTQ file path");
    }
    if !args.reads.is_file() {
        bail!("input file not found: {}", args.reads.display());
    }
    if args.threads == 0 {
        bail!("--threads must be >= 1");
    }
    log_stage(stats, "preflight", t_pre);

    let sample_name = match args.sample_name {
        Some(s) => s,
        None => sample_name_from(&args.reads)?,
    };

    let out_dir = args.out.join(format!("{}_qc", sample_name));
    fs::create_dir_all(&out_dir)
        .with_context(|| format!("failed to create output dir {}", out_dir.display()))?;

    let policy = error_policy(args.skip_malformed);
    let empty_read = args.empty_reads.map(|arg| match arg {
        EmptyReadsArg::Fail => EmptyReadPolicy::Fail,
        EmptyReadsArg::Nan => EmptyReadPolicy::Nan,
    });
    let quality_defaults = QualityOptions::default();
    let gc_defaults = GcOptions::default();
    let encoding = match args.encoding {
        EncodingArg::Auto => EncodingChoice::Auto,
        EncodingArg::Sanger => EncodingChoice::Fixed(EncodingScheme::Sanger),
        EncodingArg::Solexa => EncodingChoice::Fixed(EncodingScheme::Solexa),
        EncodingArg::Illumina13 => EncodingChoice::Fixed(EncodingScheme::Illumina13),
        EncodingArg::Illumina15 => EncodingChoice::Fixed(EncodingScheme::Illumina15),
    };

    let config = RunConfig {
        reads: args.reads.clone(),
        threads: args.threads,
        quality: QualityOptions {
            sample_size: args.sample_reads,
            encoding,
            error_policy: policy,
            empty_read: empty_read.unwrap_or(quality_defaults.empty_read),
        },
        gc: GcOptions {
            error_policy: policy,
            empty_read: empty_read.unwrap_or(gc_defaults.empty_read),
        },
        duplicates: DuplicateOptions {
            min_size: args.min_size,
            buffer_size: args.buffer_size,
            error_policy: policy,
        },
    };

    let t_engine = Instant::now();
    let output = engine::run(config)?;
    log_stage(stats, "engine", t_engine);
    log::info!(
        "{}: {} read(s), encoding {}, {} position(s), {} retained sequence(s)",
        output.file_name,
        output.quality.per_read_mean.len(),
        output.quality.encoding,
        output.quality.per_position_mean.len(),
        output.duplicates.len()
    );
    if output.quality.skipped_records > 0 {
        log::warn!(
            "{} malformed record(s) skipped",
            output.quality.skipped_records
        );
    }

    let t_tables = Instant::now();
    let mut written = report::qc_txt::write(&out_dir, &output)?;
    log_stage(stats, "tables", t_tables);

    let t_summary = Instant::now();
    let summary_path = out_dir.join(report::SUMMARY);
    report::summary_txt::write(&summary_path, &output)
        .with_context(|| format!("failed to write {}", summary_path.display()))?;
    written.insert(0, summary_path);
    log_stage(stats, "summary", t_summary);

    if !args.no_zip {
        let t_zip = Instant::now();
        let archive =
            report::zip::bundle(&out_dir, &written).context("failed to create zip output")?;
        log::info!("wrote {}", archive.display());
        log_stage(stats, "zip", t_zip);
    }

    if stats {
        log::info!("QCKIT_STATS output_dir={}", out_dir.display());
    }
    log_stage(stats, "total", t0);
    Ok(())
}

fn format(args: FormatArgs) -> Result<()> {
    if !args.reads.is_file() {
        bail!("input file not found: {}", args.reads.display());
    }
    let source = FastqPath::new(&args.reads);
    let range = scan_qual_range(
        source.open()?,
        args.reads_used,
        error_policy(args.skip_malformed),
    )
    .with_context(|| format!("failed to sample {}", args.reads.display()))?;
    let scheme = classify(range.min, range.max)?;
    log::info!(
        "quality codes {}..={} over {} record(s)",
        range.min,
        range.max,
        range.records
    );
    println!("{}", scheme);
    Ok(())
}

fn sample_name_from(path: &std::path::Path) -> Result<String> {
    let name = path
        .file_name()
        .and_then(|s| s.to_str())
        .context("failed to determine sample name from input file")?;
    let mut stem = name;
    for ext in [".gz", ".fastq", ".fq"] {
        if let Some(s) = stem.strip_suffix(ext) {
            stem = s;
        }
    }
    if stem.is_empty() {
        bail!("failed to determine sample name from {}", path.display());
    }
    Ok(stem.to_string())
}
