use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use qckit_fastq::core::metrics::{DEFAULT_BUFFER_SIZE, DEFAULT_MIN_SIZE, DEFAULT_SAMPLE_READS};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "qckit-fastq",
    version,
    about = "Streaming single-pass QC for plain or gzipped FASTQ"
)]
pub struct Cli {
    /// Raise log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run every analysis and write a report directory.
    Run(RunArgs),
    /// Print the detected quality encoding.
    Format(FormatArgs),
}

#[derive(Parser)]
pub struct RunArgs {
    pub reads: PathBuf,

    #[arg(long)]
    pub out: PathBuf,

    #[arg(long, default_value_t = num_cpus::get())]
    pub threads: usize,

    #[arg(long)]
    pub sample_name: Option<String>,

    #[arg(long, value_enum, default_value_t = EncodingArg::Auto)]
    pub encoding: EncodingArg,

    /// Records sampled for encoding detection.
    #[arg(long, default_value_t = DEFAULT_SAMPLE_READS)]
    pub sample_reads: usize,

    /// Sequences seen at most this often are evicted on each prune.
    #[arg(long, default_value_t = DEFAULT_MIN_SIZE)]
    pub min_size: u64,

    /// Prune the duplicate table every N input lines.
    #[arg(long, default_value_t = DEFAULT_BUFFER_SIZE)]
    pub buffer_size: u64,

    #[arg(long, default_value_t = false)]
    pub skip_malformed: bool,

    /// Handling of reads with nothing to average over. Defaults to NaN for
    /// quality means and an error for GC.
    #[arg(long, value_enum)]
    pub empty_reads: Option<EmptyReadsArg>,

    #[arg(long, default_value_t = false)]
    pub no_zip: bool,
}

#[derive(Parser)]
pub struct FormatArgs {
    pub reads: PathBuf,

    #[arg(long, default_value_t = DEFAULT_SAMPLE_READS)]
    pub reads_used: usize,

    #[arg(long, default_value_t = false)]
    pub skip_malformed: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum EncodingArg {
    #[value(name = "auto")]
    Auto,
    #[value(name = "sanger")]
    Sanger,
    #[value(name = "solexa")]
    Solexa,
    #[value(name = "illumina1.3")]
    Illumina13,
    #[value(name = "illumina1.5")]
    Illumina15,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum EmptyReadsArg {
    #[value(name = "fail")]
    Fail,
    #[value(name = "nan")]
    Nan,
}
