use crate::core::io::FastqPath;
use crate::core::metrics::{
    DuplicateOptions, GcOptions, LineIntervalPrune, QualityOptions, SequenceCounts,
    analyze_gc_with, analyze_quality_with, count_duplicates_with,
};
use crate::core::model::QualityReport;
use anyhow::{Context, Result, anyhow, bail};
use crossbeam_channel as channel;
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};

const PARALLEL_PASSES: usize = 3;

#[derive(Clone, Debug)]
pub struct RunConfig {
    pub reads: PathBuf,
    pub threads: usize,
    pub quality: QualityOptions,
    pub gc: GcOptions,
    pub duplicates: DuplicateOptions,
}

pub struct RunOutput {
    pub file_name: String,
    pub quality: QualityReport,
    pub gc: Vec<f64>,
    pub duplicates: SequenceCounts,
}

enum PassOutput {
    Quality(QualityReport),
    Gc(Vec<f64>),
    Duplicates(SequenceCounts),
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Pass {
    Quality,
    Gc,
    Duplicates,
}

impl Pass {
    const ALL: [Pass; 3] = [Pass::Quality, Pass::Gc, Pass::Duplicates];

    fn name(self) -> &'static str {
        match self {
            Pass::Quality => "quality",
            Pass::Gc => "gc",
            Pass::Duplicates => "duplicates",
        }
    }
}

/// Runs the quality, GC and duplicate-sequence passes over one file. Every
/// pass opens its own stream; nothing is shared between them.
pub fn run(cfg: RunConfig) -> Result<RunOutput> {
    let stats = stats_enabled();
    let t_total = Instant::now();
    if cfg.threads == 0 {
        bail!("threads must be >= 1");
    }
    // Fail before any pass if the duplicate parameters are unusable.
    LineIntervalPrune::new(cfg.duplicates.min_size, cfg.duplicates.buffer_size)?;

    let file_name = cfg
        .reads
        .file_name()
        .and_then(|s| s.to_str())
        .map(|s| s.to_string())
        .context("failed to determine input filename")?;

    let parallel = cfg.threads >= PARALLEL_PASSES;
    let io_threads = if parallel {
        (cfg.threads / PARALLEL_PASSES).max(1)
    } else {
        cfg.threads
    };
    let source = FastqPath::new(&cfg.reads).with_threads(io_threads);
    log::debug!(
        "running {} passes over {} ({} io thread(s) each)",
        if parallel { "parallel" } else { "sequential" },
        cfg.reads.display(),
        io_threads
    );

    let mut quality = None;
    let mut gc = None;
    let mut duplicates = None;

    if parallel {
        let (tx, rx) = channel::bounded::<(Pass, Result<PassOutput>)>(PARALLEL_PASSES);
        let mut workers = Vec::with_capacity(PARALLEL_PASSES);
        for pass in Pass::ALL {
            let tx = tx.clone();
            let source = source.clone();
            let cfg = cfg.clone();
            workers.push(thread::spawn(move || {
                let t = Instant::now();
                let res = run_pass(pass, &source, &cfg);
                log_stage(stats, pass.name(), t);
                let _ = tx.send((pass, res));
            }));
        }
        drop(tx);

        // Drain every pass and join every worker before reporting a failure.
        let mut first_err = None;
        for (pass, res) in rx.iter() {
            match res {
                Ok(out) => store(out, &mut quality, &mut gc, &mut duplicates),
                Err(e) => {
                    log::debug!("{} pass failed: {:#}", pass.name(), e);
                    if first_err.is_none() {
                        first_err = Some(e.context(format!("{} pass failed", pass.name())));
                    }
                }
            }
        }
        let mut panicked = false;
        for worker in workers {
            panicked |= worker.join().is_err();
        }
        if let Some(e) = first_err {
            return Err(e);
        }
        if panicked {
            return Err(anyhow!("pass worker panicked"));
        }
    } else {
        for pass in Pass::ALL {
            let t = Instant::now();
            let out = run_pass(pass, &source, &cfg)
                .with_context(|| format!("{} pass failed", pass.name()))?;
            log_stage(stats, pass.name(), t);
            store(out, &mut quality, &mut gc, &mut duplicates);
        }
    }
    log_stage(stats, "engine.total", t_total);

    Ok(RunOutput {
        file_name,
        quality: quality.context("quality pass produced no result")?,
        gc: gc.context("gc pass produced no result")?,
        duplicates: duplicates.context("duplicate pass produced no result")?,
    })
}

fn run_pass(pass: Pass, source: &FastqPath, cfg: &RunConfig) -> Result<PassOutput> {
    let out = match pass {
        Pass::Quality => PassOutput::Quality(analyze_quality_with(source, &cfg.quality)?),
        Pass::Gc => PassOutput::Gc(analyze_gc_with(source.open()?, &cfg.gc)?),
        Pass::Duplicates => {
            let policy =
                LineIntervalPrune::new(cfg.duplicates.min_size, cfg.duplicates.buffer_size)?;
            let counter =
                count_duplicates_with(source.open()?, &policy, cfg.duplicates.error_policy)?;
            PassOutput::Duplicates(counter.into_counts())
        }
    };
    Ok(out)
}

fn store(
    out: PassOutput,
    quality: &mut Option<QualityReport>,
    gc: &mut Option<Vec<f64>>,
    duplicates: &mut Option<SequenceCounts>,
) {
    match out {
        PassOutput::Quality(q) => *quality = Some(q),
        PassOutput::Gc(g) => *gc = Some(g),
        PassOutput::Duplicates(d) => *duplicates = Some(d),
    }
}

pub fn stats_enabled() -> bool {
    matches!(std::env::var("QCKIT_STATS").as_deref(), Ok("1"))
}

pub fn log_stage(stats: bool, name: &str, t: Instant) {
    if stats {
        log::info!("QCKIT_STATS stage={} time={}", name, fmt_dur(t.elapsed()));
    }
}

pub fn fmt_dur(d: Duration) -> String {
    if d.as_secs_f64() < 1.0 {
        format!("{}ms", d.as_millis())
    } else {
        format!("{:.3}s", d.as_secs_f64())
    }
}
