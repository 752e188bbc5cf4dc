#![forbid(unsafe_code)]

use anyhow::Context;
use clap::{Parser, Subcommand};
use quilt_core::app::{Aggregator, JobGraph, ReportBuilder};
use quilt_core::domain::{JobSpec, MergeInstruction, Report, TaskKind};
use quilt_core::ProducerConfig;
use std::env;
use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "quilt: fold a job's task output into one report",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        about = "Walk a job file and print its report",
        after_help = "EXAMPLES:\n    quilt report job.json --pretty\n    quilt report job.json --config producers.json"
    )]
    Report {
        /// Job file: {\"tasks\": [...], \"event\": {...}}.
        job: PathBuf,

        /// Producer URL settings (JSON).
        #[arg(long)]
        config: Option<PathBuf>,

        /// Pretty-print the report.
        #[arg(long)]
        pretty: bool,
    },

    #[command(
        about = "Replay merge instructions (one JSON object per line)",
        after_help = "EXAMPLES:\n    quilt fold instructions.jsonl"
    )]
    Fold {
        instructions: PathBuf,

        /// Pretty-print the report.
        #[arg(long)]
        pretty: bool,
    },
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("QUILT_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose {
            "quilt=debug,info"
        } else {
            "quilt=info,warn"
        })
    });

    let format = env::var("QUILT_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    // stdout carries the report only
    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<ProducerConfig> {
    let Some(path) = path else {
        return Ok(ProducerConfig::default());
    };
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("invalid config {}", path.display()))
}

fn run_report(job: &Path, config: Option<&Path>) -> anyhow::Result<Report> {
    let config = load_config(config)?;
    let raw =
        fs::read_to_string(job).with_context(|| format!("failed to read job {}", job.display()))?;
    let spec: JobSpec =
        serde_json::from_str(&raw).with_context(|| format!("invalid job file {}", job.display()))?;
    let event = spec.event.clone();

    let graph = JobGraph::from_spec(spec).context("invalid job graph")?;
    let router = ReportBuilder::reference(&config)
        .expect_kinds(&TaskKind::ALL)
        .build()?;

    info!(
        tasks = graph.len(),
        event = %event.kind,
        target_task = event.target_task.as_ref().map(|t| t.as_str()).unwrap_or("-"),
        "walking job"
    );
    let report = router.report(&graph, &event)?;
    Ok(report)
}

fn run_fold(instructions: &Path) -> anyhow::Result<Report> {
    let file = fs::File::open(instructions)
        .with_context(|| format!("failed to open {}", instructions.display()))?;
    let mut aggregator = Aggregator::new();

    for (number, line) in BufReader::new(file).lines().enumerate() {
        let line = line.with_context(|| format!("failed to read {}", instructions.display()))?;
        if line.trim().is_empty() {
            continue;
        }
        let instruction: MergeInstruction = serde_json::from_str(&line)
            .with_context(|| format!("line {}: invalid merge instruction", number + 1))?;
        aggregator
            .apply(instruction)
            .with_context(|| format!("line {}: instruction rejected", number + 1))?;
    }

    info!(folded = aggregator.folded(), states = aggregator.state_count(), "replay finished");
    Ok(aggregator.finish())
}

fn print_report(report: &Report, pretty: bool) -> anyhow::Result<()> {
    let rendered = if pretty {
        serde_json::to_string_pretty(report)?
    } else {
        serde_json::to_string(report)?
    };
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{rendered}")?;
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Report {
            job,
            config,
            pretty,
        } => {
            let report = run_report(&job, config.as_deref())?;
            print_report(&report, pretty)
        }
        Commands::Fold {
            instructions,
            pretty,
        } => {
            let report = run_fold(&instructions)?;
            print_report(&report, pretty)
        }
    }
}
