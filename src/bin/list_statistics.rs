//! Compute mean and standard deviation of a seeded random list with threads
//!
//! ```text
//! $ list-statistics 1000000 9
//! Threads = 9, mean = <mean>, standard_deviation = <std dev>, time (sec) = <seconds>
//! ```
//!
//! Usage errors print a message and, unless `--strict-exit` is given, still
//! exit with status 0.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use phased_core::{Error, ReductionConfig, Sequence, SequenceSource};
use phased_reduce::{reference, LoggingHandler, Orchestrator};
use std::ffi::OsString;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, Level};
use tracing_subscriber::EnvFilter;

const USAGE_EXIT: u8 = 2;
const FAILURE_EXIT: u8 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Generator {
    /// srand48/lrand48, matching C library output
    Lrand48,
    /// rand's StdRng seeded from the seed value
    StdRng,
}

#[derive(Parser, Debug)]
#[command(name = "list-statistics", version)]
#[command(about = "Mean and standard deviation of a random list using a two-phase thread barrier")]
struct Args {
    /// Number of values in the list
    list_size: usize,

    /// Number of worker threads
    num_threads: usize,

    /// Seed for the value generator
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Value generator
    #[arg(long, value_enum, default_value_t = Generator::Lrand48)]
    generator: Generator,

    /// JSON file overriding the default limits
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log each protocol step
    #[arg(short, long)]
    verbose: bool,

    /// Exit with a non-zero status on usage errors
    #[arg(long)]
    strict_exit: bool,
}

fn main() -> ExitCode {
    let stdout = io::stdout();
    ExitCode::from(execute(std::env::args_os(), &mut stdout.lock()))
}

/// Parse `argv`, run the reduction and return the process exit status
///
/// Everything the reference program prints goes to `out`. Diagnostics go
/// to stderr.
fn execute<I, T>(argv: I, out: &mut impl Write) -> u8
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let argv: Vec<OsString> = argv.into_iter().map(Into::into).collect();
    let args = match Args::try_parse_from(&argv) {
        Ok(args) => args,
        Err(e) => {
            if matches!(
                e.kind(),
                clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion
            ) {
                e.exit();
            }
            let _ = writeln!(out, "Need two integers as input ");
            let _ = writeln!(out, "Use: <executable_name> <list_size> <num_threads>");
            eprintln!("{e}");
            let strict = argv.iter().any(|arg| arg == "--strict-exit");
            return usage_exit(strict);
        }
    };

    init_logging(args.verbose);

    match run(&args, out) {
        Ok(()) => 0,
        Err(e) => match e.downcast_ref::<Error>() {
            Some(err) if err.is_usage_error() => {
                let _ = writeln!(out, "{}", usage_message(err));
                usage_exit(args.strict_exit)
            }
            _ => {
                eprintln!("error: {e:#}");
                FAILURE_EXIT
            }
        },
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    // A subscriber may already be installed when running in-process
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with_writer(io::stderr)
        .try_init();
}

fn run(args: &Args, out: &mut impl Write) -> Result<()> {
    let config = match &args.config {
        Some(path) => ReductionConfig::from_json_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => ReductionConfig::default(),
    };
    config.validate(args.list_size, args.num_threads)?;

    let source = match args.generator {
        Generator::Lrand48 => SequenceSource::Lrand48 { seed: args.seed },
        Generator::StdRng => SequenceSource::StdRng { seed: args.seed },
    };
    let seq = Sequence::generate(args.list_size, source)?;
    let expected = reference::serial(&seq)?;
    debug!(mean = expected.mean, std_dev = expected.std_dev, "serial reference");

    let mut orchestrator = Orchestrator::new(config);
    if args.verbose {
        orchestrator = orchestrator.with_handler(Arc::new(LoggingHandler::new(Level::DEBUG)));
    }

    let start = Instant::now();
    let summary = orchestrator.run(&seq, args.num_threads)?;
    let elapsed = start.elapsed().as_secs_f64();
    info!(workers = summary.workers, elapsed, "reduction finished");

    // Summation order differs from the serial pass; compare integer parts only
    if !summary.mean_agrees_floored(&expected) {
        writeln!(out, "Incorrect mean")?;
    }
    if !summary.std_dev_agrees_floored(&expected) {
        writeln!(out, "Incorrect standard deviation")?;
    }
    writeln!(
        out,
        "Threads = {}, mean = {:.6}, standard_deviation = {:.6}, time (sec) = {:8.4}",
        args.num_threads, summary.mean, summary.std_dev, elapsed
    )?;
    Ok(())
}

fn usage_message(err: &Error) -> String {
    match err {
        Error::SequenceTooLong { max, .. } => format!("Maximum list size allowed: {max}."),
        Error::TooManyThreads { max, .. } => format!("Maximum number of threads allowed: {max}."),
        Error::ThreadsExceedLength { threads, len } => {
            format!("Number of threads ({threads}) < list_size ({len}) not allowed.")
        }
        other => other.to_string(),
    }
}

fn usage_exit(strict: bool) -> u8 {
    if strict {
        USAGE_EXIT
    } else {
        0
    }
}
