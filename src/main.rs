//! Race check: repeatedly races one creator thread against many readers on a freshly
//! built `GuardedAggregate` and logs anything the readers see that differs from the
//! exemplar, or that breaks the call context rules.

use std::ops::RangeInclusive;
use std::str::FromStr;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use sies::{
    HarnessConfig, ReleaseAcquire, RunSummary, SequentiallyConsistent, StressHarness,
    Unsynchronized,
};
use tracing::{info, warn};

/// Publish-flag ordering to race with.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Policy {
    /// Store-release, load-acquire
    ReleaseAcquire,
    /// Sequentially consistent store and load
    SeqCst,
    /// Relaxed store and load: no happens-before, intentionally racy
    Relaxed,
}

/// Race check command line arguments.
#[derive(Parser, Debug)]
#[command(name = "sies-racecheck")]
#[command(about = "Stress the shared-immutable, exclusive-setup publish with racing threads")]
struct Args {
    /// Number of iterations
    #[arg(short = 'n', long, default_value_t = 300)]
    iterations: usize,

    /// Chunks per exemplar
    #[arg(long, value_name = "MIN-MAX", default_value = "10-50", value_parser = parse_range::<u32>)]
    chunks: RangeInclusive<u32>,

    /// Words per chunk
    #[arg(long, value_name = "MIN-MAX", default_value = "80-1500", value_parser = parse_range::<u32>)]
    words: RangeInclusive<u32>,

    /// Letters per word
    #[arg(long, value_name = "MIN-MAX", default_value = "2-7", value_parser = parse_range::<u32>)]
    chars: RangeInclusive<u32>,

    /// Threads per iteration, one of which is the creator
    #[arg(long, value_name = "MIN-MAX", default_value = "8-30", value_parser = parse_range::<usize>)]
    threads: RangeInclusive<usize>,

    /// How long readers wait for the aggregate, in milliseconds
    #[arg(long, value_name = "MS", default_value_t = 3000)]
    reader_timeout_ms: u64,

    /// Fix the random seed for a reproducible run
    #[arg(long)]
    seed: Option<u64>,

    /// Publish-flag ordering
    #[arg(long, value_enum, default_value_t = Policy::ReleaseAcquire)]
    policy: Policy,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

/// Parse `MIN-MAX` (or a single `N`) into an inclusive range.
fn parse_range<T>(s: &str) -> Result<RangeInclusive<T>, String>
where
    T: FromStr + PartialOrd + Copy,
    T::Err: std::fmt::Display,
{
    let parse = |part: &str| {
        part.trim()
            .parse::<T>()
            .map_err(|err| format!("invalid bound `{part}`: {err}"))
    };
    let (min, max) = match s.split_once('-') {
        Some((min, max)) => (parse(min)?, parse(max)?),
        None => {
            let n = parse(s)?;
            (n, n)
        }
    };
    if min > max {
        return Err(format!("empty range `{s}`"));
    }
    Ok(min..=max)
}

fn run(args: &Args, config: HarnessConfig) -> RunSummary {
    match args.policy {
        Policy::ReleaseAcquire => StressHarness::<ReleaseAcquire>::new(config).run(),
        Policy::SeqCst => StressHarness::<SequentiallyConsistent>::new(config).run(),
        Policy::Relaxed => {
            warn!("relaxed publish: readers race with the creator, results are informational");
            // SAFETY: the race is what this mode observes; see `run_unsynchronized`.
            unsafe { StressHarness::<Unsynchronized>::new(config).run_unsynchronized() }
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Initialize tracing
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(if args.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .with_writer(std::io::stderr)
        .with_thread_names(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let config = HarnessConfig::builder()
        .iterations(args.iterations)
        .chunks(args.chunks.clone())
        .words_per_chunk(args.words.clone())
        .chars_per_word(args.chars.clone())
        .threads(args.threads.clone())
        .reader_timeout(Duration::from_millis(args.reader_timeout_ms))
        .seed(args.seed)
        .build()?;

    let summary = run(&args, config);
    info!(clean = summary.is_clean(), "race check finished");

    Ok(())
}
