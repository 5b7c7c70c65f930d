//! Standalone driver: run one strategy (or the whole catalogue) and print
//! elapsed time, latency and throughput.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use append_bench::{
    default_payload, lookup, validate_iterations, Options, Runner, SyncKind, CATALOGUE,
    DEFAULT_PREALLOCATE_LEN,
};

#[derive(Parser, Debug)]
#[command(name = "append-bench")]
#[command(version)]
#[command(about = "Measure the cost of durable sequential appends", long_about = None)]
struct Cli {
    /// Strategy to run (see --list). Case-insensitive.
    #[arg(value_name = "STRATEGY", required_unless_present_any = ["all", "list"])]
    strategy: Option<String>,

    /// Number of write+sync operations to time
    #[arg(short = 'n', long, default_value = "1000", allow_negative_numbers = true)]
    iterations: i64,

    /// Bytes written per operation
    #[arg(short = 's', long = "payload-size", default_value = "20")]
    payload_size: usize,

    /// Directory for scratch files (defaults to the system temp dir)
    #[arg(long, env = "APPEND_BENCH_DIR", value_name = "DIR")]
    dir: Option<PathBuf>,

    /// Extent reserved by preallocating strategies, in bytes
    #[arg(long, value_name = "BYTES", default_value_t = DEFAULT_PREALLOCATE_LEN)]
    extent: u64,

    /// Run every strategy in the catalogue
    #[arg(long, conflicts_with = "strategy")]
    all: bool,

    /// Print the catalogue and exit
    #[arg(long)]
    list: bool,

    /// Log setup and teardown steps to stderr
    #[arg(short, long)]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_catalogue() {
    println!(
        "{:<32} {:<8} {:<12} {}",
        "STRATEGY", "OPEN", "PREALLOCATE", "AFTER WRITE"
    );
    for s in &CATALOGUE {
        let open = match s.open_sync {
            Some(SyncKind::Full) => "O_SYNC",
            Some(SyncKind::Data) => "O_DSYNC",
            None => "-",
        };
        let prealloc = s.preallocation.map_or("-".to_string(), |p| p.to_string());
        let after = match s.post_write_sync {
            Some(SyncKind::Full) => "fsync",
            Some(SyncKind::Data) => "fdatasync",
            None => "-",
        };
        println!("{:<32} {:<8} {:<12} {}", s.name, open, prealloc, after);
    }
}

fn run(cli: Cli) -> Result<()> {
    if cli.list {
        print_catalogue();
        return Ok(());
    }

    let iterations = validate_iterations(cli.iterations)?;
    let payload = default_payload(cli.payload_size);

    let mut options = Options {
        preallocate_len: cli.extent,
        ..Options::default()
    };
    if let Some(dir) = cli.dir {
        options.scratch_dir = dir;
    }
    let runner = Runner::new(options);

    if cli.all {
        let mut failed = 0;
        for (strategy, outcome) in runner.run_all(iterations, &payload) {
            match outcome {
                Ok(result) => println!("{result}"),
                Err(e) => {
                    eprintln!("{}: {e}", strategy.name);
                    failed += 1;
                }
            }
        }
        if failed > 0 {
            bail!("{failed} of {} strategies failed", CATALOGUE.len());
        }
        return Ok(());
    }

    let name = cli.strategy.context("no strategy given")?;
    let strategy = lookup(&name)?;
    let result = runner
        .run(strategy, iterations, &payload)
        .with_context(|| format!("benchmark {} failed", strategy.name))?;
    println!("{result}");
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
