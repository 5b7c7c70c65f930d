pub mod result;

use std::io;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::error::{Error, Primitive, Result, SetupStage};
use crate::io::{DurableFile, FileSystem, OsFileSystem};
use crate::options::Options;
use crate::scratch::{log_teardown, Clock, ScratchFile, ScratchNamer, SystemClock};
use crate::strategy::{self, Strategy, SyncKind, CATALOGUE};

pub use result::{OpCounts, RunResult};

/// Executes one strategy: setup once, then N × (write + durability op),
/// timing only the loop.
///
/// ```text
///   validate ─► acquire ─► preallocate? ─► [timer] write,sync × N [timer] ─► release
///                  │             │                       │                     ▲
///                  └── Setup ────┴───── Execute ─────────┴─── always ──────────┘
/// ```
///
/// Nothing is retried. The first failure ends the run.
pub struct Runner<F = OsFileSystem, C = SystemClock> {
    fs: F,
    namer: ScratchNamer<C>,
    options: Options,
}

impl Runner {
    /// A runner against the real filesystem and wall clock.
    pub fn new(options: Options) -> Self {
        Runner::with_parts(OsFileSystem, SystemClock, options)
    }
}

impl Default for Runner {
    fn default() -> Self {
        Runner::new(Options::default())
    }
}

impl<F: FileSystem, C: Clock> Runner<F, C> {
    pub fn with_parts(fs: F, clock: C, options: Options) -> Self {
        let namer = ScratchNamer::new(&options.scratch_dir, options.file_prefix.as_str(), clock);
        Runner { fs, namer, options }
    }

    /// Look the strategy up by name, then run it. An unknown name fails
    /// before any file is touched.
    pub fn run_named(&self, name: &str, iterations: u64, payload: &[u8]) -> Result<RunResult> {
        let strategy = strategy::lookup(name)?;
        self.run(strategy, iterations, payload)
    }

    /// Run every catalogue entry in table order. A failing strategy does not
    /// stop the ones after it.
    pub fn run_all(
        &self,
        iterations: u64,
        payload: &[u8],
    ) -> Vec<(&'static Strategy, Result<RunResult>)> {
        CATALOGUE
            .iter()
            .map(|s| (s, self.run(s, iterations, payload)))
            .collect()
    }

    /// Benchmark `strategy` for `iterations` write+sync operations of
    /// `payload`.
    ///
    /// 1. Reject an empty payload, or a zero extent for a preallocating
    ///    strategy, with `InvalidArgument`. No file is created.
    /// 2. Acquire a fresh scratch file with the strategy's open flags.
    /// 3. Preallocate once if the strategy asks for it. Failures in 2 and 3
    ///    are `Setup` and no iteration runs.
    /// 4. Time N × (write, then the post-write sync if any). The first
    ///    failure is `Execute` naming the 1-based iteration. With N = 0 the
    ///    timer never starts and `elapsed` is zero.
    /// 5. Release the scratch file on every path. A teardown failure is
    ///    logged and never changes the returned result.
    pub fn run(
        &self,
        strategy: &'static Strategy,
        iterations: u64,
        payload: &[u8],
    ) -> Result<RunResult> {
        if payload.is_empty() {
            return Err(Error::InvalidArgument("payload must not be empty".into()));
        }
        if strategy.preallocation.is_some() && self.options.preallocate_len == 0 {
            return Err(Error::InvalidArgument(format!(
                "{} preallocates but the extent is 0 bytes",
                strategy.name
            )));
        }

        let mut scratch =
            ScratchFile::acquire(&self.fs, &self.namer, strategy, self.options.file_mode)?;
        let outcome = self.execute(strategy, &mut scratch, iterations, payload);

        // Teardown problems never replace the run's own outcome.
        if let Err(e) = scratch.release() {
            log_teardown(&e);
        }

        if let Ok(r) = &outcome {
            debug!(
                strategy = strategy.name,
                iterations,
                elapsed_ns = result::saturating_nanos(r.elapsed),
                "run complete"
            );
        }
        outcome
    }

    fn execute(
        &self,
        strategy: &'static Strategy,
        scratch: &mut ScratchFile<'_, F>,
        iterations: u64,
        payload: &[u8],
    ) -> Result<RunResult> {
        if let Some(mode) = strategy.preallocation {
            let len = self.options.preallocate_len;
            debug!(strategy = strategy.name, %mode, len, "preallocating");
            if let Err(source) = scratch.file_mut().preallocate(mode, len) {
                return Err(Error::Setup {
                    strategy: strategy.name,
                    path: scratch.path().to_path_buf(),
                    stage: SetupStage::Preallocate(mode),
                    source,
                });
            }
        }

        let elapsed = if iterations == 0 {
            Duration::ZERO
        } else {
            timed_loop(strategy, scratch.file_mut(), iterations, payload)?
        };

        Ok(RunResult {
            strategy: strategy.name,
            iterations,
            payload_len: payload.len(),
            elapsed,
            ops: OpCounts::implied(strategy, iterations),
        })
    }
}

/// The measured part. Nothing but the primitives under test runs between
/// the two clock reads.
fn timed_loop<D: DurableFile>(
    strategy: &'static Strategy,
    file: &mut D,
    iterations: u64,
    payload: &[u8],
) -> Result<Duration> {
    let fail = |iteration: u64, op: Primitive, source: io::Error| Error::Execute {
        strategy: strategy.name,
        iteration,
        op,
        source,
    };

    let start = Instant::now();
    for i in 1..=iterations {
        match file.write(payload) {
            Ok(n) if n == payload.len() => {}
            Ok(n) => {
                let short = io::Error::new(
                    io::ErrorKind::WriteZero,
                    format!("short write: {n} of {} bytes", payload.len()),
                );
                return Err(fail(i, Primitive::Write, short));
            }
            Err(e) => return Err(fail(i, Primitive::Write, e)),
        }

        match strategy.post_write_sync {
            Some(SyncKind::Full) => file
                .full_sync()
                .map_err(|e| fail(i, Primitive::FullSync, e))?,
            Some(SyncKind::Data) => file
                .data_sync()
                .map_err(|e| fail(i, Primitive::DataSync, e))?,
            None => {}
        }
    }
    Ok(start.elapsed())
}

/// Convert a signed iteration count from an outer surface.
pub fn validate_iterations(n: i64) -> Result<u64> {
    u64::try_from(n).map_err(|_| {
        Error::InvalidArgument(format!("iteration count must not be negative, got {n}"))
    })
}

/// Run `strategy` against the real filesystem with default options.
pub fn run(strategy: &'static Strategy, iterations: u64, payload: &[u8]) -> Result<RunResult> {
    Runner::new(Options::default()).run(strategy, iterations, payload)
}
