use std::fmt;
use std::time::Duration;

use crate::strategy::{Strategy, SyncKind};

/// Whole nanoseconds in `d`, clamped to `u64::MAX` (about 584 years).
pub(crate) fn saturating_nanos(d: Duration) -> u64 {
    u64::try_from(d.as_nanos()).unwrap_or(u64::MAX)
}

/// How many times each primitive ran during a successful run.
///
/// Open-level sync (O_SYNC / O_DSYNC) happens inside `write` and is not
/// counted as a separate sync.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct OpCounts {
    pub writes: u64,
    pub full_syncs: u64,
    pub data_syncs: u64,
    pub preallocations: u64,
}

impl OpCounts {
    /// The counts a completed run of `strategy` with `iterations` implies.
    pub fn implied(strategy: &Strategy, iterations: u64) -> Self {
        let (full_syncs, data_syncs) = match strategy.post_write_sync {
            Some(SyncKind::Full) => (iterations, 0),
            Some(SyncKind::Data) => (0, iterations),
            None => (0, 0),
        };
        OpCounts {
            writes: iterations,
            full_syncs,
            data_syncs,
            preallocations: u64::from(strategy.preallocation.is_some()),
        }
    }
}

/// Outcome of one run, handed to whatever aggregates timings.
#[derive(Debug, Clone, PartialEq)]
pub struct RunResult {
    pub strategy: &'static str,
    pub iterations: u64,
    pub payload_len: usize,
    /// Time spent in the write/sync loop only. Setup is excluded.
    pub elapsed: Duration,
    pub ops: OpCounts,
}

impl RunResult {
    /// Mean time per write+sync. Zero when no iteration ran.
    pub fn latency(&self) -> Duration {
        if self.iterations == 0 {
            return Duration::ZERO;
        }
        let nanos = self.elapsed.as_nanos() / u128::from(self.iterations);
        Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
    }

    /// Operations per second. 0.0 when nothing was timed.
    pub fn ops_per_sec(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs == 0.0 {
            return 0.0;
        }
        self.iterations as f64 / secs
    }

    pub fn bytes_written(&self) -> u64 {
        self.iterations * self.payload_len as u64
    }

    pub fn bytes_per_sec(&self) -> f64 {
        self.ops_per_sec() * self.payload_len as f64
    }
}

impl fmt::Display for RunResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:<32} {:>9} ops {:>12.3?} {:>10} ns/op {:>12.0} ops/s {:>9.3} MB/s  \
             [write={} fsync={} fdatasync={} fallocate={}]",
            self.strategy,
            self.iterations,
            self.elapsed,
            self.latency().as_nanos(),
            self.ops_per_sec(),
            self.bytes_per_sec() / 1_000_000.0,
            self.ops.writes,
            self.ops.full_syncs,
            self.ops.data_syncs,
            self.ops.preallocations,
        )
    }
}
