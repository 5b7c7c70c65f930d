//! Ephemeral files owned by exactly one benchmark run.
//!
//! Lifecycle:
//!   acquire()  → unique path generated, file opened with the strategy's flags
//!   release()  → descriptor closed, path removed
//!
//! Release runs on every exit path. If a `ScratchFile` is dropped without an
//! explicit `release()` (early return, panic unwinding) the guard removes
//! the path itself. Removal failures are logged and never returned in place
//! of the run's own result.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{debug, warn};

use crate::error::{Error, Result, SetupStage};
use crate::io::FileSystem;
use crate::strategy::Strategy;

/// Source of the timestamp component of scratch file names.
pub trait Clock {
    fn now_nanos(&self) -> u128;
}

/// Wall clock, nanoseconds since the Unix epoch.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_nanos(&self) -> u128 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or_default()
    }
}

/// Always returns the same instant. Names stay unique through the
/// process-wide sequence counter.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub u128);

impl Clock for FixedClock {
    fn now_nanos(&self) -> u128 {
        self.0
    }
}

/// Generates `<dir>/<prefix>.<pid>.<nanos>.<seq>` paths.
///
/// `seq` is drawn from one process-wide counter, so no two paths generated
/// in this process collide, across namers and even if the clock stands still.
#[derive(Debug)]
pub struct ScratchNamer<C = SystemClock> {
    dir: PathBuf,
    prefix: String,
    pid: u32,
    clock: C,
}

static SEQ: AtomicU64 = AtomicU64::new(0);

impl<C: Clock> ScratchNamer<C> {
    pub fn new(dir: impl Into<PathBuf>, prefix: impl Into<String>, clock: C) -> Self {
        ScratchNamer {
            dir: dir.into(),
            prefix: prefix.into(),
            pid: std::process::id(),
            clock,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn next_path(&self) -> PathBuf {
        let seq = SEQ.fetch_add(1, Ordering::Relaxed);
        let nanos = self.clock.now_nanos();
        self.dir
            .join(format!("{}.{}.{}.{}", self.prefix, self.pid, nanos, seq))
    }
}

/// An open scratch file plus the guarantee that its path goes away.
///
/// Field order matters: `file` drops (closes) before `guard` removes.
pub struct ScratchFile<'fs, F: FileSystem> {
    file: F::File,
    guard: RemoveGuard<'fs, F>,
}

impl<'fs, F: FileSystem> ScratchFile<'fs, F> {
    /// Generate a fresh path and open it per the strategy's open config.
    ///
    /// The open is exclusive: an existing path is a `Setup` error with
    /// `AlreadyExists` and is left untouched. For any other failure, a path
    /// the open managed to create is removed again.
    pub fn acquire<C: Clock>(
        fs: &'fs F,
        namer: &ScratchNamer<C>,
        strategy: &'static Strategy,
        mode: u32,
    ) -> Result<Self> {
        let path = namer.next_path();
        debug!(strategy = strategy.name, path = %path.display(), "acquiring scratch file");

        match fs.open(&path, strategy.open_config(), mode) {
            Ok(file) => Ok(ScratchFile {
                file,
                guard: RemoveGuard {
                    fs,
                    path,
                    armed: true,
                },
            }),
            Err(source) => {
                if source.kind() != io::ErrorKind::AlreadyExists && fs.exists(&path) {
                    if let Err(e) = fs.remove(&path) {
                        log_teardown(&Error::Teardown {
                            path: path.clone(),
                            source: e,
                        });
                    }
                }
                Err(Error::Setup {
                    strategy: strategy.name,
                    path,
                    stage: SetupStage::Open,
                    source,
                })
            }
        }
    }

    pub fn path(&self) -> &Path {
        &self.guard.path
    }

    pub fn file_mut(&mut self) -> &mut F::File {
        &mut self.file
    }

    /// Close the descriptor and remove the path.
    pub fn release(self) -> Result<()> {
        let ScratchFile { file, mut guard } = self;
        drop(file);
        guard.remove()
    }
}

struct RemoveGuard<'fs, F: FileSystem> {
    fs: &'fs F,
    path: PathBuf,
    armed: bool,
}

impl<F: FileSystem> RemoveGuard<'_, F> {
    fn remove(&mut self) -> Result<()> {
        self.armed = false;
        match self.fs.remove(&self.path) {
            Ok(()) => {
                debug!(path = %self.path.display(), "scratch file removed");
                Ok(())
            }
            // Already gone is the state we wanted.
            Err(e) if e.kind() == io::ErrorKind::NotFound && !self.fs.exists(&self.path) => Ok(()),
            Err(source) => Err(Error::Teardown {
                path: self.path.clone(),
                source,
            }),
        }
    }
}

impl<F: FileSystem> Drop for RemoveGuard<'_, F> {
    fn drop(&mut self) {
        if self.armed {
            if let Err(e) = self.remove() {
                log_teardown(&e);
            }
        }
    }
}

pub(crate) fn log_teardown(err: &Error) {
    warn!(error = %err, "scratch file cleanup failed");
}
