use std::fmt;
use std::io;
use std::path::PathBuf;

use crate::strategy::Preallocation;

/// Which setup step failed before the timed loop started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupStage {
    /// Creating/opening the scratch file with the strategy's open flags.
    Open,
    /// The one-time preallocation call.
    Preallocate(Preallocation),
}

/// A primitive invoked inside the timed loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    Write,
    FullSync,
    DataSync,
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Primitive::Write => f.write_str("write"),
            Primitive::FullSync => f.write_str("fsync"),
            Primitive::DataSync => f.write_str("fdatasync"),
        }
    }
}

/// Unified error type for a benchmark run.
///
/// I/O failures are classified by the phase they happen in, so there is
/// deliberately no blanket `From<io::Error>`.
#[derive(Debug)]
pub enum Error {
    /// Requested strategy name is not in the catalogue.
    UnknownStrategy(String),
    /// Empty payload or negative iteration count.
    InvalidArgument(String),
    /// Open or preallocation failed. No iteration was attempted.
    Setup {
        strategy: &'static str,
        path: PathBuf,
        stage: SetupStage,
        source: io::Error,
    },
    /// A write or sync failed mid-loop. `iteration` is 1-based.
    Execute {
        strategy: &'static str,
        iteration: u64,
        op: Primitive,
        source: io::Error,
    },
    /// Closing or removing the scratch file failed. Logged, never returned
    /// from a run.
    Teardown { path: PathBuf, source: io::Error },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::UnknownStrategy(name) => write!(f, "Unknown strategy: {name}"),
            Error::InvalidArgument(msg) => write!(f, "Invalid argument: {msg}"),
            Error::Setup {
                strategy,
                path,
                stage: SetupStage::Open,
                source,
            } => write!(
                f,
                "Setup error [{strategy}]: open {} failed: {source}",
                path.display()
            ),
            Error::Setup {
                strategy,
                path,
                stage: SetupStage::Preallocate(mode),
                source,
            } => write!(
                f,
                "Setup error [{strategy}]: {mode} preallocation of {} failed: {source}",
                path.display()
            ),
            Error::Execute {
                strategy,
                iteration,
                op,
                source,
            } => write!(
                f,
                "Execute error [{strategy}]: {op} failed at iteration {iteration}: {source}"
            ),
            Error::Teardown { path, source } => {
                write!(f, "Teardown error: {}: {source}", path.display())
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Setup { source, .. }
            | Error::Execute { source, .. }
            | Error::Teardown { source, .. } => Some(source),
            Error::UnknownStrategy(_) | Error::InvalidArgument(_) => None,
        }
    }
}

/// Result type alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
