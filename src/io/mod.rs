pub mod mem;
pub mod os;

use std::io;
use std::path::Path;

use crate::strategy::{OpenConfig, Preallocation};

pub use mem::{CallCounts, MemFile, MemFileSystem, Op};
pub use os::{OsFile, OsFileSystem};

/// The filesystem operations a benchmark run needs, and nothing else.
///
/// Production binds this to the real OS calls (`OsFileSystem`); tests bind
/// it to `MemFileSystem`, which counts calls and can fail on demand.
pub trait FileSystem {
    type File: DurableFile;

    /// Create exclusively (fails with `AlreadyExists`), write-only, plus the
    /// configured open-level sync flag.
    fn open(&self, path: &Path, config: OpenConfig, mode: u32) -> io::Result<Self::File>;

    fn remove(&self, path: &Path) -> io::Result<()>;

    fn exists(&self, path: &Path) -> bool;
}

/// An open scratch file. Dropping it closes the descriptor.
pub trait DurableFile {
    /// One write at the current position. Returns bytes written, which may be
    /// fewer than `buf.len()`. Nothing is retried.
    fn write(&mut self, buf: &[u8]) -> io::Result<usize>;

    /// Flush data and metadata to stable storage.
    fn full_sync(&mut self) -> io::Result<()>;

    /// Flush data blocks; metadata only if needed to read them back.
    fn data_sync(&mut self) -> io::Result<()>;

    /// Reserve `[0, len)`. Fails with `ErrorKind::Unsupported` when the
    /// target cannot honour `mode` exactly.
    fn preallocate(&mut self, mode: Preallocation, len: u64) -> io::Result<()>;
}

pub(crate) fn unsupported_preallocation(mode: Preallocation) -> io::Error {
    io::Error::new(
        io::ErrorKind::Unsupported,
        format!("unsupported preallocation mode: {mode}"),
    )
}
