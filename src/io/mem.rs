use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::io::{unsupported_preallocation, DurableFile, FileSystem};
use crate::strategy::{OpenConfig, Preallocation, SyncKind};

/// A primitive the fake filesystem counts and can be told to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Open,
    Write,
    FullSync,
    DataSync,
    Preallocate,
    Remove,
}

/// Number of calls made to each primitive, failed calls included.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CallCounts {
    pub opens: u64,
    pub writes: u64,
    pub full_syncs: u64,
    pub data_syncs: u64,
    pub preallocations: u64,
    pub removes: u64,
}

impl CallCounts {
    /// Total calls across every primitive.
    pub fn total(&self) -> u64 {
        self.opens
            + self.writes
            + self.full_syncs
            + self.data_syncs
            + self.preallocations
            + self.removes
    }

    fn bump(&mut self, op: Op) -> u64 {
        let slot = match op {
            Op::Open => &mut self.opens,
            Op::Write => &mut self.writes,
            Op::FullSync => &mut self.full_syncs,
            Op::DataSync => &mut self.data_syncs,
            Op::Preallocate => &mut self.preallocations,
            Op::Remove => &mut self.removes,
        };
        *slot += 1;
        *slot
    }
}

#[derive(Debug)]
struct MemInode {
    data: Vec<u8>,
    /// Apparent size; may exceed `data` after a default preallocation.
    size: u64,
    allocated: u64,
    open_sync: Option<SyncKind>,
    /// Bytes known to be on "stable storage".
    durable_len: usize,
}

#[derive(Debug, Default)]
struct MemState {
    files: HashMap<PathBuf, MemInode>,
    counts: CallCounts,
    /// (primitive, 1-based call number) pairs that fail.
    faults: Vec<(Op, u64)>,
    zero_range_unsupported: bool,
    /// Writes accept at most this many bytes when set.
    short_write: Option<usize>,
}

impl MemState {
    /// Count the call, then report whether it was scheduled to fail.
    fn record(&mut self, op: Op) -> io::Result<()> {
        let nth = self.counts.bump(op);
        if self.faults.contains(&(op, nth)) {
            return Err(io::Error::other(format!("injected fault on {op:?} #{nth}")));
        }
        Ok(())
    }
}

/// In-memory filesystem for deterministic tests and for measuring the
/// runner's own overhead.
///
/// Clones share state, so a test can keep one handle for assertions while
/// the runner owns another.
#[derive(Debug, Clone, Default)]
pub struct MemFileSystem {
    state: Arc<Mutex<MemState>>,
}

impl MemFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the `nth` call (1-based, counted from creation) of `op` fail.
    pub fn fail_on(self, op: Op, nth: u64) -> Self {
        self.lock().faults.push((op, nth));
        self
    }

    /// Reject zero-range preallocation like a filesystem without
    /// FALLOC_FL_ZERO_RANGE.
    pub fn without_zero_range(self) -> Self {
        self.lock().zero_range_unsupported = true;
        self
    }

    /// Accept at most `max` bytes per write call.
    pub fn with_short_writes(self, max: usize) -> Self {
        self.lock().short_write = Some(max);
        self
    }

    pub fn counts(&self) -> CallCounts {
        self.lock().counts
    }

    pub fn file_count(&self) -> usize {
        self.lock().files.len()
    }

    /// Apparent size of a live file.
    pub fn file_len(&self, path: &Path) -> Option<u64> {
        self.lock().files.get(path).map(|f| f.size)
    }

    /// Bytes written to a live file, in position order.
    pub fn contents(&self, path: &Path) -> Option<Vec<u8>> {
        self.lock().files.get(path).map(|f| f.data.clone())
    }

    pub fn allocated(&self, path: &Path) -> Option<u64> {
        self.lock().files.get(path).map(|f| f.allocated)
    }

    pub fn durable_len(&self, path: &Path) -> Option<usize> {
        self.lock().files.get(path).map(|f| f.durable_len)
    }

    fn lock(&self) -> MutexGuard<'_, MemState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl FileSystem for MemFileSystem {
    type File = MemFile;

    fn open(&self, path: &Path, config: OpenConfig, _mode: u32) -> io::Result<MemFile> {
        let mut state = self.lock();
        state.record(Op::Open)?;
        if state.files.contains_key(path) {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("{} already exists", path.display()),
            ));
        }
        state.files.insert(
            path.to_path_buf(),
            MemInode {
                data: Vec::new(),
                size: 0,
                allocated: 0,
                open_sync: config.sync,
                durable_len: 0,
            },
        );

        Ok(MemFile {
            path: path.to_path_buf(),
            pos: 0,
            state: Arc::clone(&self.state),
        })
    }

    fn remove(&self, path: &Path) -> io::Result<()> {
        let mut state = self.lock();
        state.record(Op::Remove)?;
        match state.files.remove(path) {
            Some(_) => Ok(()),
            None => Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} not found", path.display()),
            )),
        }
    }

    fn exists(&self, path: &Path) -> bool {
        self.lock().files.contains_key(path)
    }
}

/// Handle into a `MemFileSystem` file. Writes go to the current position,
/// which starts at 0 like a freshly opened descriptor.
#[derive(Debug)]
pub struct MemFile {
    path: PathBuf,
    pos: usize,
    state: Arc<Mutex<MemState>>,
}

impl MemFile {
    fn with_inode<T>(
        &self,
        op: Op,
        f: impl FnOnce(&mut MemInode, &MemStateView) -> io::Result<T>,
    ) -> io::Result<T> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.record(op)?;
        let view = MemStateView {
            zero_range_unsupported: state.zero_range_unsupported,
            short_write: state.short_write,
        };
        let inode = state.files.get_mut(&self.path).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} was removed while open", self.path.display()),
            )
        })?;
        f(inode, &view)
    }
}

struct MemStateView {
    zero_range_unsupported: bool,
    short_write: Option<usize>,
}

impl DurableFile for MemFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let pos = self.pos;
        let n = self.with_inode(Op::Write, |inode, view| {
            let n = view.short_write.map_or(buf.len(), |max| buf.len().min(max));
            let end = pos + n;
            if inode.data.len() < end {
                inode.data.resize(end, 0);
            }
            inode.data[pos..end].copy_from_slice(&buf[..n]);
            inode.size = inode.size.max(end as u64);
            if inode.open_sync.is_some() {
                inode.durable_len = inode.durable_len.max(end);
            }
            Ok(n)
        })?;
        self.pos += n;
        Ok(n)
    }

    fn full_sync(&mut self) -> io::Result<()> {
        self.with_inode(Op::FullSync, |inode, _| {
            inode.durable_len = inode.data.len();
            Ok(())
        })
    }

    fn data_sync(&mut self) -> io::Result<()> {
        self.with_inode(Op::DataSync, |inode, _| {
            inode.durable_len = inode.data.len();
            Ok(())
        })
    }

    fn preallocate(&mut self, mode: Preallocation, len: u64) -> io::Result<()> {
        self.with_inode(Op::Preallocate, |inode, view| {
            if len == 0 {
                return Err(io::Error::new(io::ErrorKind::InvalidInput, "zero-length extent"));
            }
            match mode {
                Preallocation::Default => inode.size = inode.size.max(len),
                Preallocation::ZeroRange if view.zero_range_unsupported => {
                    return Err(unsupported_preallocation(mode));
                }
                Preallocation::ZeroRange => {}
            }
            inode.allocated = inode.allocated.max(len);
            Ok(())
        })
    }
}
