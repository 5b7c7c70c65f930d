use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

use crate::io::{DurableFile, FileSystem};
use crate::strategy::{OpenConfig, Preallocation};

/// The real operating system.
///
/// Three layers between a write and the platter:
///   write()          → page cache
///   fdatasync()      → data blocks on disk
///   fsync()          → data blocks + inode metadata on disk
/// O_DSYNC / O_SYNC fold the last two into every write() call.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsFileSystem;

#[derive(Debug)]
pub struct OsFile(File);

impl From<File> for OsFile {
    fn from(file: File) -> Self {
        OsFile(file)
    }
}

impl FileSystem for OsFileSystem {
    type File = OsFile;

    fn open(&self, path: &Path, config: OpenConfig, mode: u32) -> io::Result<OsFile> {
        let mut opts = OpenOptions::new();
        opts.create_new(true).write(true);

        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;

            use crate::strategy::SyncKind;

            let flags = match config.sync {
                None => 0,
                Some(SyncKind::Full) => libc::O_SYNC,
                Some(SyncKind::Data) => libc::O_DSYNC,
            };
            opts.mode(mode).custom_flags(flags);
        }

        #[cfg(not(unix))]
        {
            let _ = mode;
            if config.sync.is_some() {
                return Err(io::Error::new(
                    io::ErrorKind::Unsupported,
                    "open-level sync flags need a unix target",
                ));
            }
        }

        opts.open(path).map(OsFile)
    }

    fn remove(&self, path: &Path) -> io::Result<()> {
        fs::remove_file(path)
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }
}

impl DurableFile for OsFile {
    /// Exactly one write(2). Short counts and EINTR go back to the caller.
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.write(buf)
    }

    fn full_sync(&mut self) -> io::Result<()> {
        self.0.sync_all()
    }

    fn data_sync(&mut self) -> io::Result<()> {
        self.0.sync_data()
    }

    fn preallocate(&mut self, mode: Preallocation, len: u64) -> io::Result<()> {
        fallocate(&self.0, mode, len)
    }
}

#[cfg(target_os = "linux")]
fn fallocate(file: &File, mode: Preallocation, len: u64) -> io::Result<()> {
    use std::os::unix::io::AsRawFd;

    let flags = match mode {
        Preallocation::Default => 0,
        Preallocation::ZeroRange => libc::FALLOC_FL_ZERO_RANGE | libc::FALLOC_FL_KEEP_SIZE,
    };
    let len = libc::off_t::try_from(len)
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "extent exceeds off_t"))?;

    // SAFETY: the descriptor is owned by `file` and stays open for the call.
    let ret = unsafe { libc::fallocate(file.as_raw_fd(), flags, 0, len) };
    if ret == 0 {
        return Ok(());
    }

    let err = io::Error::last_os_error();
    match err.raw_os_error() {
        // Never fall back to a different mode.
        Some(libc::EOPNOTSUPP) | Some(libc::ENOSYS) => {
            Err(crate::io::unsupported_preallocation(mode))
        }
        _ => Err(err),
    }
}

#[cfg(not(target_os = "linux"))]
fn fallocate(_file: &File, mode: Preallocation, _len: u64) -> io::Result<()> {
    Err(crate::io::unsupported_preallocation(mode))
}
