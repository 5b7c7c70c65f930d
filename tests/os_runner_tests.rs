// Real filesystem tests
// Every strategy against an actual directory. Numbers are not asserted,
// only that the primitives succeed and nothing is left on disk.

use std::io::ErrorKind;
use std::path::Path;

use append_bench::io::{DurableFile, OsFileSystem};
use append_bench::scratch::{ScratchFile, ScratchNamer, SystemClock};
use append_bench::{lookup, Error, Options, Preallocation, Runner, SetupStage, CATALOGUE};

fn options(dir: &Path) -> Options {
    Options {
        scratch_dir: dir.to_path_buf(),
        preallocate_len: 1 << 20,
        ..Options::default()
    }
}

fn is_empty(dir: &Path) -> bool {
    std::fs::read_dir(dir).unwrap().next().is_none()
}

/// Some filesystems (tmpfs, older ext4, overlay) reject ZERO_RANGE.
fn zero_range_unsupported(err: &Error) -> bool {
    matches!(
        err,
        Error::Setup {
            stage: SetupStage::Preallocate(Preallocation::ZeroRange),
            source,
            ..
        } if source.kind() == ErrorKind::Unsupported
    )
}

// =============================================================================
// Test 1: Every strategy runs to completion and cleans up
// =============================================================================
#[test]
fn every_strategy_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let runner = Runner::new(options(dir.path()));

    for s in &CATALOGUE {
        match runner.run(s, 3, b"1234567890qwertyuiop") {
            Ok(result) => {
                assert_eq!(result.strategy, s.name);
                assert_eq!(result.ops.writes, 3);
                assert!(result.elapsed > std::time::Duration::ZERO);
            }
            Err(e) if zero_range_unsupported(&e) => {}
            Err(e) => panic!("{}: {e}", s.name),
        }
        assert!(is_empty(dir.path()), "{} left a file behind", s.name);
    }
}

// =============================================================================
// Test 2: N = 0 still creates and removes the file
// =============================================================================
#[test]
fn zero_iterations_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let runner = Runner::new(options(dir.path()));

    let result = runner.run_named("FullSync", 0, b"abc").unwrap();
    assert_eq!(result.elapsed, std::time::Duration::ZERO);
    assert_eq!(result.ops.writes, 0);
    assert!(is_empty(dir.path()));
}

// =============================================================================
// Test 3: Missing scratch directory is a Setup error
// =============================================================================
#[test]
fn missing_directory_is_setup_error() {
    let dir = tempfile::tempdir().unwrap();
    let runner = Runner::new(options(&dir.path().join("gone")));

    let err = runner.run_named("DataSync", 3, b"abc").unwrap_err();
    assert!(matches!(
        err,
        Error::Setup {
            stage: SetupStage::Open,
            ..
        }
    ));
}

// =============================================================================
// Test 4: Writes land in the file in order
// =============================================================================
#[test]
fn writes_reach_the_file() {
    let dir = tempfile::tempdir().unwrap();
    let namer = ScratchNamer::new(dir.path(), "benchmark-append", SystemClock);
    let fs = OsFileSystem;

    let mut scratch = ScratchFile::acquire(&fs, &namer, lookup("FullSync").unwrap(), 0o644).unwrap();
    for _ in 0..3 {
        assert_eq!(scratch.file_mut().write(b"abc").unwrap(), 3);
        scratch.file_mut().full_sync().unwrap();
    }
    assert_eq!(std::fs::read(scratch.path()).unwrap(), b"abcabcabc");
    scratch.release().unwrap();
    assert!(is_empty(dir.path()));
}

// =============================================================================
// Test 5: Default preallocation grows the apparent size; zero-range does not
// =============================================================================
#[cfg(target_os = "linux")]
#[test]
fn preallocation_sizes_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let namer = ScratchNamer::new(dir.path(), "benchmark-append", SystemClock);
    let fs = OsFileSystem;
    let strategy = lookup("NoSync").unwrap();

    let mut scratch = ScratchFile::acquire(&fs, &namer, strategy, 0o644).unwrap();
    scratch
        .file_mut()
        .preallocate(Preallocation::Default, 1 << 20)
        .unwrap();
    assert_eq!(std::fs::metadata(scratch.path()).unwrap().len(), 1 << 20);
    scratch.release().unwrap();

    let mut scratch = ScratchFile::acquire(&fs, &namer, strategy, 0o644).unwrap();
    match scratch.file_mut().preallocate(Preallocation::ZeroRange, 1 << 20) {
        Ok(()) => assert_eq!(std::fs::metadata(scratch.path()).unwrap().len(), 0),
        Err(e) => assert_eq!(e.kind(), ErrorKind::Unsupported),
    }
    scratch.release().unwrap();
    assert!(is_empty(dir.path()));
}

// =============================================================================
// Test 6: Created files carry the configured mode
// =============================================================================
#[cfg(unix)]
#[test]
fn file_mode_applied() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempfile::tempdir().unwrap();
    let namer = ScratchNamer::new(dir.path(), "benchmark-append", SystemClock);

    let scratch =
        ScratchFile::acquire(&OsFileSystem, &namer, lookup("NoSync").unwrap(), 0o600).unwrap();
    let mode = std::fs::metadata(scratch.path()).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o600);
    scratch.release().unwrap();
}

// =============================================================================
// Test 7: One write call reports exactly what the kernel accepted
// =============================================================================
#[test]
fn write_returns_kernel_count() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("direct");
    let file = std::fs::OpenOptions::new()
        .create_new(true)
        .write(true)
        .open(&path)
        .unwrap();
    let mut file = append_bench::io::OsFile::from(file);

    assert_eq!(file.write(b"12345").unwrap(), 5);
    assert_eq!(file.write(b"678").unwrap(), 3);
    assert_eq!(std::fs::read(&path).unwrap(), b"12345678");
}

// =============================================================================
// Test 8: A failing write(2) surfaces once as Execute, nothing retried
// =============================================================================

/// Every "scratch file" is /dev/full: writes fail with ENOSPC.
#[cfg(target_os = "linux")]
struct DevFull;

#[cfg(target_os = "linux")]
impl append_bench::io::FileSystem for DevFull {
    type File = append_bench::io::OsFile;

    fn open(
        &self,
        _path: &Path,
        _config: append_bench::strategy::OpenConfig,
        _mode: u32,
    ) -> std::io::Result<Self::File> {
        std::fs::OpenOptions::new()
            .write(true)
            .open("/dev/full")
            .map(append_bench::io::OsFile::from)
    }

    fn remove(&self, _path: &Path) -> std::io::Result<()> {
        Ok(())
    }

    fn exists(&self, _path: &Path) -> bool {
        false
    }
}

#[cfg(target_os = "linux")]
#[test]
fn write_failure_on_real_descriptor() {
    use append_bench::scratch::FixedClock;
    use append_bench::Primitive;

    let runner = Runner::with_parts(DevFull, FixedClock(0), Options::default());
    let err = runner.run_named("DataSync", 10, b"abc").unwrap_err();

    match err {
        Error::Execute {
            iteration,
            op,
            source,
            ..
        } => {
            assert_eq!(iteration, 1);
            assert_eq!(op, Primitive::Write);
            assert_eq!(source.raw_os_error(), Some(libc::ENOSPC));
        }
        other => panic!("expected Execute, got {other:?}"),
    }
}
