use std::path::PathBuf;

/// Bytes written per iteration when the caller does not choose a payload.
pub const DEFAULT_PAYLOAD: &[u8; 20] = b"1234567890qwertyuiop";

/// Fixed extent reserved by preallocating strategies (10 MB).
pub const DEFAULT_PREALLOCATE_LEN: u64 = 10_000_000;

pub const DEFAULT_FILE_PREFIX: &str = "benchmark-append";

/// Runner configuration. Nothing here is read from or written to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    /// Where scratch files live. Defaults to the host temp directory.
    pub scratch_dir: PathBuf,
    pub file_prefix: String,
    /// Permission bits for created files (unix only).
    pub file_mode: u32,
    /// Extent passed to the one-time preallocation call.
    pub preallocate_len: u64,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            scratch_dir: std::env::temp_dir(),
            file_prefix: DEFAULT_FILE_PREFIX.to_string(),
            file_mode: 0o644,
            preallocate_len: DEFAULT_PREALLOCATE_LEN,
        }
    }
}

/// A fixed-content payload of `len` bytes: `DEFAULT_PAYLOAD` repeated and cut.
pub fn default_payload(len: usize) -> Vec<u8> {
    DEFAULT_PAYLOAD.iter().copied().cycle().take(len).collect()
}
