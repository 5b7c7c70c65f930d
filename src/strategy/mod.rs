pub mod catalogue;

use std::fmt;

pub use catalogue::{lookup, names, CATALOGUE};

/// Strength of a durability guarantee.
///
///   Full → data + metadata on stable storage (fsync / O_SYNC)
///   Data → data blocks, metadata only if needed to read them back
///          (fdatasync / O_DSYNC)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncKind {
    Full,
    Data,
}

/// How space is reserved once, before any timed write.
///
/// Both modes cover `[0, extent)`.
///   Default   → plain fallocate, file size grows to the extent
///   ZeroRange → FALLOC_FL_ZERO_RANGE | FALLOC_FL_KEEP_SIZE, apparent size
///               stays untouched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preallocation {
    Default,
    ZeroRange,
}

impl fmt::Display for Preallocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Preallocation::Default => f.write_str("default"),
            Preallocation::ZeroRange => f.write_str("zero-range+keep-size"),
        }
    }
}

/// Flags the scratch file is opened with. Create and write-only are always
/// set; `sync` adds O_SYNC or O_DSYNC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenConfig {
    pub sync: Option<SyncKind>,
}

/// An immutable description of one point in the
/// open-flag × sync-call × preallocation space.
///
/// A strategy never pairs an open-level sync flag with an explicit
/// post-write sync: the open flag already makes every write durable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Strategy {
    pub name: &'static str,
    pub open_sync: Option<SyncKind>,
    pub preallocation: Option<Preallocation>,
    pub post_write_sync: Option<SyncKind>,
}

impl Strategy {
    /// # Panics
    /// Panics when both `open_sync` and `post_write_sync` are set. For the
    /// static catalogue this fails the build instead.
    pub(crate) const fn new(
        name: &'static str,
        open_sync: Option<SyncKind>,
        preallocation: Option<Preallocation>,
        post_write_sync: Option<SyncKind>,
    ) -> Self {
        assert!(
            open_sync.is_none() || post_write_sync.is_none(),
            "open-level sync already covers every write"
        );
        Strategy {
            name,
            open_sync,
            preallocation,
            post_write_sync,
        }
    }

    pub fn open_config(&self) -> OpenConfig {
        OpenConfig {
            sync: self.open_sync,
        }
    }

    /// True when each write is durable on return, either through the open
    /// flag or the explicit sync after it.
    pub fn durable_per_write(&self) -> bool {
        self.open_sync.is_some() || self.post_write_sync.is_some()
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[should_panic(expected = "open-level sync already covers every write")]
    fn open_sync_plus_explicit_sync_is_rejected() {
        let _ = Strategy::new("Twice", Some(SyncKind::Data), None, Some(SyncKind::Full));
    }

    #[test]
    fn open_config_carries_open_sync_only() {
        let s = Strategy::new("OpenDataSync", Some(SyncKind::Data), None, None);
        assert_eq!(s.open_config(), OpenConfig { sync: Some(SyncKind::Data) });
        let s = Strategy::new("DataSync", None, None, Some(SyncKind::Data));
        assert_eq!(s.open_config(), OpenConfig { sync: None });
    }
}
