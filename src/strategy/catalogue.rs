use crate::error::{Error, Result};
use crate::strategy::Strategy;

use crate::strategy::Preallocation::{Default as Prealloc, ZeroRange};
use crate::strategy::SyncKind::{Data, Full};

/// Every strategy the benchmark knows about, in report order.
///
/// ```text
///                                  open flag  preallocate  after each write
/// NoSync                           -          -            -
/// FullSync                         -          -            fsync
/// DataSync                         -          -            fdatasync
/// OpenFullSync                     O_SYNC     -            -
/// OpenDataSync                     O_DSYNC    -            -
/// FullSync+PreallocateDefault      -          default      fsync
/// DataSync+PreallocateDefault      -          default      fdatasync
/// DataSync+PreallocateZeroRange    -          zero-range   fdatasync
/// OpenFullSync+PreallocateDefault  O_SYNC     default      -
/// OpenDataSync+PreallocateDefault  O_DSYNC    default      -
/// ```
pub static CATALOGUE: [Strategy; 10] = [
    Strategy::new("NoSync", None, None, None),
    Strategy::new("FullSync", None, None, Some(Full)),
    Strategy::new("DataSync", None, None, Some(Data)),
    Strategy::new("OpenFullSync", Some(Full), None, None),
    Strategy::new("OpenDataSync", Some(Data), None, None),
    Strategy::new("FullSync+PreallocateDefault", None, Some(Prealloc), Some(Full)),
    Strategy::new("DataSync+PreallocateDefault", None, Some(Prealloc), Some(Data)),
    Strategy::new("DataSync+PreallocateZeroRange", None, Some(ZeroRange), Some(Data)),
    Strategy::new("OpenFullSync+PreallocateDefault", Some(Full), Some(Prealloc), None),
    Strategy::new("OpenDataSync+PreallocateDefault", Some(Data), Some(Prealloc), None),
];

/// Find a strategy by name. Matching ignores ASCII case so the CLI accepts
/// `datasync` as well as `DataSync`.
pub fn lookup(name: &str) -> Result<&'static Strategy> {
    CATALOGUE
        .iter()
        .find(|s| s.name.eq_ignore_ascii_case(name))
        .ok_or_else(|| Error::UnknownStrategy(name.to_string()))
}

/// Catalogue names in table order.
pub fn names() -> impl Iterator<Item = &'static str> {
    CATALOGUE.iter().map(|s| s.name)
}
