// Property tests for operation accounting
// For any strategy and any N, the filesystem sees exactly what the strategy
// implies, and nothing is left behind.

use append_bench::io::MemFileSystem;
use append_bench::scratch::{FixedClock, ScratchNamer};
use append_bench::{OpCounts, Options, Runner, SyncKind, CATALOGUE};
use proptest::prelude::*;

proptest! {
    #[test]
    fn counts_follow_strategy(idx in 0..CATALOGUE.len(), n in 0u64..300, len in 1usize..64) {
        let strategy = &CATALOGUE[idx];
        let fs = MemFileSystem::new();
        let options = Options {
            scratch_dir: "/scratch".into(),
            preallocate_len: 4096,
            ..Options::default()
        };
        let runner = Runner::with_parts(fs.clone(), FixedClock(0), options);

        let payload = vec![0xA5u8; len];
        let result = runner.run(strategy, n, &payload).unwrap();
        let calls = fs.counts();

        prop_assert_eq!(result.ops, OpCounts::implied(strategy, n));
        prop_assert_eq!(calls.writes, n);
        prop_assert_eq!(
            calls.full_syncs,
            if strategy.post_write_sync == Some(SyncKind::Full) { n } else { 0 }
        );
        prop_assert_eq!(
            calls.data_syncs,
            if strategy.post_write_sync == Some(SyncKind::Data) { n } else { 0 }
        );
        prop_assert_eq!(calls.preallocations, u64::from(strategy.preallocation.is_some()));
        prop_assert_eq!(result.bytes_written(), n * len as u64);
        prop_assert_eq!(fs.file_count(), 0);
    }

    #[test]
    fn failing_write_stops_at_that_iteration(n in 1u64..100, fail_at in 1u64..100) {
        prop_assume!(fail_at <= n);
        let fs = MemFileSystem::new().fail_on(append_bench::io::Op::Write, fail_at);
        let options = Options { scratch_dir: "/scratch".into(), ..Options::default() };
        let runner = Runner::with_parts(fs.clone(), FixedClock(0), options);

        let err = runner.run_named("DataSync", n, b"abc").unwrap_err();
        let is_expected = matches!(
            err,
            append_bench::Error::Execute { iteration, .. } if iteration == fail_at
        );
        prop_assert!(is_expected);
        prop_assert_eq!(fs.counts().writes, fail_at);
        prop_assert_eq!(fs.counts().data_syncs, fail_at - 1);
        prop_assert_eq!(fs.file_count(), 0);
    }

    #[test]
    fn namer_never_repeats(count in 1usize..500, nanos in any::<u64>()) {
        let namer = ScratchNamer::new("/scratch", "p", FixedClock(u128::from(nanos)));
        let mut paths: Vec<_> = (0..count).map(|_| namer.next_path()).collect();
        paths.sort();
        paths.dedup();
        prop_assert_eq!(paths.len(), count);
    }
}
