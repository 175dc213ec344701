//! Integration test: cache traffic during membership changes.
//!
//! Readers and writers run on their own threads while the main thread adds
//! and removes nodes. A reader must never see a stored key as missing, and
//! every write must be readable once the churn is over.

use std::sync::atomic::{AtomicBool, Ordering};

use ringcache_integration_tests::{seeded_directory, test_keys, value_for};

#[test]
#[ntest::timeout(60000)]
fn test_readers_and_writers_during_churn() {
    let directory = seeded_directory(50, 4, 1_000);
    let seeded = test_keys(1_000);
    let done = AtomicBool::new(false);

    std::thread::scope(|scope| {
        for reader in 0..4 {
            let (directory, seeded, done) = (&directory, &seeded, &done);
            scope.spawn(move || {
                let mut reads = 0usize;
                while !done.load(Ordering::Acquire) || reads == 0 {
                    for key in seeded.iter().skip(reader).step_by(4) {
                        let (value, _) = directory
                            .get(key)
                            .unwrap_or_else(|e| panic!("{key} missing mid-churn: {e}"));
                        assert_eq!(value, value_for(key).as_bytes());
                        reads += 1;
                    }
                }
            });
        }

        for writer in 0..2 {
            let directory = &directory;
            scope.spawn(move || {
                for i in 0..500 {
                    let key = format!("written-{writer}-{i}");
                    let value = value_for(&key);
                    directory.set(key, value).unwrap();
                }
            });
        }

        for round in 0..10 {
            let extra = format!("extra-{round}");
            directory.add_node(extra.as_str());
            if round % 2 == 1 {
                directory.remove_node(format!("extra-{}", round - 1));
            }
        }
        done.store(true, Ordering::Release);
    });

    for writer in 0..2 {
        for i in 0..500 {
            let key = format!("written-{writer}-{i}");
            let (value, owner) = directory.get(&key).unwrap();
            assert_eq!(value, value_for(&key).as_bytes());
            assert_eq!(directory.lookup(&key), Some(owner));
        }
    }
    assert_eq!(directory.snapshot_key_owners().len(), 2_000);
    // 4 seeded nodes plus extra-1, extra-3, ..., extra-9.
    assert_eq!(directory.node_count(), 9);
}
