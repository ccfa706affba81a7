// ==============================================
// CONCURRENCY TESTS (integration)
// ==============================================

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use seglru::builder::CacheBuilder;
use seglru::cache::SegmentedLruCache;
use seglru::traits::ConcurrentCache;

#[test]
fn concurrent_puts_and_gets_in_disjoint_key_ranges() {
    let cache: Arc<SegmentedLruCache<u64, u64>> = Arc::new(
        CacheBuilder::new(100_000)
            .segments(16)
            .try_build()
            .unwrap(),
    );
    let num_threads = 8u64;
    let keys_per_thread = 500u64;

    let handles: Vec<_> = (0..num_threads)
        .map(|thread_id| {
            let cache = Arc::clone(&cache);
            thread::spawn(move || {
                let base = thread_id * keys_per_thread;
                for i in 0..keys_per_thread {
                    cache.put(base + i, base + i);
                }
                for i in 0..keys_per_thread {
                    assert_eq!(cache.get(&(base + i)).as_deref(), Some(&(base + i)));
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(cache.len(), (num_threads * keys_per_thread) as usize);
    cache.check_invariants().unwrap();
}

#[test]
fn mixed_operations_keep_structures_consistent() {
    let cache: Arc<SegmentedLruCache<u64, u64>> = Arc::new(
        CacheBuilder::new(1_000)
            .segments(8)
            .try_build()
            .unwrap(),
    );
    let num_threads = 8;
    let ops_per_thread = 2_000u64;
    let removals = Arc::new(AtomicUsize::new(0));

    let handles: Vec<_> = (0..num_threads)
        .map(|thread_id| {
            let cache = Arc::clone(&cache);
            let removals = Arc::clone(&removals);
            thread::spawn(move || {
                for i in 0..ops_per_thread {
                    // overlapping key space so threads contend on entries
                    let key = (thread_id * 37 + i) % 512;
                    match i % 5 {
                        0 | 1 => {
                            cache.put(key, i);
                        }
                        2 => {
                            let _ = cache.get(&key);
                        }
                        3 => {
                            let _ = cache.contains_key(&key);
                        }
                        _ => {
                            if cache.remove(&key).is_some() {
                                removals.fetch_add(1, Ordering::Relaxed);
                            }
                        }
                    }
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert!(cache.len() <= 1_000, "len {} over ceiling", cache.len());
    assert_eq!(cache.recency_keys().len(), cache.len());
    cache.check_invariants().unwrap();
}

#[test]
fn concurrent_inserts_respect_the_ceiling() {
    let max_entries = 64;
    let cache: Arc<SegmentedLruCache<u64, u64>> = Arc::new(
        CacheBuilder::new(max_entries)
            .segments(4)
            .try_build()
            .unwrap(),
    );

    let handles: Vec<_> = (0..8u64)
        .map(|thread_id| {
            let cache = Arc::clone(&cache);
            thread::spawn(move || {
                for i in 0..1_000u64 {
                    cache.put(thread_id * 10_000 + i, i);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert!(
        cache.len() <= max_entries,
        "len {} exceeds ceiling {max_entries}",
        cache.len()
    );
    assert!(cache.stats().evictions > 0);
    cache.check_invariants().unwrap();
}

#[test]
fn concurrent_clear_and_put_settle_cleanly() {
    let cache: Arc<SegmentedLruCache<u64, u64>> =
        Arc::new(CacheBuilder::new(10_000).try_build().unwrap());

    let writer = {
        let cache = Arc::clone(&cache);
        thread::spawn(move || {
            for i in 0..5_000u64 {
                cache.put(i % 256, i);
            }
        })
    };
    let clearer = {
        let cache = Arc::clone(&cache);
        thread::spawn(move || {
            for _ in 0..50 {
                cache.clear();
                thread::yield_now();
            }
        })
    };

    writer.join().unwrap();
    clearer.join().unwrap();

    cache.check_invariants().unwrap();
    assert_eq!(cache.recency_keys().len(), cache.len());
}

#[test]
fn len_stays_sane_under_racing_put_and_remove() {
    // put/remove churn on a handful of keys, with extra removers racing the
    // inserters. The live counter must never dip below zero: a decrement
    // landing before its matching increment would wrap the counter and make
    // len() read as an enormous value.
    let cache: Arc<SegmentedLruCache<u64, u64>> =
        Arc::new(CacheBuilder::new(1_000_000).try_build().unwrap());
    let stop = Arc::new(AtomicBool::new(false));

    let mut workers = Vec::new();
    for key in 0..4u64 {
        let churn = {
            let cache = Arc::clone(&cache);
            let stop = Arc::clone(&stop);
            thread::spawn(move || {
                while !stop.load(Ordering::Relaxed) {
                    cache.put(key, key);
                    cache.remove(&key);
                }
            })
        };
        let racer = {
            let cache = Arc::clone(&cache);
            let stop = Arc::clone(&stop);
            thread::spawn(move || {
                while !stop.load(Ordering::Relaxed) {
                    cache.remove(&key);
                }
            })
        };
        workers.push(churn);
        workers.push(racer);
    }

    // at most 4 distinct keys are ever live
    let deadline = std::time::Instant::now() + std::time::Duration::from_secs(2);
    while std::time::Instant::now() < deadline {
        let len = cache.len();
        assert!(len <= 4, "live counter corrupted: observed len {len}");
        thread::yield_now();
    }
    stop.store(true, Ordering::Relaxed);
    for worker in workers {
        worker.join().unwrap();
    }

    assert!(cache.len() <= 4);
    assert_eq!(cache.recency_keys().len(), cache.len());
    cache.check_invariants().unwrap();
}

#[test]
fn trait_object_is_shareable_across_threads() {
    let cache: Arc<dyn ConcurrentCache<u64, u64>> =
        Arc::new(CacheBuilder::new(1_000).try_build::<u64, u64>().unwrap());

    let handles: Vec<_> = (0..4u64)
        .map(|thread_id| {
            let cache = Arc::clone(&cache);
            thread::spawn(move || {
                cache.put(thread_id, thread_id);
                assert_eq!(cache.get(&thread_id).as_deref(), Some(&thread_id));
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(cache.len(), 4);
}
