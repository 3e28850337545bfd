//! Micro-benchmarks for the work queue
//!
//! Measures the cost of the two submission paths:
//! - `submit`: enqueue + signal, no waiting
//! - `submit_and_wait`: full round trip through the dispatcher
//!
//! Run in release mode; debug numbers are meaningless.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use workq::{QueueConfig, WorkQueue};

const WARMUP: usize = 1_000;
const ITERS: usize = 100_000;
const RT_ITERS: usize = 10_000;

fn main() {
    println!("=== workq Benchmark ===\n");

    let queue = Arc::new(
        WorkQueue::with_config(QueueConfig::default().max_depth(0)).unwrap(),
    );
    queue.start().unwrap();

    let sink = Arc::new(AtomicU64::new(0));

    // Warm up the entry pool and the branch predictors
    for _ in 0..WARMUP {
        let sink = Arc::clone(&sink);
        queue
            .submit(move || {
                sink.fetch_add(1, Ordering::Relaxed);
            })
            .unwrap();
    }
    queue.submit_and_wait(|| {}).unwrap();

    // --- submit (fire and forget) ---
    let start = Instant::now();
    for _ in 0..ITERS {
        let sink = Arc::clone(&sink);
        queue
            .submit(move || {
                sink.fetch_add(1, Ordering::Relaxed);
            })
            .unwrap();
    }
    let submit_elapsed = start.elapsed();
    queue.submit_and_wait(|| {}).unwrap();
    let drain_elapsed = start.elapsed();

    println!(
        "submit:          {:>8.0} ns/op   ({} ops in {:?})",
        submit_elapsed.as_nanos() as f64 / ITERS as f64,
        ITERS,
        submit_elapsed
    );
    println!(
        "submit + drain:  {:>8.0} ns/op   (end-to-end {:?})",
        drain_elapsed.as_nanos() as f64 / ITERS as f64,
        drain_elapsed
    );

    // --- submit_and_wait (round trip) ---
    let start = Instant::now();
    for _ in 0..RT_ITERS {
        queue.submit_and_wait(|| {}).unwrap();
    }
    let rt_elapsed = start.elapsed();

    println!(
        "submit_and_wait: {:>8.0} ns/op   ({} round trips in {:?})",
        rt_elapsed.as_nanos() as f64 / RT_ITERS as f64,
        RT_ITERS,
        rt_elapsed
    );

    let stats = queue.stats();
    println!(
        "\nPool: {} fresh allocations / {} reuses over {} executed tasks",
        stats.entries_allocated, stats.entries_recycled, stats.executed
    );

    queue.stop();
}
