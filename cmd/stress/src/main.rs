//! Stress test - many producers against one dispatcher
//!
//! Floods the queue from several threads with a bounded depth, so a share
//! of submissions bounce off the backpressure limit and get retried.
//! Reports throughput and the accept/reject split at the end.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Instant;

use workq::{QueueConfig, QueueError, WorkQueue};

fn main() {
    println!("=== workq Stress Test ===\n");

    let num_tasks: usize = std::env::args()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(100_000);
    let num_producers: usize = std::env::args()
        .nth(2)
        .and_then(|s| s.parse().ok())
        .unwrap_or(4);

    println!(
        "Pushing {} tasks from {} producers (max_depth=1024)...",
        num_tasks, num_producers
    );

    let config = QueueConfig::default().max_depth(1024);
    let queue = Arc::new(WorkQueue::with_config(config).unwrap());
    queue.start().unwrap();

    let executed = Arc::new(AtomicU64::new(0));
    let retries = Arc::new(AtomicU64::new(0));
    let start = Instant::now();

    let per_producer = num_tasks / num_producers;
    let mut producers = Vec::new();
    for _ in 0..num_producers {
        let queue = Arc::clone(&queue);
        let executed = Arc::clone(&executed);
        let retries = Arc::clone(&retries);
        producers.push(thread::spawn(move || {
            for _ in 0..per_producer {
                loop {
                    let executed = Arc::clone(&executed);
                    match queue.submit(move || {
                        executed.fetch_add(1, Ordering::Relaxed);
                    }) {
                        Ok(()) => break,
                        Err(QueueError::QueueFull) => {
                            // Backpressure: let the dispatcher catch up
                            retries.fetch_add(1, Ordering::Relaxed);
                            thread::yield_now();
                        }
                        Err(e) => panic!("submit failed: {}", e),
                    }
                }
            }
        }));
    }

    for p in producers {
        p.join().unwrap();
    }
    let submit_time = start.elapsed();

    // Drain everything still queued
    queue.submit_and_wait(|| {}).unwrap();
    let total_time = start.elapsed();

    let done = executed.load(Ordering::Relaxed);
    let stats = queue.stats();

    println!("\nSubmit time:   {:?}", submit_time);
    println!("Total time:    {:?}", total_time);
    println!(
        "Throughput:    {:.0} tasks/sec",
        done as f64 / total_time.as_secs_f64()
    );
    println!("Executed:      {}/{}", done, per_producer * num_producers);
    println!("Full-queue retries: {}", retries.load(Ordering::Relaxed));
    println!(
        "Rejected (counted by queue): {}  Pool: {} fresh / {} reused",
        stats.rejected, stats.entries_allocated, stats.entries_recycled
    );

    queue.stop();
}
