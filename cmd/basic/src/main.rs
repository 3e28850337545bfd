//! Basic work queue example
//!
//! Marshals "engine events" arriving on several producer threads onto one
//! dispatcher thread, the way a communications engine funnels network and
//! audio callbacks into a single logical thread. The event journal is
//! mutated only on the dispatcher, so it needs no lock of its own beyond
//! the one the demo uses to hand it back at the end.
//!
//! # Environment Variables
//!
//! - `WORKQ_LOG_LEVEL=debug` - Set log level (off, error, warn, info, debug, trace)
//! - `WORKQ_FLUSH_EPRINT=1` - Flush debug output immediately

use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use workq::{QueueConfig, WorkQueue};

// WORKQ_LOG_LEVEL=debug cargo run -p workq-basic
fn main() -> workq::QueueResult<()> {
    println!("=== workq Basic Example ===\n");

    let config = QueueConfig::default()
        .max_depth(256)
        .thread_name("engine-events");

    let queue = Arc::new(WorkQueue::with_config(config)?);
    queue.start()?;

    // All mutation happens on the dispatcher thread; the mutex only exists
    // so main can read the journal afterward
    let journal = Arc::new(Mutex::new(Vec::new()));

    let mut producers = Vec::new();
    for source in ["net-rx", "audio-in", "control"] {
        let queue = Arc::clone(&queue);
        let journal = Arc::clone(&journal);
        producers.push(thread::spawn(move || {
            for event in 0..5 {
                let journal = Arc::clone(&journal);
                let accepted = queue.submit(move || {
                    journal
                        .lock()
                        .unwrap()
                        .push(format!("{} event {}", source, event));
                });
                if accepted.is_err() {
                    eprintln!("{}: event {} rejected", source, event);
                }
                thread::sleep(Duration::from_millis(2));
            }
        }));
    }

    for p in producers {
        p.join().unwrap();
    }

    // Barrier: everything submitted above has run once this returns
    queue.submit_and_wait(|| {})?;

    println!("Dispatcher processed, in arrival order:");
    for line in journal.lock().unwrap().iter() {
        println!("  {}", line);
    }

    let stats = queue.stats();
    println!(
        "\nsubmitted={} executed={} rejected={} pool: {} fresh / {} reused",
        stats.submitted,
        stats.executed,
        stats.rejected,
        stats.entries_allocated,
        stats.entries_recycled
    );

    queue.stop();
    println!("\nDone.");
    Ok(())
}
