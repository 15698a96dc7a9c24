//! Basic thread pool usage example
//!
//! Starts 4 workers behind a 10-slot queue, submits numbered jobs and
//! message jobs, waits for them, then shuts the pool down.
//!
//! Run with: RUST_LOG=debug cargo run --example basic_usage

use crossbeam_channel::unbounded;
use rust_bounded_pool::prelude::*;
use std::thread;
use std::time::Duration;

fn main() -> Result<()> {
    env_logger::init();

    println!("=== Rust Bounded Pool - Basic Usage Example ===\n");

    let pool = ThreadPool::new(4, 10)?;
    println!(
        "1. Started pool with {} threads, queue capacity {}",
        pool.num_threads(),
        pool.capacity()
    );

    let (done_tx, done_rx) = unbounded();

    println!("\n2. Submitting numbered jobs (submit blocks while the queue is full):");
    for i in 0..10 {
        let done_tx = done_tx.clone();
        pool.execute(move || {
            println!("  Job {} started on {:?}", i, thread::current().name());
            thread::sleep(Duration::from_millis(200));
            println!("  Job {} completed", i);
            done_tx.send(()).unwrap();
        })?;
    }

    println!("\n3. Submitting message jobs:");
    for i in 0..5 {
        let message = format!("Job number {} with custom message", i);
        let done_tx = done_tx.clone();
        pool.execute(move || {
            println!("  Message: {}", message);
            thread::sleep(Duration::from_millis(100));
            done_tx.send(()).unwrap();
        })?;
    }

    for _ in 0..15 {
        done_rx
            .recv()
            .map_err(|_| ThreadError::ShutdownInProgress)?;
    }

    println!("\n4. Per-worker statistics:");
    for (i, stat) in pool.get_stats().iter().enumerate() {
        println!(
            "   Worker {}: {} processed, avg time: {:.2}μs",
            i,
            stat.get_jobs_processed(),
            stat.get_average_processing_time_us()
        );
    }

    println!("\n5. Shutting down thread pool...");
    pool.shutdown()?;
    println!(
        "   Submitted {}, processed {}",
        pool.total_jobs_submitted(),
        pool.total_jobs_processed()
    );

    println!("\n=== Example completed successfully! ===");

    Ok(())
}
