//! Sequential write driver: pushes one million values into a queue.
//!
//! ```text
//! cargo run --release --example write_queue
//! ```

use std::time::Instant;
use vqueue_core::{Queue, QueueResult};

fn main() -> QueueResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let queue = Queue::open("example_queue", "./data/out")?;

    println!("write test queue...");
    let start = Instant::now();
    for i in 0..1_000_000u32 {
        queue.push(format!("tst_{i}").as_bytes())?;
    }
    queue.close()?;

    let elapsed = start.elapsed();
    let stats = queue.stats();
    println!(
        "pushed {} values ({} bytes, {} flushes, {} rotations) in {:.2?}",
        stats.pushes, stats.bytes_written, stats.flushes, stats.rotations, elapsed
    );
    Ok(())
}
