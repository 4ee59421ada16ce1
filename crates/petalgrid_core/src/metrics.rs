//! Simulation metrics and logging setup.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Counters the driver reports while the simulation runs.
pub struct Metrics {
    tick_count: AtomicU64,
    flower_count: AtomicU64,
    bot_count: AtomicU64,
    start_time: Instant,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    #[must_use]
    pub fn new() -> Self {
        Self {
            tick_count: AtomicU64::new(0),
            flower_count: AtomicU64::new(0),
            bot_count: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    /// Records a completed tick; logs a heartbeat every 1000 ticks.
    pub fn record_tick(&self, duration: Duration, flowers: usize, bots: usize) {
        self.tick_count.fetch_add(1, Ordering::Relaxed);
        self.flower_count.store(flowers as u64, Ordering::Relaxed);
        self.bot_count.store(bots as u64, Ordering::Relaxed);
        let tick = self.tick_count.load(Ordering::Relaxed);
        if tick % 1000 == 0 {
            tracing::info!(
                tick = tick,
                flowers = flowers,
                bots = bots,
                duration_us = duration.as_micros() as u64,
                "simulation tick"
            );
        }
    }

    #[must_use]
    pub fn tick_count(&self) -> u64 {
        self.tick_count.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }
}

/// Initialize the tracing subscriber for logging.
pub fn init_logging() {
    tracing::subscriber::set_global_default(
        tracing_subscriber::FmtSubscriber::builder()
            .with_max_level(tracing::Level::INFO)
            .finish(),
    )
    .ok();
}
