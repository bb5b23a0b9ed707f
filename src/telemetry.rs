//! Periodic telemetry broadcast.
//!
//! One [`TelemetryTask`] per measurement: sample, render, broadcast,
//! sleep.  The schedule is a fixed delay after each broadcast, so the
//! effective period is `period + sampling time`.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, info};

use crate::app::ports::Broadcaster;
use crate::sensors::Sampler;

pub struct TelemetryTask<S: Sampler> {
    name: &'static str,
    sampler: S,
    out: Arc<dyn Broadcaster>,
    period: Duration,
}

impl<S: Sampler> TelemetryTask<S> {
    pub fn new(name: &'static str, sampler: S, out: Arc<dyn Broadcaster>, period_ms: u32) -> Self {
        Self {
            name,
            sampler,
            out,
            period: Duration::from_millis(u64::from(period_ms)),
        }
    }

    /// Take one sample and broadcast it.  Returns the number of clients
    /// reached; zero clients is not an error.
    pub fn tick(&mut self) -> usize {
        let text = self.sampler.sample().to_text();
        let reached = self.out.broadcast_text(&text);
        debug!("{}: {} -> {} client(s)", self.name, text, reached);
        reached
    }

    pub fn run(mut self) -> ! {
        info!("{}: broadcasting every {} ms", self.name, self.period.as_millis());
        loop {
            self.tick();
            std::thread::sleep(self.period);
        }
    }
}
