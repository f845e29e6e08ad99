//! Stage timing.

use std::time::{Duration, Instant};

/// Measures one pipeline stage and logs its duration on finish.
pub struct Timer {
    name: String,
    start: Instant,
}

impl Timer {
    pub fn start(name: &str) -> Self {
        Self {
            name: name.to_string(),
            start: Instant::now(),
        }
    }

    pub fn finish(self) -> Duration {
        let elapsed = self.start.elapsed();
        let secs = elapsed.as_secs_f64();
        if secs >= 60.0 {
            tracing::info!(stage = %self.name, "[{:.1}m] done", secs / 60.0);
        } else {
            tracing::info!(stage = %self.name, "[{:.1}s] done", secs);
        }
        elapsed
    }
}
