//! Simulated processing delay for shops and the discount service.
use std::thread;
use std::time::Duration;

use rand::Rng;

/// How long a simulated remote call blocks its thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Latency {
    /// Returns immediately.
    #[default]
    None,
    /// Always sleeps for the same duration.
    Fixed(Duration),
    /// Sleeps for a duration drawn uniformly (millisecond resolution) from `min..=max`.
    Random {
        /// Lower bound.
        min: Duration,
        /// Upper bound.
        max: Duration,
    },
}

impl Latency {
    /// Shorthand for `Latency::Fixed(Duration::from_millis(ms))`.
    pub fn fixed_ms(ms: u64) -> Self {
        Latency::Fixed(Duration::from_millis(ms))
    }

    /// Picks the delay for a single call.
    pub fn sample(&self) -> Duration {
        match *self {
            Latency::None => Duration::ZERO,
            Latency::Fixed(delay) => delay,
            Latency::Random { min, max } => {
                let (lo, hi) = (min.as_millis() as u64, max.as_millis() as u64);
                if hi <= lo {
                    return min;
                }
                Duration::from_millis(rand::rng().random_range(lo..=hi))
            }
        }
    }

    /// Blocks the current thread for one sampled delay.
    pub fn wait(&self) {
        let delay = self.sample();
        if !delay.is_zero() {
            thread::sleep(delay);
        }
    }
}
