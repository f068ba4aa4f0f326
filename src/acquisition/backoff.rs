use std::time::Duration;

/// Exponential backoff between fetch attempts.
///
/// With the defaults (3 attempts, 1 s base, ×2) a failing request is tried at
/// t=0, t=1s and t=3s, and the schedule between attempts is `[1s, 2s]`.
#[derive(Debug, Clone, Copy, PartialEq, bon::Builder)]
pub struct BackoffPolicy {
    /// Total number of attempts, including the first one. Never less than 1.
    #[builder(default = 3)]
    pub max_attempts: u32,
    #[builder(default = Duration::from_secs(1))]
    pub base_delay: Duration,
    #[builder(default = 2.0)]
    pub multiplier: f64,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl BackoffPolicy {
    /// A policy that retries immediately; handy for tests.
    pub fn immediate(max_attempts: u32) -> Self {
        Self::builder()
            .max_attempts(max_attempts)
            .base_delay(Duration::ZERO)
            .build()
    }

    pub fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    /// Delay to wait after failed attempt number `attempt` (zero-based).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let factor = self.multiplier.max(0.0).powi(attempt as i32);
        Duration::from_nanos((self.base_delay.as_nanos() as f64 * factor).round() as u64)
    }

    /// Sleeps between consecutive attempts; one fewer than [`Self::attempts`].
    pub fn schedule(&self) -> Vec<Duration> {
        (0..self.attempts() - 1).map(|a| self.delay_after(a)).collect()
    }
}
