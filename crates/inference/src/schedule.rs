//! The fixed wake-up retry schedule.
//!
//! Dedicated inference endpoints routinely answer 503 while loading the
//! model into memory. The schedule is a fixed, finite, ordered list of wait
//! durations with a matching list of human wake-up messages, indexed by
//! attempt number. Fixed data keeps the worst-case total latency and the
//! message shown per attempt fully deterministic; there is no runtime
//! backoff computation and no shared mutable state.

use std::time::Duration;

const RETRY_DELAYS: &[Duration] = &[
    Duration::from_secs(5),
    Duration::from_secs(8),
    Duration::from_secs(10),
    Duration::from_secs(12),
    Duration::from_secs(15),
    Duration::from_secs(15),
    Duration::from_secs(15),
    Duration::from_secs(15),
    Duration::from_secs(15),
    Duration::from_secs(15),
];

const RETRY_MESSAGES: &[&str] = &[
    "MedGemma is waking up — this is normal for a first request...",
    "Still warming up — dedicated AI models take a moment to start...",
    "Almost there — the model is loading into memory...",
    "Hang tight — MedGemma is nearly ready for you...",
    "Still working on it — your patience is appreciated!",
    "The model is spinning up — this only happens on the first request...",
    "Nearly there — just a bit more time...",
    "Warming up — once ready, future requests will be fast!",
    "Still connecting — we haven't given up!",
    "Last attempt — give it one more moment...",
];

/// An ordered sequence of (delay, message) pairs consumed by attempt index.
#[derive(Debug, Clone, Copy)]
pub struct RetrySchedule {
    delays: &'static [Duration],
    messages: &'static [&'static str],
}

impl RetrySchedule {
    /// Build a schedule from static tables. Intended for tests; production
    /// code uses [`RetrySchedule::default`].
    pub const fn new(delays: &'static [Duration], messages: &'static [&'static str]) -> Self {
        Self { delays, messages }
    }

    /// Number of waits available. One more attempt than this is made in
    /// total, since the final attempt is not followed by a wait.
    pub fn max_retries(&self) -> usize {
        self.delays.len()
    }

    /// Total number of upstream attempts, including the first.
    pub fn max_attempts(&self) -> u32 {
        self.delays.len() as u32 + 1
    }

    /// The wait before retrying after attempt `attempt` (0-based), or `None`
    /// once the schedule is exhausted.
    pub fn delay(&self, attempt: usize) -> Option<Duration> {
        self.delays.get(attempt).copied()
    }

    /// The wake-up message for attempt `attempt` (0-based), clamped to the
    /// last entry if the table is shorter than the schedule.
    pub fn wake_message(&self, attempt: usize) -> &'static str {
        self.messages[attempt.min(self.messages.len() - 1)]
    }

    /// Worst-case total time spent waiting across the whole schedule.
    pub fn total_wait(&self) -> Duration {
        self.delays.iter().sum()
    }
}

impl Default for RetrySchedule {
    fn default() -> Self {
        Self::new(RETRY_DELAYS, RETRY_MESSAGES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_schedule_shape() {
        let schedule = RetrySchedule::default();
        assert_eq!(schedule.max_retries(), 10);
        assert_eq!(schedule.max_attempts(), 11);
        assert_eq!(schedule.delay(0), Some(Duration::from_secs(5)));
        assert_eq!(schedule.delay(9), Some(Duration::from_secs(15)));
        assert_eq!(schedule.delay(10), None);
        assert_eq!(schedule.total_wait(), Duration::from_secs(125));
    }

    #[test]
    fn test_wake_messages_clamp_to_last() {
        let schedule = RetrySchedule::default();
        assert!(schedule.wake_message(0).contains("waking up"));
        assert_eq!(schedule.wake_message(9), schedule.wake_message(42));
    }
}
