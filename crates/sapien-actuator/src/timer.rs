//! Debounce timer

use std::time::Duration;

use tokio::time::{sleep_until, Instant};

/// One-shot timer that can be re-armed before it fires.
///
/// Waiting on [`fired`](DebounceTimer::fired) is cancel safe: dropping the
/// future leaves the deadline in place.
#[derive(Debug)]
pub struct DebounceTimer {
    delay: Duration,
    deadline: Option<Instant>,
}

impl DebounceTimer {
    pub fn new(delay: Duration) -> Self {
        DebounceTimer {
            delay,
            deadline: None,
        }
    }

    /// Arm the timer, or push an armed timer's deadline out by a full delay
    pub fn reset(&mut self) {
        self.deadline = Some(Instant::now() + self.delay);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Resolves when the deadline passes, disarming the timer.
    /// Never resolves while disarmed.
    pub async fn fired(&mut self) {
        match self.deadline {
            Some(deadline) => {
                sleep_until(deadline).await;
                self.deadline = None;
            }
            None => std::future::pending().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_fires_after_delay() {
        let mut timer = DebounceTimer::new(Duration::from_millis(200));
        let start = Instant::now();

        timer.reset();
        timer.fired().await;

        assert!(start.elapsed() >= Duration::from_millis(200));
        assert!(!timer.is_armed());
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_pushes_deadline() {
        let mut timer = DebounceTimer::new(Duration::from_millis(200));
        let start = Instant::now();

        timer.reset();
        tokio::time::sleep(Duration::from_millis(150)).await;
        timer.reset();
        timer.fired().await;

        assert!(start.elapsed() >= Duration::from_millis(350));
    }

    #[tokio::test(start_paused = true)]
    async fn test_disarmed_never_fires() {
        let mut timer = DebounceTimer::new(Duration::from_millis(10));
        timer.reset();
        timer.cancel();

        let result = tokio::time::timeout(Duration::from_secs(5), timer.fired()).await;
        assert!(result.is_err());
    }
}
