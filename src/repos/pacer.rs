use std::time::Duration;
use tokio::time::Instant;

/// Enforces a minimum interval between successive API calls
///
/// Callers `wait()` before every request. The first call goes out
/// immediately; each later call is held until `min_interval` has passed since
/// the previous one started.
#[derive(Debug, Clone)]
pub struct Pacer {
    /// Minimum time between the starts of two calls
    min_interval: Duration,

    /// When the previous call was released
    last_call: Option<Instant>,
}

impl Pacer {
    /// Creates a pacer that has not released any call yet
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_call: None,
        }
    }

    /// The configured minimum interval
    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Calculates the time until the next call may start
    ///
    /// Returns None if a call can be made now.
    pub fn time_until_next_call(&self, now: Instant) -> Option<Duration> {
        let last = self.last_call?;
        let elapsed = now.saturating_duration_since(last);
        if elapsed < self.min_interval {
            Some(self.min_interval - elapsed)
        } else {
            None
        }
    }

    /// Sleeps until a call may start, then records it
    pub async fn wait(&mut self) {
        if let Some(delay) = self.time_until_next_call(Instant::now()) {
            tracing::trace!("Pacing API call, sleeping {:?}", delay);
            tokio::time::sleep(delay).await;
        }
        self.last_call = Some(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_call_not_delayed() {
        let pacer = Pacer::new(Duration::from_secs(1));
        assert_eq!(pacer.time_until_next_call(Instant::now()), None);
    }

    #[test]
    fn test_time_until_next_call() {
        let mut pacer = Pacer::new(Duration::from_millis(1000));
        let start = Instant::now();
        pacer.last_call = Some(start);

        assert_eq!(
            pacer.time_until_next_call(start + Duration::from_millis(400)),
            Some(Duration::from_millis(600))
        );
        assert_eq!(
            pacer.time_until_next_call(start + Duration::from_millis(1000)),
            None
        );
        assert_eq!(
            pacer.time_until_next_call(start + Duration::from_millis(1500)),
            None
        );
    }

    #[tokio::test]
    async fn test_wait_spaces_calls() {
        let interval = Duration::from_millis(40);
        let mut pacer = Pacer::new(interval);

        let start = Instant::now();
        pacer.wait().await;
        pacer.wait().await;
        pacer.wait().await;

        assert!(start.elapsed() >= interval * 2);
    }

    #[tokio::test]
    async fn test_zero_interval_never_sleeps() {
        let mut pacer = Pacer::new(Duration::ZERO);
        pacer.wait().await;
        assert_eq!(pacer.time_until_next_call(Instant::now()), None);
    }
}
