//! Time source for deadlines, stop-event timestamps and poll sleeps

use crate::error::ConnectorResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

#[async_trait]
pub trait Clock: Send + Sync {
    /// Current wall-clock time
    fn now(&self) -> DateTime<Utc>;

    /// Suspend for `duration`
    ///
    /// An implementation that can be woken early reports that as
    /// [`ConnectorError::Interrupted`](crate::ConnectorError::Interrupted).
    async fn sleep(&self, duration: Duration) -> ConnectorResult<()>;
}

/// Real time: `Utc::now()` and `tokio::time::sleep`
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

#[async_trait]
impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    async fn sleep(&self, duration: Duration) -> ConnectorResult<()> {
        tokio::time::sleep(duration).await;
        Ok(())
    }
}

/// Virtual time that only moves when something sleeps on it
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
    sleeps: AtomicUsize,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
            sleeps: AtomicUsize::new(0),
        }
    }

    pub fn advance(&self, duration: Duration) {
        let step = chrono::Duration::from_std(duration).unwrap_or(chrono::Duration::zero());
        let mut now = self.now.lock();
        *now += step;
    }

    /// Number of sleeps performed so far
    pub fn sleeps(&self) -> usize {
        self.sleeps.load(Ordering::SeqCst)
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(Utc::now())
    }
}

#[async_trait]
impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }

    async fn sleep(&self, duration: Duration) -> ConnectorResult<()> {
        self.sleeps.fetch_add(1, Ordering::SeqCst);
        self.advance(duration);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_manual_clock_advances_on_sleep() {
        let clock = ManualClock::default();
        let start = clock.now();

        clock.sleep(Duration::from_millis(200)).await.unwrap();
        clock.sleep(Duration::from_millis(200)).await.unwrap();

        assert_eq!(clock.now() - start, chrono::Duration::milliseconds(400));
        assert_eq!(clock.sleeps(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_system_clock_sleeps() {
        let before = tokio::time::Instant::now();
        SystemClock.sleep(Duration::from_millis(200)).await.unwrap();
        assert!(before.elapsed() >= Duration::from_millis(200));
    }
}
