//! Fixed-interval polling for the log view.
//!
//! The poller re-issues its fetch on every tick and forwards results over a
//! channel. Pausing only stops scheduling fetches on subsequent ticks; an
//! in-flight request is never cancelled and its result is still delivered.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::models::LogEntry;

/// Pause/resume control shared with the poller loop.
#[derive(Clone)]
pub struct PollerHandle {
    paused: Arc<AtomicBool>,
}

impl PollerHandle {
    pub fn pause(&self) {
        self.paused.store(true, Ordering::SeqCst);
    }

    pub fn resume(&self) {
        self.paused.store(false, Ordering::SeqCst);
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }
}

/// Periodic poller driving a fetch closure on a fixed interval.
pub struct LogPoller<F> {
    fetch: F,
    interval: Duration,
    paused: Arc<AtomicBool>,
}

impl<F, Fut> LogPoller<F>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<Vec<LogEntry>>>,
{
    pub fn new(interval: Duration, fetch: F) -> Self {
        Self {
            fetch,
            interval,
            paused: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn handle(&self) -> PollerHandle {
        PollerHandle {
            paused: self.paused.clone(),
        }
    }

    /// Run until the receiving side closes. Fetch failures are logged and
    /// the loop keeps polling; the next tick may succeed.
    pub async fn run(self, tx: mpsc::Sender<Vec<LogEntry>>) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            if self.paused.load(Ordering::SeqCst) {
                debug!("Log poll paused, skipping tick");
                continue;
            }
            match (self.fetch)().await {
                Ok(entries) => {
                    if tx.send(entries).await.is_err() {
                        // Receiver dropped, stop polling
                        return;
                    }
                }
                Err(e) => warn!(error = %e, "Log poll failed"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn entry(message: &str) -> LogEntry {
        LogEntry {
            timestamp: "2025-06-15T12:00:00Z".to_string(),
            level: Some("INFO".to_string()),
            message: message.to_string(),
        }
    }

    #[test]
    fn test_handle_pause_resume() {
        let poller = LogPoller::new(Duration::from_secs(5), || async { Ok(vec![]) });
        let handle = poller.handle();

        assert!(!handle.is_paused());
        handle.pause();
        assert!(handle.is_paused());
        handle.resume();
        assert!(!handle.is_paused());
    }

    #[tokio::test(start_paused = true)]
    async fn test_poller_delivers_on_each_tick() {
        let fetches = Arc::new(AtomicUsize::new(0));
        let counter = fetches.clone();
        let poller = LogPoller::new(Duration::from_secs(2), move || {
            let counter = counter.clone();
            async move {
                let n = counter.fetch_add(1, Ordering::SeqCst);
                Ok(vec![entry(&format!("tick {}", n))])
            }
        });

        let (tx, mut rx) = mpsc::channel(8);
        tokio::spawn(poller.run(tx));

        // First tick fires immediately, the next after the interval
        let first = rx.recv().await.unwrap();
        assert_eq!(first[0].message, "tick 0");
        let second = rx.recv().await.unwrap();
        assert_eq!(second[0].message, "tick 1");
    }

    #[tokio::test(start_paused = true)]
    async fn test_paused_poller_skips_fetches() {
        let fetches = Arc::new(AtomicUsize::new(0));
        let counter = fetches.clone();
        let poller = LogPoller::new(Duration::from_secs(2), move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(vec![])
            }
        });
        let handle = poller.handle();
        handle.pause();

        let (tx, mut rx) = mpsc::channel(8);
        tokio::spawn(poller.run(tx));

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(fetches.load(Ordering::SeqCst), 0);

        // Resuming picks polling back up on the next tick
        handle.resume();
        assert!(rx.recv().await.is_some());
        assert!(fetches.load(Ordering::SeqCst) >= 1);
    }
}
