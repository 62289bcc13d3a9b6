//! Refresh Scheduler
//!
//! One repeating timer per polled domain. Starting the scheduler fetches
//! every domain immediately, then each timer fires on its own period. Each
//! tick runs its fetch as a separate task, so stopping the timers leaves
//! in-flight fetches to complete and apply.

use crate::fetch::Fetcher;
use crate::state::Domain;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Timer periods per polled domain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshIntervals {
    pub weather: Duration,
    pub crypto: Duration,
    pub news: Duration,
}

impl Default for RefreshIntervals {
    fn default() -> Self {
        Self {
            weather: Duration::from_secs(60),
            crypto: Duration::from_secs(60),
            news: Duration::from_secs(120),
        }
    }
}

impl RefreshIntervals {
    pub fn for_domain(&self, domain: Domain) -> Option<Duration> {
        match domain {
            Domain::Weather => Some(self.weather),
            Domain::Crypto => Some(self.crypto),
            Domain::News => Some(self.news),
            Domain::Notifications => None,
        }
    }
}

/// Result of a manual refresh request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// Every domain was refreshed
    Completed,
    /// Another manual refresh was already running
    Skipped,
}

/// Periodic refresh of every polled domain
pub struct RefreshScheduler {
    fetcher: Fetcher,
    intervals: RefreshIntervals,
    timers: Mutex<Vec<JoinHandle<()>>>,
    refreshing: Arc<AtomicBool>,
}

/// Clears the refreshing flag when a manual refresh ends, even on panic
struct RefreshGuard(Arc<AtomicBool>);

impl Drop for RefreshGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl RefreshScheduler {
    pub fn new(fetcher: Fetcher, intervals: RefreshIntervals) -> Self {
        Self {
            fetcher,
            intervals,
            timers: Mutex::new(Vec::new()),
            refreshing: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn intervals(&self) -> &RefreshIntervals {
        &self.intervals
    }

    /// Start one timer per domain
    ///
    /// The first tick of each timer fires immediately. Calling `start` on a
    /// running scheduler replaces its timers.
    pub fn start(&self) {
        let mut timers = self.timers.lock().unwrap_or_else(PoisonError::into_inner);
        for handle in timers.drain(..) {
            handle.abort();
        }

        for domain in Domain::POLLED {
            let Some(period) = self.intervals.for_domain(domain) else {
                continue;
            };

            tracing::info!(
                domain = %domain,
                interval_secs = period.as_secs(),
                "Starting refresh timer"
            );

            let fetcher = self.fetcher.clone();
            timers.push(tokio::spawn(async move {
                let mut ticker = tokio::time::interval(period);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

                loop {
                    ticker.tick().await;
                    tracing::debug!(domain = %domain, "Scheduled refresh");

                    let fetcher = fetcher.clone();
                    tokio::spawn(async move { fetcher.refresh(domain).await });
                }
            }));
        }
    }

    /// Cancel every timer; in-flight fetches still complete
    pub fn stop(&self) {
        let mut timers = self.timers.lock().unwrap_or_else(PoisonError::into_inner);
        if timers.is_empty() {
            return;
        }

        for handle in timers.drain(..) {
            handle.abort();
        }
        tracing::info!("Refresh timers stopped");
    }

    /// Whether timers are active
    pub fn is_running(&self) -> bool {
        !self
            .timers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_empty()
    }

    /// Whether a manual refresh is in flight
    pub fn is_refreshing(&self) -> bool {
        self.refreshing.load(Ordering::SeqCst)
    }

    /// Refresh every domain now, concurrently
    ///
    /// Returns [`RefreshOutcome::Skipped`] without doing anything when a
    /// manual refresh is already running.
    pub async fn refresh_all(&self) -> RefreshOutcome {
        if self
            .refreshing
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            tracing::debug!("Manual refresh already running");
            return RefreshOutcome::Skipped;
        }
        let _guard = RefreshGuard(self.refreshing.clone());

        tracing::info!("Manual refresh started");
        tokio::join!(
            self.fetcher.refresh(Domain::Weather),
            self.fetcher.refresh(Domain::Crypto),
            self.fetcher.refresh(Domain::News),
        );
        tracing::info!("Manual refresh finished");

        RefreshOutcome::Completed
    }
}

impl Drop for RefreshScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}
