//! Fetch lifecycle bookkeeping shared by every polled slice.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Loading, error and freshness flags for one data domain
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FetchMeta {
    /// True only while a cold load is in flight
    pub loading: bool,
    /// Message of the last failed fetch, cleared when a new fetch starts
    pub error: Option<String>,
    /// When the last successful fetch completed
    pub last_updated: Option<DateTime<Utc>>,
}

impl FetchMeta {
    /// A fetch attempt started
    ///
    /// `cold` must be true only when the domain has no cached data, so
    /// background refreshes never put already-rendered data behind a
    /// loading state.
    pub fn begin(&mut self, cold: bool) {
        self.error = None;
        if cold {
            self.loading = true;
        }
    }

    /// A fetch completed successfully at `now`
    pub fn succeed(&mut self, now: DateTime<Utc>) {
        self.loading = false;
        self.stamp(now);
    }

    /// A fetch failed; data is left as it was
    pub fn fail(&mut self, message: impl Into<String>) {
        self.loading = false;
        self.error = Some(message.into());
    }

    /// Record a successful update without touching the loading flag
    ///
    /// Never moves `last_updated` backwards.
    pub fn stamp(&mut self, now: DateTime<Utc>) {
        self.last_updated = Some(match self.last_updated {
            Some(previous) if previous > now => previous,
            _ => now,
        });
    }
}
