//! Data status
//!
//! Freshness and error summary per polled domain, as shown by the status
//! indicator.

use crate::state::{Domain, FetchMeta};
use crate::store::AppState;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

/// Human-readable age of the last update
pub fn time_since_update(last_updated: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    let Some(last) = last_updated else {
        return "Never".to_string();
    };

    let secs = (now - last).num_seconds().max(0);
    if secs < 60 {
        format!("{}s ago", secs)
    } else if secs < 3600 {
        format!("{}m ago", secs / 60)
    } else {
        format!("{}h ago", secs / 3600)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DomainStatus {
    pub domain: Domain,
    pub last_updated: Option<DateTime<Utc>>,
    pub last_updated_label: String,
    pub loading: bool,
    pub error: Option<String>,
}

impl DomainStatus {
    fn from_meta(domain: Domain, meta: &FetchMeta, now: DateTime<Utc>) -> Self {
        Self {
            domain,
            last_updated: meta.last_updated,
            last_updated_label: time_since_update(meta.last_updated, now),
            loading: meta.loading,
            error: meta.error.clone(),
        }
    }

    /// "Error" when the last fetch failed, else the update age
    pub fn label(&self) -> &str {
        if self.error.is_some() {
            "Error"
        } else {
            &self.last_updated_label
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataStatus {
    pub domains: Vec<DomainStatus>,
    pub is_refreshing: bool,
    pub unread_notifications: usize,
}

impl DataStatus {
    pub fn collect(state: &AppState, now: DateTime<Utc>, is_refreshing: bool) -> Self {
        let domains = Domain::POLLED
            .iter()
            .filter_map(|domain| {
                let meta = match domain {
                    Domain::Weather => &state.weather.meta,
                    Domain::Crypto => &state.crypto.meta,
                    Domain::News => &state.news.meta,
                    Domain::Notifications => return None,
                };
                Some(DomainStatus::from_meta(*domain, meta, now))
            })
            .collect();

        Self {
            domains,
            is_refreshing,
            unread_notifications: state.notifications.unread_count(),
        }
    }

    pub fn get(&self, domain: Domain) -> Option<&DomainStatus> {
        self.domains.iter().find(|d| d.domain == domain)
    }
}

impl fmt::Display for DataStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Data Status{}", if self.is_refreshing { " (refreshing)" } else { "" })?;
        for status in &self.domains {
            write!(f, "  {:<8} {}", format!("{}:", status.domain), status.label())?;
            if let Some(error) = &status.error {
                write!(f, " ({})", error)?;
            }
            writeln!(f)?;
        }
        write!(f, "  Unread notifications: {}", self.unread_notifications)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_time_since_update() {
        let now = Utc::now();
        assert_eq!(time_since_update(None, now), "Never");
        assert_eq!(time_since_update(Some(now), now), "0s ago");
        assert_eq!(time_since_update(Some(now - Duration::seconds(59)), now), "59s ago");
        assert_eq!(time_since_update(Some(now - Duration::seconds(60)), now), "1m ago");
        assert_eq!(time_since_update(Some(now - Duration::seconds(3599)), now), "59m ago");
        assert_eq!(time_since_update(Some(now - Duration::hours(5)), now), "5h ago");
        // Clock skew never yields a negative age
        assert_eq!(time_since_update(Some(now + Duration::seconds(5)), now), "0s ago");
    }

    #[test]
    fn test_collect_reports_errors_per_domain() {
        let now = Utc::now();
        let mut state = AppState::default();
        state.crypto.meta.last_updated = Some(now - Duration::seconds(90));
        state.weather.meta.error = Some("Failed to generate weather data for London".into());

        let status = DataStatus::collect(&state, now, true);

        assert_eq!(status.domains.len(), 3);
        assert!(status.is_refreshing);
        assert_eq!(status.get(Domain::Crypto).map(|d| d.label()), Some("1m ago"));
        assert_eq!(status.get(Domain::Weather).map(|d| d.label()), Some("Error"));
        assert_eq!(status.get(Domain::News).map(|d| d.label()), Some("Never"));
        assert!(status.get(Domain::Notifications).is_none());
    }

    #[test]
    fn test_display() {
        let status = DataStatus::collect(&AppState::default(), Utc::now(), false);
        let text = status.to_string();
        assert!(text.starts_with("Data Status\n"));
        assert!(text.contains("crypto:  Never"));
        assert!(text.ends_with("Unread notifications: 0"));
    }
}
