//! Notification slice
//!
//! Newest-first list of alerts, capped at [`MAX_NOTIFICATIONS`]. Adding past
//! the cap evicts the oldest entries.

use super::{ReduceContext, Slice};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Maximum number of notifications kept
pub const MAX_NOTIFICATIONS: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    PriceAlert,
    WeatherAlert,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub read: bool,
}

impl Notification {
    /// New unread notification with a fresh ID
    pub fn new(
        kind: NotificationKind,
        title: impl Into<String>,
        message: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            kind,
            title: title.into(),
            message: message.into(),
            timestamp,
            read: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NotificationState {
    pub notifications: Vec<Notification>,
}

impl NotificationState {
    pub fn unread_count(&self) -> usize {
        self.notifications.iter().filter(|n| !n.read).count()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum NotificationAction {
    Add(Notification),
    MarkAsRead(String),
    MarkAllAsRead,
    Clear,
}

impl NotificationAction {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Add(_) => "notifications/addNotification",
            Self::MarkAsRead(_) => "notifications/markAsRead",
            Self::MarkAllAsRead => "notifications/markAllAsRead",
            Self::Clear => "notifications/clearNotifications",
        }
    }
}

impl Slice for NotificationState {
    type Action = NotificationAction;

    fn reduce(&mut self, action: NotificationAction, _ctx: &ReduceContext<'_>) {
        match action {
            NotificationAction::Add(notification) => {
                self.notifications.insert(0, notification);
                self.notifications.truncate(MAX_NOTIFICATIONS);
            }
            NotificationAction::MarkAsRead(id) => {
                if let Some(n) = self.notifications.iter_mut().find(|n| n.id == id) {
                    n.read = true;
                }
            }
            NotificationAction::MarkAllAsRead => {
                for n in &mut self.notifications {
                    n.read = true;
                }
            }
            NotificationAction::Clear => self.notifications.clear(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prefs::Preferences;

    fn alert(title: &str) -> Notification {
        Notification::new(NotificationKind::PriceAlert, title, "moved", Utc::now())
    }

    #[test]
    fn test_capped_newest_first() {
        let prefs = Preferences::unavailable();
        let ctx = ReduceContext::new(&prefs, Utc::now());
        let mut state = NotificationState::default();

        for i in 0..45 {
            state.reduce(NotificationAction::Add(alert(&format!("alert {}", i))), &ctx);
            assert!(state.notifications.len() <= MAX_NOTIFICATIONS);
            assert_eq!(state.notifications[0].title, format!("alert {}", i));
        }

        assert_eq!(state.notifications.len(), MAX_NOTIFICATIONS);
        // Oldest surviving entry is the 20th most recent
        assert_eq!(state.notifications[19].title, "alert 25");
    }

    #[test]
    fn test_mark_as_read() {
        let prefs = Preferences::unavailable();
        let ctx = ReduceContext::new(&prefs, Utc::now());
        let mut state = NotificationState::default();

        let first = alert("a");
        let id = first.id.clone();
        state.reduce(NotificationAction::Add(first), &ctx);
        state.reduce(NotificationAction::Add(alert("b")), &ctx);
        assert_eq!(state.unread_count(), 2);

        state.reduce(NotificationAction::MarkAsRead(id), &ctx);
        assert_eq!(state.unread_count(), 1);

        state.reduce(NotificationAction::MarkAsRead("missing".into()), &ctx);
        assert_eq!(state.unread_count(), 1);

        state.reduce(NotificationAction::MarkAllAsRead, &ctx);
        assert_eq!(state.unread_count(), 0);

        state.reduce(NotificationAction::Clear, &ctx);
        assert!(state.notifications.is_empty());
    }

    #[test]
    fn test_notification_serializes_type_tag() {
        let n = Notification::new(NotificationKind::WeatherAlert, "Weather Alert: Tokyo", "Heat wave warning", Utc::now());
        let json = serde_json::to_string(&n).unwrap();
        assert!(json.contains("\"type\":\"weather_alert\""));
        assert!(json.contains("\"read\":false"));
    }
}
