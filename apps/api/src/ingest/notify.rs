//! Notifier: the observable side of every pipeline transition and failure.
//!
//! Notifications are mirrored to `tracing`, broadcast to live subscribers, and kept in
//! a short in-memory log so a polling client can catch up.

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::ingest::orchestrator::RunId;

const RECENT_CAPACITY: usize = 50;
const CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationLevel {
    Info,
    Error,
}

#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    pub run_id: RunId,
    pub level: NotificationLevel,
    pub title: String,
    pub description: String,
    pub at: DateTime<Utc>,
}

pub struct Notifier {
    sender: broadcast::Sender<Notification>,
    recent: Mutex<VecDeque<Notification>>,
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Notifier {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            sender,
            recent: Mutex::new(VecDeque::with_capacity(RECENT_CAPACITY)),
        }
    }

    /// Receives every notification published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.sender.subscribe()
    }

    pub fn publish(
        &self,
        run_id: RunId,
        level: NotificationLevel,
        title: &str,
        description: impl Into<String>,
    ) {
        let notification = Notification {
            run_id,
            level,
            title: title.to_string(),
            description: description.into(),
            at: Utc::now(),
        };

        match level {
            NotificationLevel::Info => {
                info!(run_id, title, description = %notification.description, "notification")
            }
            NotificationLevel::Error => {
                warn!(run_id, title, description = %notification.description, "notification")
            }
        }

        {
            let mut recent = self.recent.lock().unwrap_or_else(PoisonError::into_inner);
            if recent.len() == RECENT_CAPACITY {
                recent.pop_front();
            }
            recent.push_back(notification.clone());
        }

        // No live subscribers is fine: the recent log still holds the notification.
        let _ = self.sender.send(notification);
    }

    /// Oldest first.
    pub fn recent(&self) -> Vec<Notification> {
        self.recent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }
}
