use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicU64, Ordering},
        Mutex, MutexGuard, PoisonError,
    },
    time::Duration,
};

use chrono::{DateTime, Utc};
use tokio::sync::broadcast;
use tracing::debug;

use crate::{messages, ClientEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationContent {
    MessageId(&'static str),
    Text(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub id: u64,
    pub kind: NotificationKind,
    pub content: NotificationContent,
    pub created_at: DateTime<Utc>,
    pub lifetime: Duration,
}

impl Notification {
    /// Display text: catalog keys resolve to their default text, unknown keys show as-is.
    pub fn text(&self) -> String {
        match &self.content {
            NotificationContent::MessageId(key) => messages::default_text(key)
                .map(str::to_string)
                .unwrap_or_else(|| (*key).to_string()),
            NotificationContent::Text(text) => text.clone(),
        }
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        let lifetime = chrono::Duration::from_std(self.lifetime).unwrap_or(chrono::Duration::MAX);
        self.created_at
            .checked_add_signed(lifetime)
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at()
    }
}

/// Queue of user-visible notifications.
///
/// `emit` never waits on a consumer: the notification is queued and broadcast,
/// and display or dismissal happens elsewhere.
pub struct NotificationCenter {
    queue: Mutex<VecDeque<Notification>>,
    next_id: AtomicU64,
    lifetime: Duration,
    events: broadcast::Sender<ClientEvent>,
}

impl NotificationCenter {
    pub fn new(lifetime: Duration, events: broadcast::Sender<ClientEvent>) -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            next_id: AtomicU64::new(1),
            lifetime,
            events,
        }
    }

    pub fn success(&self, key: &'static str) -> Notification {
        self.emit(NotificationKind::Success, NotificationContent::MessageId(key))
    }

    pub fn error_text(&self, text: impl Into<String>) -> Notification {
        self.emit(NotificationKind::Error, NotificationContent::Text(text.into()))
    }

    pub fn error_key(&self, key: &'static str) -> Notification {
        self.emit(NotificationKind::Error, NotificationContent::MessageId(key))
    }

    pub fn emit(&self, kind: NotificationKind, content: NotificationContent) -> Notification {
        let notification = Notification {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            kind,
            content,
            created_at: Utc::now(),
            lifetime: self.lifetime,
        };
        debug!(
            id = notification.id,
            kind = ?notification.kind,
            text = %notification.text(),
            "notification: queued"
        );
        self.queue().push_back(notification.clone());
        let _ = self
            .events
            .send(ClientEvent::Notification(notification.clone()));
        notification
    }

    pub fn snapshot(&self) -> Vec<Notification> {
        self.queue().iter().cloned().collect()
    }

    pub fn dismiss(&self, id: u64) -> Option<Notification> {
        let mut queue = self.queue();
        let index = queue.iter().position(|n| n.id == id)?;
        queue.remove(index)
    }

    /// Drops every notification whose lifetime has elapsed and returns them.
    pub fn prune_expired(&self, now: DateTime<Utc>) -> Vec<Notification> {
        let mut queue = self.queue();
        let (expired, alive): (Vec<_>, Vec<_>) =
            queue.drain(..).partition(|n| n.is_expired(now));
        queue.extend(alive);
        expired
    }

    fn queue(&self) -> MutexGuard<'_, VecDeque<Notification>> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn center(lifetime: Duration) -> (NotificationCenter, broadcast::Receiver<ClientEvent>) {
        let (tx, rx) = broadcast::channel(16);
        (NotificationCenter::new(lifetime, tx), rx)
    }

    #[test]
    fn emit_queues_and_broadcasts() {
        let (center, mut rx) = center(Duration::from_secs(5));
        let shown = center.success(messages::ADD_PATTERN_SUCCESS);

        assert_eq!(center.snapshot(), vec![shown.clone()]);
        match rx.try_recv().expect("broadcast") {
            ClientEvent::Notification(n) => assert_eq!(n.id, shown.id),
            other => panic!("unexpected event: {other:?}"),
        }
        assert_eq!(shown.text(), "Pattern rule has been created successfully");
    }

    #[test]
    fn dismiss_removes_only_the_target() {
        let (center, _rx) = center(Duration::from_secs(5));
        let first = center.error_text("conflict");
        let second = center.success(messages::UPDATE_PATTERN_SUCCESS);

        assert_eq!(center.dismiss(first.id).map(|n| n.id), Some(first.id));
        assert!(center.dismiss(first.id).is_none());
        assert_eq!(center.snapshot(), vec![second]);
    }

    #[test]
    fn prune_expired_respects_lifetime() {
        let (center, _rx) = center(Duration::from_millis(100));
        let shown = center.error_text("boom");

        assert!(center.prune_expired(shown.created_at).is_empty());
        let later = shown.created_at + chrono::Duration::milliseconds(100);
        assert_eq!(center.prune_expired(later).len(), 1);
        assert!(center.snapshot().is_empty());
    }
}
