//! In-process notification store with WebSocket fan-out.
//!
//! Notifications live only in memory: each user keeps at most
//! [`MAX_NOTIFICATIONS_PER_USER`] entries, newest first, and entries expire
//! [`NOTIFICATION_TTL_HOURS`] hours after creation. Every open socket of a
//! recipient receives `{"type":"notification","data":...}` as soon as the
//! notification is stored; delivery is best effort.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};

use crate::domain::types::{NotificationId, UserId};

pub const NOTIFICATION_TTL_HOURS: i64 = 24;
pub const MAX_NOTIFICATIONS_PER_USER: usize = 100;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum NotificationType {
    Info,
    Request,
    Action,
}

#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: NotificationId,
    pub user_id: UserId,
    pub title: String,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: NotificationType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub read: bool,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub expires_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
}

/// Content shared by every recipient of one notification.
#[derive(Clone, Debug)]
pub struct NotificationInput {
    pub title: String,
    pub message: String,
    pub kind: NotificationType,
    pub entity: Option<String>,
    pub record_id: Option<String>,
    pub meta: Option<Value>,
}

impl NotificationInput {
    pub fn new(kind: NotificationType, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            kind,
            entity: None,
            record_id: None,
            meta: None,
        }
    }

    pub fn record(mut self, entity: impl Into<String>, record_id: impl ToString) -> Self {
        self.entity = Some(entity.into());
        self.record_id = Some(record_id.to_string());
        self
    }

    pub fn meta(mut self, meta: Value) -> Self {
        self.meta = Some(meta);
        self
    }
}

#[derive(Serialize)]
struct Envelope<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    data: &'a Notification,
}

/// Identifies one attached socket of a user.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SocketId(u64);

#[derive(Default)]
struct HubState {
    notifications: HashMap<UserId, Vec<Notification>>,
    sockets: HashMap<UserId, HashMap<SocketId, UnboundedSender<String>>>,
    next_socket: u64,
}

impl HubState {
    fn prune(&mut self, user_id: UserId, now: DateTime<Utc>) {
        if let Some(list) = self.notifications.get_mut(&user_id) {
            list.retain(|n| n.expires_at > now);
        }
    }

    fn send(&mut self, user_id: UserId, payload: &str) {
        if let Some(sockets) = self.sockets.get_mut(&user_id) {
            sockets.retain(|_, tx| tx.send(payload.to_string()).is_ok());
            if sockets.is_empty() {
                self.sockets.remove(&user_id);
            }
        }
    }
}

/// Shared handle to the notification store and the socket registry.
#[derive(Clone, Default)]
pub struct NotificationHub {
    state: Arc<Mutex<HubState>>,
}

impl NotificationHub {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HubState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Stores one notification per recipient and pushes it to their sockets.
    pub fn add_for_users(&self, user_ids: &[UserId], input: &NotificationInput) {
        self.add_for_users_at(user_ids, input, Utc::now());
    }

    pub fn add_for_users_at(
        &self,
        user_ids: &[UserId],
        input: &NotificationInput,
        now: DateTime<Utc>,
    ) {
        let mut state = self.lock();
        for &user_id in user_ids {
            let notification = Notification {
                id: NotificationId::new(),
                user_id,
                title: input.title.clone(),
                message: input.message.clone(),
                kind: input.kind,
                entity: input.entity.clone(),
                record_id: input.record_id.clone(),
                created_at: now,
                read: false,
                expires_at: now + Duration::hours(NOTIFICATION_TTL_HOURS),
                meta: input.meta.clone(),
            };

            let payload = serde_json::to_string(&Envelope {
                kind: "notification",
                data: &notification,
            });

            let list = state.notifications.entry(user_id).or_default();
            list.insert(0, notification);
            list.truncate(MAX_NOTIFICATIONS_PER_USER);

            match payload {
                Ok(payload) => state.send(user_id, &payload),
                Err(e) => log::error!("Failed to encode notification: {e}"),
            }
        }
    }

    /// Unexpired notifications of `user_id`, newest first.
    pub fn list(&self, user_id: UserId) -> Vec<Notification> {
        self.list_at(user_id, Utc::now())
    }

    pub fn list_at(&self, user_id: UserId, now: DateTime<Utc>) -> Vec<Notification> {
        let mut state = self.lock();
        state.prune(user_id, now);
        let mut list = state
            .notifications
            .get(&user_id)
            .cloned()
            .unwrap_or_default();
        list.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        list
    }

    pub fn mark_all_read(&self, user_id: UserId) {
        self.mark_all_read_at(user_id, Utc::now());
    }

    pub fn mark_all_read_at(&self, user_id: UserId, now: DateTime<Utc>) {
        let mut state = self.lock();
        state.prune(user_id, now);
        if let Some(list) = state.notifications.get_mut(&user_id) {
            list.iter_mut().for_each(|n| n.read = true);
        }
    }

    pub fn clear(&self, user_id: UserId) {
        self.lock().notifications.remove(&user_id);
    }

    /// Registers a socket of `user_id`; messages for the user arrive on the
    /// returned receiver until [`NotificationHub::detach`] is called.
    pub fn attach(&self, user_id: UserId) -> (SocketId, UnboundedReceiver<String>) {
        let (tx, rx) = unbounded_channel();
        let mut state = self.lock();
        state.next_socket += 1;
        let socket_id = SocketId(state.next_socket);
        state.sockets.entry(user_id).or_default().insert(socket_id, tx);
        (socket_id, rx)
    }

    pub fn detach(&self, user_id: UserId, socket_id: SocketId) {
        let mut state = self.lock();
        if let Some(sockets) = state.sockets.get_mut(&user_id) {
            sockets.remove(&socket_id);
            if sockets.is_empty() {
                state.sockets.remove(&user_id);
            }
        }
    }

    pub fn socket_count(&self, user_id: UserId) -> usize {
        self.lock().sockets.get(&user_id).map_or(0, HashMap::len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(title: &str) -> NotificationInput {
        NotificationInput::new(NotificationType::Info, title, "message")
    }

    #[test]
    fn notifications_are_listed_newest_first() {
        let hub = NotificationHub::new();
        let user = UserId::new();
        let now = Utc::now();

        hub.add_for_users_at(&[user], &info("first"), now);
        hub.add_for_users_at(&[user], &info("second"), now + Duration::seconds(1));

        let titles: Vec<_> = hub
            .list_at(user, now + Duration::seconds(2))
            .into_iter()
            .map(|n| n.title)
            .collect();
        assert_eq!(titles, vec!["second", "first"]);
    }

    #[test]
    fn each_user_keeps_at_most_one_hundred() {
        let hub = NotificationHub::new();
        let user = UserId::new();
        let now = Utc::now();

        for i in 0..120 {
            hub.add_for_users_at(&[user], &info(&format!("n{i}")), now);
        }

        let list = hub.list_at(user, now);
        assert_eq!(list.len(), MAX_NOTIFICATIONS_PER_USER);
        assert_eq!(list[0].title, "n119");
    }

    #[test]
    fn expired_notifications_are_pruned_on_read() {
        let hub = NotificationHub::new();
        let user = UserId::new();
        let now = Utc::now();

        hub.add_for_users_at(&[user], &info("old"), now);

        assert_eq!(hub.list_at(user, now + Duration::hours(23)).len(), 1);
        assert!(hub.list_at(user, now + Duration::hours(24)).is_empty());
    }

    #[test]
    fn mark_read_and_clear() {
        let hub = NotificationHub::new();
        let user = UserId::new();
        let other = UserId::new();

        hub.add_for_users(&[user, other], &info("hello"));
        hub.mark_all_read(user);

        assert!(hub.list(user).iter().all(|n| n.read));
        assert!(hub.list(other).iter().all(|n| !n.read));

        hub.clear(user);
        assert!(hub.list(user).is_empty());
        assert_eq!(hub.list(other).len(), 1);
    }

    #[test]
    fn attached_sockets_receive_envelopes() {
        let hub = NotificationHub::new();
        let user = UserId::new();
        let (socket, mut rx) = hub.attach(user);

        hub.add_for_users(&[user], &info("pushed").record("Client", "c1"));

        let raw = rx.try_recv().unwrap();
        let value: Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["type"], "notification");
        assert_eq!(value["data"]["title"], "pushed");
        assert_eq!(value["data"]["type"], "INFO");
        assert_eq!(value["data"]["recordId"], "c1");
        assert!(value["data"]["expiresAt"].is_i64());

        hub.detach(user, socket);
        assert_eq!(hub.socket_count(user), 0);
    }

    #[test]
    fn closed_sockets_are_dropped_on_send() {
        let hub = NotificationHub::new();
        let user = UserId::new();
        let (_, rx) = hub.attach(user);
        drop(rx);

        hub.add_for_users(&[user], &info("lost"));

        assert_eq!(hub.socket_count(user), 0);
        assert_eq!(hub.list(user).len(), 1);
    }
}
