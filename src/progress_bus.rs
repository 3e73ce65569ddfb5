//! In-process fan-out of task-progress events to many subscribers (typically
//! WebSocket bridges in the API layer). Resilient to a subscriber that has
//! gone away and to concurrent (un)subscription during a publish.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use dashmap::DashMap;
use serde::Serialize;
use tokio::sync::mpsc;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum ProgressEvent {
    #[serde(rename = "progress")]
    Progress {
        task_id: Uuid,
        status: String,
        total_chapters: i32,
        downloaded_chapters: i32,
        failed_chapters: i32,
        progress: f64,
        error_message: Option<String>,
        book_title: Option<String>,
        timestamp: chrono::DateTime<Utc>,
    },
    #[serde(rename = "completed")]
    Completed {
        task_id: Uuid,
        success: bool,
        message: String,
        book_title: Option<String>,
        timestamp: chrono::DateTime<Utc>,
    },
    #[serde(rename = "error")]
    Error {
        task_id: Uuid,
        error_code: String,
        error_message: String,
        timestamp: chrono::DateTime<Utc>,
    },
}

impl ProgressEvent {
    pub fn progress(
        task_id: Uuid,
        status: &str,
        total_chapters: i32,
        downloaded_chapters: i32,
        failed_chapters: i32,
        progress: f64,
        error_message: Option<String>,
        book_title: Option<String>,
    ) -> Self {
        ProgressEvent::Progress {
            task_id,
            status: status.to_string(),
            total_chapters,
            downloaded_chapters,
            failed_chapters,
            progress,
            error_message,
            book_title,
            timestamp: Utc::now(),
        }
    }

    pub fn completed(task_id: Uuid, success: bool, message: String, book_title: Option<String>) -> Self {
        ProgressEvent::Completed {
            task_id,
            success,
            message,
            book_title,
            timestamp: Utc::now(),
        }
    }

    pub fn error(task_id: Uuid, error_code: &str, error_message: String) -> Self {
        ProgressEvent::Error {
            task_id,
            error_code: error_code.to_string(),
            error_message,
            timestamp: Utc::now(),
        }
    }
}

pub type SubscriberId = u64;

#[derive(Default)]
pub struct ProgressBus {
    subscribers: DashMap<Uuid, DashMap<SubscriberId, mpsc::UnboundedSender<ProgressEvent>>>,
    next_id: AtomicU64,
}

impl ProgressBus {
    pub fn new() -> Self {
        ProgressBus {
            subscribers: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }

    /// Registers a new subscriber for `task_uuid`, returning its id (for
    /// `unsubscribe`) and the receiving half of the channel.
    pub fn subscribe(&self, task_uuid: Uuid) -> (SubscriberId, mpsc::UnboundedReceiver<ProgressEvent>) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.entry(task_uuid).or_default().insert(id, tx);
        (id, rx)
    }

    pub fn unsubscribe(&self, task_uuid: Uuid, id: SubscriberId) {
        if let Some(set) = self.subscribers.get(&task_uuid) {
            set.remove(&id);
        }
    }

    pub fn has_subscribers(&self, task_uuid: Uuid) -> bool {
        self.subscribers
            .get(&task_uuid)
            .map(|set| !set.is_empty())
            .unwrap_or(false)
    }

    /// Publishes to a snapshot of the current subscriber set. A subscriber
    /// whose channel is closed is dropped rather than allowed to poison the
    /// rest of the broadcast.
    #[tracing::instrument(skip(self, event))]
    pub fn publish(&self, task_uuid: Uuid, event: ProgressEvent) {
        let Some(set) = self.subscribers.get(&task_uuid) else {
            return;
        };
        let snapshot: Vec<(SubscriberId, mpsc::UnboundedSender<ProgressEvent>)> = set
            .iter()
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect();
        drop(set);

        let mut dead = Vec::new();
        for (id, tx) in snapshot {
            if tx.send(event.clone()).is_err() {
                dead.push(id);
            }
        }
        if !dead.is_empty() {
            if let Some(set) = self.subscribers.get(&task_uuid) {
                for id in dead {
                    set.remove(&id);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn publish_without_subscribers_is_a_no_op() {
        let bus = ProgressBus::new();
        bus.publish(Uuid::nil(), ProgressEvent::error(Uuid::nil(), "x", "y".to_string()));
    }

    #[tokio::test]
    async fn subscriber_receives_published_event() {
        let bus = ProgressBus::new();
        let task_uuid = Uuid::new_v4();
        let (_id, mut rx) = bus.subscribe(task_uuid);
        assert!(bus.has_subscribers(task_uuid));

        bus.publish(task_uuid, ProgressEvent::progress(task_uuid, "running", 10, 3, 0, 30.0, None, None));
        let event = rx.recv().await.unwrap();
        match event {
            ProgressEvent::Progress { downloaded_chapters, .. } => assert_eq!(downloaded_chapters, 3),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn unsubscribe_stops_delivery_and_drops_the_channel() {
        let bus = ProgressBus::new();
        let task_uuid = Uuid::new_v4();
        let (id, mut rx) = bus.subscribe(task_uuid);
        bus.unsubscribe(task_uuid, id);
        assert!(!bus.has_subscribers(task_uuid));

        bus.publish(task_uuid, ProgressEvent::completed(task_uuid, true, "done".to_string(), None));
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn dead_subscriber_is_pruned_on_next_publish() {
        let bus = ProgressBus::new();
        let task_uuid = Uuid::new_v4();
        let (_id, rx) = bus.subscribe(task_uuid);
        drop(rx);

        bus.publish(task_uuid, ProgressEvent::error(task_uuid, "x", "y".to_string()));
        assert!(!bus.has_subscribers(task_uuid));
    }

    #[tokio::test]
    async fn independent_tasks_do_not_cross_talk() {
        let bus = ProgressBus::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let (_id_a, mut rx_a) = bus.subscribe(a);
        let (_id_b, mut rx_b) = bus.subscribe(b);

        bus.publish(a, ProgressEvent::error(a, "x", "only for a".to_string()));
        assert!(rx_a.recv().await.is_some());
        assert!(rx_b.try_recv().is_err());
    }
}
