//! Pipeline event broadcaster.
//!
//! Delivery is lossy and fire-and-forget: slow subscribers miss events
//! and nothing blocks when nobody listens.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::matching::MatchRunSummary;
use crate::models::{Task, TaskStatus};

/// A task changed status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskUpdatedEvent {
    pub task_id: String,
    pub status: TaskStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl TaskUpdatedEvent {
    pub fn from_task(task: &Task) -> Self {
        Self {
            task_id: task.id.clone(),
            status: task.status,
            profile_id: task.profile_id.clone(),
            error: task.error.clone(),
            timestamp: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PipelineEvent {
    TaskUpdated(TaskUpdatedEvent),
    MatchRunCompleted(MatchRunSummary),
}

/// Broadcasts pipeline events to any number of subscribers.
#[derive(Clone)]
pub struct EventBroadcaster {
    sender: Arc<broadcast::Sender<PipelineEvent>>,
}

impl EventBroadcaster {
    /// Creates a broadcaster buffering up to `capacity` events per
    /// subscriber (at least one).
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender: Arc::new(sender),
        }
    }

    pub fn send(&self, event: PipelineEvent) {
        // No active receivers is fine.
        let _ = self.sender.send(event);
    }

    pub fn task_updated(&self, task: &Task) {
        self.send(PipelineEvent::TaskUpdated(TaskUpdatedEvent::from_task(task)));
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PipelineEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBroadcaster {
    fn default() -> Self {
        Self::new(256)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscriber_receives_task_update() {
        let broadcaster = EventBroadcaster::new(16);
        let mut rx = broadcaster.subscribe();

        let mut task = Task::document_parse("/uploads/a.pdf");
        task.start_processing().unwrap();
        broadcaster.task_updated(&task);

        match rx.recv().await.unwrap() {
            PipelineEvent::TaskUpdated(event) => {
                assert_eq!(event.task_id, task.id);
                assert_eq!(event.status, TaskStatus::Processing);
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn test_send_without_subscribers_is_silent() {
        let broadcaster = EventBroadcaster::new(4);
        assert_eq!(broadcaster.subscriber_count(), 0);
        broadcaster.task_updated(&Task::document_parse("/uploads/a.pdf"));
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let broadcaster = EventBroadcaster::new(0);
        let _rx = broadcaster.subscribe();
        assert_eq!(broadcaster.subscriber_count(), 1);
    }

    #[test]
    fn test_event_is_tagged() {
        let task = Task::document_parse("/uploads/a.pdf");
        let json =
            serde_json::to_value(PipelineEvent::TaskUpdated(TaskUpdatedEvent::from_task(&task)))
                .unwrap();
        assert_eq!(json["type"], "task_updated");
        assert_eq!(json["status"], "pending");
    }
}
