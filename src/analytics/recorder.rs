//! Fire-and-forget click recording.
//!
//! The redirect path hands click events to a bounded mpsc channel and returns
//! immediately. A single actor task drains the channel and appends each event
//! to storage with one best-effort attempt. Failures are logged and dropped so
//! analytics can never delay or fail a redirect.

use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::models::ClickMetadata;
use crate::storage::{Storage, StorageError};

/// A click waiting to be persisted
#[derive(Debug, Clone)]
pub struct PendingClick {
    pub link_id: i64,
    pub clicked_at: i64,
    pub metadata: ClickMetadata,
}

enum RecorderMessage {
    Record(PendingClick),
    /// Acknowledged once every message queued before it has been handled
    Flush(oneshot::Sender<()>),
    Shutdown,
}

struct RecorderActor {
    receiver: mpsc::Receiver<RecorderMessage>,
    storage: Arc<dyn Storage>,
}

impl RecorderActor {
    async fn run(mut self) {
        while let Some(msg) = self.receiver.recv().await {
            match msg {
                RecorderMessage::Record(click) => self.persist(click).await,
                RecorderMessage::Flush(ack) => {
                    let _ = ack.send(());
                }
                RecorderMessage::Shutdown => {
                    info!("Click recorder received shutdown signal, draining queue...");
                    self.receiver.close();
                    while let Some(msg) = self.receiver.recv().await {
                        match msg {
                            RecorderMessage::Record(click) => self.persist(click).await,
                            RecorderMessage::Flush(ack) => {
                                let _ = ack.send(());
                            }
                            RecorderMessage::Shutdown => {}
                        }
                    }
                    break;
                }
            }
        }

        debug!("Click recorder stopped");
    }

    async fn persist(&self, click: PendingClick) {
        match self
            .storage
            .insert_click(click.link_id, &click.metadata, click.clicked_at)
            .await
        {
            Ok(event) => {
                debug!(link_id = event.link_id, click_id = event.id, "Recorded click");
            }
            Err(StorageError::NotFound) => {
                warn!(link_id = click.link_id, "Dropping click for missing link");
            }
            Err(e) => {
                warn!(link_id = click.link_id, error = %e, "Failed to record click");
            }
        }
    }
}

/// Handle for queueing click events; cheap to share behind an `Arc`
pub struct ClickRecorder {
    sender: mpsc::Sender<RecorderMessage>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl ClickRecorder {
    pub const DEFAULT_BUFFER_SIZE: usize = 10_000;

    /// Spawn the recorder task. Must be called inside a Tokio runtime.
    pub fn new(storage: Arc<dyn Storage>, buffer_size: usize) -> Self {
        let (sender, receiver) = mpsc::channel(buffer_size.max(1));

        let actor = RecorderActor { receiver, storage };
        let task = tokio::spawn(actor.run());

        Self {
            sender,
            task: Mutex::new(Some(task)),
        }
    }

    /// Queue a click without waiting. Returns false when the click was dropped
    /// because the queue is full or the recorder has shut down.
    pub fn record(&self, link_id: i64, metadata: ClickMetadata) -> bool {
        let click = PendingClick {
            link_id,
            clicked_at: chrono::Utc::now().timestamp(),
            metadata,
        };

        match self.sender.try_send(RecorderMessage::Record(click)) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!(link_id, "Click queue full, dropping click");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                warn!(link_id, "Click recorder stopped, dropping click");
                false
            }
        }
    }

    /// Wait until every click queued before this call has been attempted
    pub async fn flush(&self) {
        let (ack_tx, ack_rx) = oneshot::channel();
        if self.sender.send(RecorderMessage::Flush(ack_tx)).await.is_ok() {
            let _ = ack_rx.await;
        }
    }

    /// Drain queued clicks and stop the recorder task
    pub async fn shutdown(&self) {
        let _ = self.sender.send(RecorderMessage::Shutdown).await;

        if let Some(task) = self.task.lock().await.take() {
            if let Err(e) = task.await {
                warn!(error = %e, "Click recorder task ended abnormally");
            }
        }

        info!("Click recorder shut down");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewLink;
    use crate::storage::SqliteStorage;

    async fn setup() -> (Arc<dyn Storage>, i64) {
        let storage = SqliteStorage::new("sqlite::memory:", 5).await.unwrap();
        storage.init().await.unwrap();
        let storage: Arc<dyn Storage> = Arc::new(storage);

        let link = storage
            .create_link(&NewLink {
                keyword: "test123".to_string(),
                url: "https://example.com".to_string(),
                title: None,
                description: None,
                category: "General".to_string(),
                created_by: "anonymous".to_string(),
            })
            .await
            .unwrap();

        (storage, link.id)
    }

    #[tokio::test]
    async fn test_recorder_persists_clicks() {
        let (storage, link_id) = setup().await;
        let recorder = ClickRecorder::new(Arc::clone(&storage), 100);

        let metadata = ClickMetadata {
            ip_address: Some("203.0.113.7".to_string()),
            user_agent: Some("curl/8.0".to_string()),
            referrer: None,
        };
        assert!(recorder.record(link_id, metadata.clone()));
        assert!(recorder.record(link_id, ClickMetadata::default()));
        recorder.flush().await;

        assert_eq!(storage.count_clicks(link_id, None).await.unwrap(), 2);

        let recent = storage.recent_clicks(10).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[1].ip_address.as_deref(), Some("203.0.113.7"));
    }

    #[tokio::test]
    async fn test_recorder_swallows_missing_link() {
        let (storage, link_id) = setup().await;
        let recorder = ClickRecorder::new(Arc::clone(&storage), 100);

        assert!(recorder.record(9999, ClickMetadata::default()));
        assert!(recorder.record(link_id, ClickMetadata::default()));
        recorder.flush().await;

        assert_eq!(storage.count_clicks(9999, None).await.unwrap(), 0);
        assert_eq!(storage.count_clicks(link_id, None).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_shutdown_drains_queue_and_rejects_new_clicks() {
        let (storage, link_id) = setup().await;
        let recorder = ClickRecorder::new(Arc::clone(&storage), 100);

        for _ in 0..5 {
            recorder.record(link_id, ClickMetadata::default());
        }
        recorder.shutdown().await;

        assert_eq!(storage.count_clicks(link_id, None).await.unwrap(), 5);
        assert!(!recorder.record(link_id, ClickMetadata::default()));
    }
}
