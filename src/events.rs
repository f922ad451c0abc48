// Invalidation events - mutation handlers publish here so an external page
// cache can drop stale feed pages. The core never assumes a subscriber exists.

use serde::Serialize;
use tokio::sync::broadcast;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ContentEvent {
    PostCreated {
        post_id: i64,
        author_id: i64,
        group_id: Option<i64>,
    },
}

#[derive(Debug, Clone)]
pub struct ContentEvents {
    tx: broadcast::Sender<ContentEvent>,
}

impl ContentEvents {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ContentEvent> {
        self.tx.subscribe()
    }

    /// Fire-and-forget: a send with no receivers is not an error.
    pub fn publish(&self, event: ContentEvent) {
        let _ = self.tx.send(event);
    }
}
