use std::sync::Arc;

use crate::config::Config;
use crate::events::ContentEvents;
use crate::feeds::FeedService;
use crate::graph::FollowGraph;
use crate::store::{ContentStore, SqliteStore};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ContentStore>,
    pub feeds: FeedService,
    pub graph: FollowGraph,
    pub events: ContentEvents,
    pub config: Config,
}

impl AppState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        // Initialize the content store
        let store = SqliteStore::connect(&config.database.url).await?;
        store.init().await?;
        Ok(Self::with_store(Arc::new(store), config))
    }

    /// Wire services around an already-initialized store.
    pub fn with_store(store: Arc<dyn ContentStore>, config: Config) -> Self {
        let feeds = FeedService::new(store.clone());
        let graph = FollowGraph::new(store.clone());
        let events = ContentEvents::new(config.events.capacity);
        Self {
            store,
            feeds,
            graph,
            events,
            config,
        }
    }
}
