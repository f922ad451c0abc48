// Follow graph - directed follow edges between users.
//
// Invariants: at most one edge per (follower, author) pair, and never a
// self-edge. Uniqueness lives in the storage constraint; the self-edge check
// happens here at write time.

use std::sync::Arc;
use tracing::info;

use crate::error::AppResult;
use crate::models::User;
use crate::store::ContentStore;

#[derive(Clone)]
pub struct FollowGraph {
    store: Arc<dyn ContentStore>,
}

impl FollowGraph {
    pub fn new(store: Arc<dyn ContentStore>) -> Self {
        Self { store }
    }

    /// Create a follow edge. Returns whether a new edge was created; a
    /// duplicate or a self-follow is an idempotent no-op, never an error.
    pub async fn follow(&self, follower_id: i64, author_id: i64) -> AppResult<bool> {
        if follower_id == author_id {
            info!("Ignoring self-follow attempt by user {}", follower_id);
            return Ok(false);
        }
        let created = self.store.insert_follow(follower_id, author_id).await?;
        if created {
            info!("User {} now follows {}", follower_id, author_id);
        }
        Ok(created)
    }

    /// Delete the edge if present; absent edges are a no-op.
    pub async fn unfollow(&self, follower_id: i64, author_id: i64) -> AppResult<bool> {
        let removed = self.store.delete_follow(follower_id, author_id).await?;
        if removed {
            info!("User {} unfollowed {}", follower_id, author_id);
        }
        Ok(removed)
    }

    pub async fn is_following(&self, user_id: i64, author_id: i64) -> AppResult<bool> {
        self.store.follow_exists(user_id, author_id).await
    }

    pub async fn followed_authors(&self, user_id: i64) -> AppResult<Vec<User>> {
        self.store.followed_authors(user_id).await
    }
}
