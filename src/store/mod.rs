// Content store - persistence contract for users, groups, posts, comments,
// follow edges and sessions. Feeds read through it with limit/offset slicing;
// mutation handlers write through it.

pub mod seed;
pub mod sqlite;

use async_trait::async_trait;

use crate::error::AppResult;
use crate::models::{Comment, Group, Post, User};

pub use seed::{seed_demo_data, SeedSummary};
pub use sqlite::SqliteStore;

#[async_trait]
pub trait ContentStore: Send + Sync {
    // Users
    async fn create_user(&self, username: &str) -> AppResult<User>;
    async fn find_user(&self, id: i64) -> AppResult<Option<User>>;
    async fn find_user_by_username(&self, username: &str) -> AppResult<Option<User>>;

    // Groups
    async fn create_group(&self, title: &str, slug: &str, description: &str) -> AppResult<Group>;
    async fn find_group_by_slug(&self, slug: &str) -> AppResult<Option<Group>>;

    // Posts
    async fn create_post(
        &self,
        author_id: i64,
        text: &str,
        group_id: Option<i64>,
        image: Option<&str>,
    ) -> AppResult<Post>;
    /// Updates text/group/image in place; authorship is immutable.
    async fn update_post(
        &self,
        id: i64,
        text: &str,
        group_id: Option<i64>,
        image: Option<&str>,
    ) -> AppResult<()>;
    async fn find_post(&self, id: i64) -> AppResult<Option<Post>>;

    // Feed queries, reverse-chronological with limit/offset slicing
    async fn count_posts(&self) -> AppResult<u64>;
    async fn count_posts_in_group(&self, group_id: i64) -> AppResult<u64>;
    async fn count_posts_by_author(&self, author_id: i64) -> AppResult<u64>;
    async fn count_posts_by_followed(&self, follower_id: i64) -> AppResult<u64>;
    async fn list_posts(&self, limit: u32, offset: u64) -> AppResult<Vec<Post>>;
    async fn list_posts_in_group(
        &self,
        group_id: i64,
        limit: u32,
        offset: u64,
    ) -> AppResult<Vec<Post>>;
    async fn list_posts_by_author(
        &self,
        author_id: i64,
        limit: u32,
        offset: u64,
    ) -> AppResult<Vec<Post>>;
    async fn list_posts_by_followed(
        &self,
        follower_id: i64,
        limit: u32,
        offset: u64,
    ) -> AppResult<Vec<Post>>;

    // Comments
    async fn create_comment(&self, post_id: i64, author_id: i64, text: &str)
        -> AppResult<Comment>;
    async fn list_comments(&self, post_id: i64) -> AppResult<Vec<Comment>>;

    // Follow edges. Insert must be conflict-tolerant against the unique
    // (user_id, author_id) constraint so concurrent identical requests
    // cannot produce duplicate edges.
    async fn insert_follow(&self, user_id: i64, author_id: i64) -> AppResult<bool>;
    async fn delete_follow(&self, user_id: i64, author_id: i64) -> AppResult<bool>;
    async fn follow_exists(&self, user_id: i64, author_id: i64) -> AppResult<bool>;
    async fn followed_authors(&self, user_id: i64) -> AppResult<Vec<User>>;

    // Sessions - the store-backed side of the external auth contract
    async fn create_session(&self, user_id: i64) -> AppResult<String>;
    async fn find_session_user(&self, token: &str) -> AppResult<Option<User>>;
}
