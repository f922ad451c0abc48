use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Prefix length used for a post's human-readable display title.
pub const TITLE_PREFIX_CHARS: usize = 15;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub text: String,
    /// Immutable after creation; never accepted from caller input.
    pub author_id: i64,
    pub group_id: Option<i64>,
    /// Reference into the external binary asset store, not the bytes.
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Post {
    /// Display title: the text truncated to a fixed prefix, char-boundary safe.
    pub fn title(&self) -> String {
        self.text.chars().take(TITLE_PREFIX_CHARS).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub post_id: i64,
    pub author_id: i64,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// Directed follow edge: `user_id` sees `author_id`'s posts in their following feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Follow {
    pub user_id: i64,
    pub author_id: i64,
    pub created_at: DateTime<Utc>,
}
