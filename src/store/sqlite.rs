use async_trait::async_trait;
use chrono::Utc;
use rand::{distr::Alphanumeric, Rng};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;

use crate::error::{AppError, AppResult};
use crate::models::{Comment, Group, Post, User};
use crate::store::ContentStore;

/// SQLite implementation of the content store.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub async fn connect(url: &str) -> AppResult<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(url)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to connect to {}: {}", url, e)))?;
        Ok(Self { pool })
    }

    /// In-memory store for tests. A single connection keeps every query on
    /// the same in-memory database.
    pub async fn new_in_memory() -> AppResult<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .map_err(|e| {
                AppError::DatabaseError(format!("Failed to connect to in-memory SQLite: {}", e))
            })?;

        let store = Self { pool };
        store.init().await?;
        Ok(store)
    }

    /// Create tables and indexes.
    pub async fn init(&self) -> AppResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT NOT NULL UNIQUE,
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to create users table: {}", e)))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS groups (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                slug TEXT NOT NULL UNIQUE,
                description TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to create groups table: {}", e)))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS posts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                text TEXT NOT NULL,
                author_id INTEGER NOT NULL REFERENCES users(id),
                group_id INTEGER REFERENCES groups(id),
                image TEXT,
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to create posts table: {}", e)))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS comments (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                post_id INTEGER NOT NULL REFERENCES posts(id),
                author_id INTEGER NOT NULL REFERENCES users(id),
                text TEXT NOT NULL,
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to create comments table: {}", e)))?;

        // Composite primary key gives the uniqueness constraint follow()
        // relies on for conflict-tolerant inserts.
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS follows (
                user_id INTEGER NOT NULL REFERENCES users(id),
                author_id INTEGER NOT NULL REFERENCES users(id),
                created_at TEXT NOT NULL,
                PRIMARY KEY (user_id, author_id)
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to create follows table: {}", e)))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS sessions (
                token TEXT PRIMARY KEY,
                user_id INTEGER NOT NULL REFERENCES users(id)
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to create sessions table: {}", e)))?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_posts_created ON posts(created_at DESC, id DESC)",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to create posts index: {}", e)))?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_posts_group ON posts(group_id, created_at DESC)",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to create group index: {}", e)))?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_posts_author ON posts(author_id, created_at DESC)",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to create author index: {}", e)))?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_follows_author ON follows(author_id)")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to create follows index: {}", e)))?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_comments_post ON comments(post_id, id)")
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(format!("Failed to create comments index: {}", e))
            })?;

        Ok(())
    }

    async fn count(&self, sql: &str, bind: Option<i64>) -> AppResult<u64> {
        let mut query = sqlx::query(sql);
        if let Some(value) = bind {
            query = query.bind(value);
        }
        let row = query
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to count posts: {}", e)))?;
        Ok(row.get::<i64, _>("count") as u64)
    }
}

fn user_from_row(row: &SqliteRow) -> User {
    User {
        id: row.get("id"),
        username: row.get("username"),
        created_at: row.get("created_at"),
    }
}

fn group_from_row(row: &SqliteRow) -> Group {
    Group {
        id: row.get("id"),
        title: row.get("title"),
        slug: row.get("slug"),
        description: row.get("description"),
    }
}

fn post_from_row(row: &SqliteRow) -> Post {
    Post {
        id: row.get("id"),
        text: row.get("text"),
        author_id: row.get("author_id"),
        group_id: row.get("group_id"),
        image: row.get("image"),
        created_at: row.get("created_at"),
    }
}

fn comment_from_row(row: &SqliteRow) -> Comment {
    Comment {
        id: row.get("id"),
        post_id: row.get("post_id"),
        author_id: row.get("author_id"),
        text: row.get("text"),
        created_at: row.get("created_at"),
    }
}

const POST_COLUMNS: &str = "id, text, author_id, group_id, image, created_at";

// Feed order: newest first, id as tie-break for rows created within the
// same timestamp.
const POST_ORDER: &str = "ORDER BY created_at DESC, id DESC";

#[async_trait]
impl ContentStore for SqliteStore {
    async fn create_user(&self, username: &str) -> AppResult<User> {
        let now = Utc::now();
        let result = sqlx::query("INSERT INTO users (username, created_at) VALUES (?, ?)")
            .bind(username)
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(format!("Failed to create user {}: {}", username, e))
            })?;
        Ok(User {
            id: result.last_insert_rowid(),
            username: username.to_string(),
            created_at: now,
        })
    }

    async fn find_user(&self, id: i64) -> AppResult<Option<User>> {
        let row = sqlx::query("SELECT id, username, created_at FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to get user {}: {}", id, e)))?;
        Ok(row.as_ref().map(user_from_row))
    }

    async fn find_user_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let row = sqlx::query("SELECT id, username, created_at FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(format!("Failed to get user {}: {}", username, e))
            })?;
        Ok(row.as_ref().map(user_from_row))
    }

    async fn create_group(&self, title: &str, slug: &str, description: &str) -> AppResult<Group> {
        let result =
            sqlx::query("INSERT INTO groups (title, slug, description) VALUES (?, ?, ?)")
                .bind(title)
                .bind(slug)
                .bind(description)
                .execute(&self.pool)
                .await
                .map_err(|e| {
                    AppError::DatabaseError(format!("Failed to create group {}: {}", slug, e))
                })?;
        Ok(Group {
            id: result.last_insert_rowid(),
            title: title.to_string(),
            slug: slug.to_string(),
            description: description.to_string(),
        })
    }

    async fn find_group_by_slug(&self, slug: &str) -> AppResult<Option<Group>> {
        let row = sqlx::query("SELECT id, title, slug, description FROM groups WHERE slug = ?")
            .bind(slug)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to get group {}: {}", slug, e)))?;
        Ok(row.as_ref().map(group_from_row))
    }

    async fn create_post(
        &self,
        author_id: i64,
        text: &str,
        group_id: Option<i64>,
        image: Option<&str>,
    ) -> AppResult<Post> {
        let now = Utc::now();
        let result = sqlx::query(
            "INSERT INTO posts (text, author_id, group_id, image, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(text)
        .bind(author_id)
        .bind(group_id)
        .bind(image)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to create post: {}", e)))?;
        Ok(Post {
            id: result.last_insert_rowid(),
            text: text.to_string(),
            author_id,
            group_id,
            image: image.map(str::to_string),
            created_at: now,
        })
    }

    async fn update_post(
        &self,
        id: i64,
        text: &str,
        group_id: Option<i64>,
        image: Option<&str>,
    ) -> AppResult<()> {
        let result = sqlx::query("UPDATE posts SET text = ?, group_id = ?, image = ? WHERE id = ?")
            .bind(text)
            .bind(group_id)
            .bind(image)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to update post {}: {}", id, e)))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Post {} not found", id)));
        }
        Ok(())
    }

    async fn find_post(&self, id: i64) -> AppResult<Option<Post>> {
        let row = sqlx::query(&format!("SELECT {} FROM posts WHERE id = ?", POST_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to get post {}: {}", id, e)))?;
        Ok(row.as_ref().map(post_from_row))
    }

    async fn count_posts(&self) -> AppResult<u64> {
        self.count("SELECT COUNT(*) AS count FROM posts", None).await
    }

    async fn count_posts_in_group(&self, group_id: i64) -> AppResult<u64> {
        self.count(
            "SELECT COUNT(*) AS count FROM posts WHERE group_id = ?",
            Some(group_id),
        )
        .await
    }

    async fn count_posts_by_author(&self, author_id: i64) -> AppResult<u64> {
        self.count(
            "SELECT COUNT(*) AS count FROM posts WHERE author_id = ?",
            Some(author_id),
        )
        .await
    }

    async fn count_posts_by_followed(&self, follower_id: i64) -> AppResult<u64> {
        self.count(
            "SELECT COUNT(*) AS count FROM posts p \
             JOIN follows f ON f.author_id = p.author_id WHERE f.user_id = ?",
            Some(follower_id),
        )
        .await
    }

    async fn list_posts(&self, limit: u32, offset: u64) -> AppResult<Vec<Post>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM posts {} LIMIT ? OFFSET ?",
            POST_COLUMNS, POST_ORDER
        ))
        .bind(limit as i64)
        .bind(offset as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to list posts: {}", e)))?;
        Ok(rows.iter().map(post_from_row).collect())
    }

    async fn list_posts_in_group(
        &self,
        group_id: i64,
        limit: u32,
        offset: u64,
    ) -> AppResult<Vec<Post>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM posts WHERE group_id = ? {} LIMIT ? OFFSET ?",
            POST_COLUMNS, POST_ORDER
        ))
        .bind(group_id)
        .bind(limit as i64)
        .bind(offset as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(format!("Failed to list posts in group {}: {}", group_id, e))
        })?;
        Ok(rows.iter().map(post_from_row).collect())
    }

    async fn list_posts_by_author(
        &self,
        author_id: i64,
        limit: u32,
        offset: u64,
    ) -> AppResult<Vec<Post>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM posts WHERE author_id = ? {} LIMIT ? OFFSET ?",
            POST_COLUMNS, POST_ORDER
        ))
        .bind(author_id)
        .bind(limit as i64)
        .bind(offset as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(format!("Failed to list posts by author {}: {}", author_id, e))
        })?;
        Ok(rows.iter().map(post_from_row).collect())
    }

    async fn list_posts_by_followed(
        &self,
        follower_id: i64,
        limit: u32,
        offset: u64,
    ) -> AppResult<Vec<Post>> {
        let rows = sqlx::query(
            "SELECT p.id, p.text, p.author_id, p.group_id, p.image, p.created_at \
             FROM posts p JOIN follows f ON f.author_id = p.author_id \
             WHERE f.user_id = ? \
             ORDER BY p.created_at DESC, p.id DESC LIMIT ? OFFSET ?",
        )
        .bind(follower_id)
        .bind(limit as i64)
        .bind(offset as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(format!(
                "Failed to list followed posts for {}: {}",
                follower_id, e
            ))
        })?;
        Ok(rows.iter().map(post_from_row).collect())
    }

    async fn create_comment(
        &self,
        post_id: i64,
        author_id: i64,
        text: &str,
    ) -> AppResult<Comment> {
        let now = Utc::now();
        let result = sqlx::query(
            "INSERT INTO comments (post_id, author_id, text, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(post_id)
        .bind(author_id)
        .bind(text)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(format!("Failed to create comment on post {}: {}", post_id, e))
        })?;
        Ok(Comment {
            id: result.last_insert_rowid(),
            post_id,
            author_id,
            text: text.to_string(),
            created_at: now,
        })
    }

    async fn list_comments(&self, post_id: i64) -> AppResult<Vec<Comment>> {
        let rows = sqlx::query(
            "SELECT id, post_id, author_id, text, created_at FROM comments \
             WHERE post_id = ? ORDER BY id",
        )
        .bind(post_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(format!("Failed to list comments for post {}: {}", post_id, e))
        })?;
        Ok(rows.iter().map(comment_from_row).collect())
    }

    async fn insert_follow(&self, user_id: i64, author_id: i64) -> AppResult<bool> {
        let now = Utc::now();
        let result = sqlx::query(
            "INSERT INTO follows (user_id, author_id, created_at) VALUES (?, ?, ?) \
             ON CONFLICT (user_id, author_id) DO NOTHING",
        )
        .bind(user_id)
        .bind(author_id)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(format!(
                "Failed to follow {} -> {}: {}",
                user_id, author_id, e
            ))
        })?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_follow(&self, user_id: i64, author_id: i64) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM follows WHERE user_id = ? AND author_id = ?")
            .bind(user_id)
            .bind(author_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(format!(
                    "Failed to unfollow {} -> {}: {}",
                    user_id, author_id, e
                ))
            })?;
        Ok(result.rows_affected() > 0)
    }

    async fn follow_exists(&self, user_id: i64, author_id: i64) -> AppResult<bool> {
        let row = sqlx::query("SELECT 1 FROM follows WHERE user_id = ? AND author_id = ?")
            .bind(user_id)
            .bind(author_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(format!(
                    "Failed to check follow {} -> {}: {}",
                    user_id, author_id, e
                ))
            })?;
        Ok(row.is_some())
    }

    async fn followed_authors(&self, user_id: i64) -> AppResult<Vec<User>> {
        let rows = sqlx::query(
            "SELECT u.id, u.username, u.created_at FROM users u \
             JOIN follows f ON f.author_id = u.id WHERE f.user_id = ? ORDER BY u.id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(format!(
                "Failed to list followed authors for {}: {}",
                user_id, e
            ))
        })?;
        Ok(rows.iter().map(user_from_row).collect())
    }

    async fn create_session(&self, user_id: i64) -> AppResult<String> {
        let token: String = rand::rng()
            .sample_iter(&Alphanumeric)
            .take(40)
            .map(char::from)
            .collect();
        sqlx::query("INSERT INTO sessions (token, user_id) VALUES (?, ?)")
            .bind(&token)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(format!(
                    "Failed to create session for user {}: {}",
                    user_id, e
                ))
            })?;
        Ok(token)
    }

    async fn find_session_user(&self, token: &str) -> AppResult<Option<User>> {
        let row = sqlx::query(
            "SELECT u.id, u.username, u.created_at FROM users u \
             JOIN sessions s ON s.user_id = u.id WHERE s.token = ?",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to resolve session: {}", e)))?;
        Ok(row.as_ref().map(user_from_row))
    }
}
