// Feed resolution - computes the post set backing each feed and slices it
// through the paginator. All feeds are read-only and reverse-chronological.

use serde::Serialize;
use std::sync::Arc;

use crate::error::{AppError, AppResult};
use crate::models::{Comment, Group, Post, User};
use crate::pagination::{Page, Paginator};
use crate::store::ContentStore;

/// Group feed: the group plus one page of its posts.
#[derive(Debug, Serialize)]
pub struct GroupFeed {
    pub group: Group,
    pub page: Page<Post>,
}

/// Profile feed: the author, whether the viewer follows them, the author's
/// total post count and one page of their posts.
#[derive(Debug, Serialize)]
pub struct ProfileFeed {
    pub author: User,
    pub following: bool,
    pub posts_count: u64,
    pub page: Page<Post>,
}

/// Post detail context: the post, its author, the author's post count and
/// every comment on the post.
#[derive(Debug, Serialize)]
pub struct PostDetail {
    pub post: Post,
    pub author: User,
    pub posts_count: u64,
    pub comments: Vec<Comment>,
}

#[derive(Clone)]
pub struct FeedService {
    store: Arc<dyn ContentStore>,
    paginator: Paginator,
}

impl FeedService {
    pub fn new(store: Arc<dyn ContentStore>) -> Self {
        Self {
            store,
            paginator: Paginator::default(),
        }
    }

    /// Home feed: every post, viewer-independent.
    pub async fn home(&self, page: Option<u32>) -> AppResult<Page<Post>> {
        let total = self.store.count_posts().await?;
        let slice = self.paginator.slice(total, page);
        let posts = self.store.list_posts(slice.limit, slice.offset).await?;
        Ok(Page::from_slice(&slice, posts))
    }

    /// Group feed for `slug`; NotFound when the slug does not resolve.
    pub async fn group(&self, slug: &str, page: Option<u32>) -> AppResult<GroupFeed> {
        let group = self
            .store
            .find_group_by_slug(slug)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Group '{}' not found", slug)))?;

        let total = self.store.count_posts_in_group(group.id).await?;
        let slice = self.paginator.slice(total, page);
        let posts = self
            .store
            .list_posts_in_group(group.id, slice.limit, slice.offset)
            .await?;
        Ok(GroupFeed {
            group,
            page: Page::from_slice(&slice, posts),
        })
    }

    /// Profile feed for `username`. The `following` flag is keyed to the
    /// viewer: anonymous viewers always see false.
    pub async fn profile(
        &self,
        username: &str,
        viewer_id: Option<i64>,
        page: Option<u32>,
    ) -> AppResult<ProfileFeed> {
        let author = self
            .store
            .find_user_by_username(username)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User '{}' not found", username)))?;

        let following = match viewer_id {
            Some(viewer_id) => self.store.follow_exists(viewer_id, author.id).await?,
            None => false,
        };

        let total = self.store.count_posts_by_author(author.id).await?;
        let slice = self.paginator.slice(total, page);
        let posts = self
            .store
            .list_posts_by_author(author.id, slice.limit, slice.offset)
            .await?;
        Ok(ProfileFeed {
            author,
            following,
            posts_count: total,
            page: Page::from_slice(&slice, posts),
        })
    }

    /// Following feed: posts by every author the viewer follows. Callers
    /// must have rejected anonymous viewers before resolution begins.
    pub async fn following(&self, viewer_id: i64, page: Option<u32>) -> AppResult<Page<Post>> {
        let total = self.store.count_posts_by_followed(viewer_id).await?;
        let slice = self.paginator.slice(total, page);
        let posts = self
            .store
            .list_posts_by_followed(viewer_id, slice.limit, slice.offset)
            .await?;
        Ok(Page::from_slice(&slice, posts))
    }

    pub async fn post_detail(&self, post_id: i64) -> AppResult<PostDetail> {
        let post = self
            .store
            .find_post(post_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Post {} not found", post_id)))?;
        let author = self
            .store
            .find_user(post.author_id)
            .await?
            .ok_or_else(|| AppError::Internal(format!("Post {} has no author row", post_id)))?;
        let posts_count = self.store.count_posts_by_author(author.id).await?;
        let comments = self.store.list_comments(post_id).await?;
        Ok(PostDetail {
            post,
            author,
            posts_count,
            comments,
        })
    }
}
