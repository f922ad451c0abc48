// HTTP surface - one handler per routed operation, wired by create_router.
// Feeds return JSON pages; mutations follow the original flow of login gate,
// lookup, validation, persist, redirect.

use axum::{
    extract::{Path, Query, State},
    middleware,
    response::{IntoResponse, Json, Redirect},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::app_state::AppState;
use crate::auth::{can_edit, viewer_middleware, Viewer};
use crate::error::{AppError, AppResult};
use crate::events::ContentEvent;
use crate::feeds::{GroupFeed, PostDetail, ProfileFeed};
use crate::forms::{CommentInput, FieldErrors, PostInput};
use crate::models::{Group, Post};
use crate::pagination::Page;

/// `?page=N` query; anything unparsable falls back to page 1 downstream.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    page: Option<String>,
}

impl PageQuery {
    fn number(&self) -> Option<u32> {
        self.page.as_deref().and_then(|raw| raw.parse().ok())
    }
}

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "microblog"
    }))
}

async fn list_home(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<Page<Post>>> {
    let page = state.feeds.home(query.number()).await?;
    Ok(Json(page))
}

async fn list_group(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<GroupFeed>> {
    let feed = state.feeds.group(&slug, query.number()).await?;
    Ok(Json(feed))
}

async fn list_profile(
    State(state): State<AppState>,
    viewer: Viewer,
    Path(username): Path<String>,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<ProfileFeed>> {
    let feed = state
        .feeds
        .profile(&username, viewer.user_id(), query.number())
        .await?;
    Ok(Json(feed))
}

async fn get_post(
    State(state): State<AppState>,
    Path(post_id): Path<i64>,
) -> AppResult<Json<PostDetail>> {
    let detail = state.feeds.post_detail(post_id).await?;
    Ok(Json(detail))
}

async fn list_following(
    State(state): State<AppState>,
    viewer: Viewer,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<Page<Post>>> {
    let user = viewer.require("/feed/following")?;
    let page = state.feeds.following(user.id, query.number()).await?;
    Ok(Json(page))
}

/// Resolve an optional group slug for a mutation, pushing a field error
/// instead of failing hard when the slug is unknown.
async fn resolve_group(
    state: &AppState,
    slug: Option<&str>,
    errors: &mut FieldErrors,
) -> AppResult<Option<Group>> {
    match slug {
        Some(slug) => match state.store.find_group_by_slug(slug).await? {
            Some(group) => Ok(Some(group)),
            None => {
                errors.insert("group", format!("Unknown group '{}'", slug));
                Ok(None)
            }
        },
        None => Ok(None),
    }
}

async fn create_post(
    State(state): State<AppState>,
    viewer: Viewer,
    Json(input): Json<PostInput>,
) -> AppResult<Redirect> {
    // Author binding is server-side only; the input schema has no author field.
    let author = viewer.require("/posts")?.clone();

    let mut errors = input.validate();
    let group = resolve_group(&state, input.group.as_deref(), &mut errors).await?;
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    let post = state
        .store
        .create_post(
            author.id,
            input.text.trim(),
            group.map(|g| g.id),
            input.image.as_deref(),
        )
        .await?;
    info!("User {} created post {}", author.username, post.id);

    state.events.publish(ContentEvent::PostCreated {
        post_id: post.id,
        author_id: post.author_id,
        group_id: post.group_id,
    });

    Ok(Redirect::to(&format!("/profiles/{}/posts", author.username)))
}

async fn edit_post(
    State(state): State<AppState>,
    viewer: Viewer,
    Path(post_id): Path<i64>,
    Json(input): Json<PostInput>,
) -> AppResult<Redirect> {
    let editor = viewer.require(&format!("/posts/{}/edit", post_id))?.clone();

    let post = state
        .store
        .find_post(post_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Post {} not found", post_id)))?;

    // Non-authors land back on the post detail view; nothing is mutated
    // and no error surfaces.
    if !can_edit(&editor, &post) {
        info!(
            "User {} may not edit post {} owned by user {}",
            editor.username, post.id, post.author_id
        );
        return Err(AppError::Forbidden(format!("/posts/{}", post.id)));
    }

    let mut errors = input.validate();
    let group = resolve_group(&state, input.group.as_deref(), &mut errors).await?;
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    state
        .store
        .update_post(
            post.id,
            input.text.trim(),
            group.map(|g| g.id),
            input.image.as_deref(),
        )
        .await?;
    info!("User {} edited post {}", editor.username, post.id);

    Ok(Redirect::to(&format!("/posts/{}", post.id)))
}

async fn create_comment(
    State(state): State<AppState>,
    viewer: Viewer,
    Path(post_id): Path<i64>,
    Json(input): Json<CommentInput>,
) -> AppResult<Redirect> {
    let author = viewer
        .require(&format!("/posts/{}/comments", post_id))?
        .clone();

    let post = state
        .store
        .find_post(post_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Post {} not found", post_id)))?;

    let errors = input.validate();
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    let comment = state
        .store
        .create_comment(post.id, author.id, input.text.trim())
        .await?;
    info!(
        "User {} commented on post {} (comment {})",
        author.username, post.id, comment.id
    );

    Ok(Redirect::to(&format!("/posts/{}", post.id)))
}

async fn follow_profile(
    State(state): State<AppState>,
    viewer: Viewer,
    Path(username): Path<String>,
) -> AppResult<Redirect> {
    let follower = viewer
        .require(&format!("/profiles/{}/follow", username))?
        .clone();
    let author = state
        .store
        .find_user_by_username(&username)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User '{}' not found", username)))?;

    state.graph.follow(follower.id, author.id).await?;
    Ok(Redirect::to(&format!("/profiles/{}/posts", author.username)))
}

async fn unfollow_profile(
    State(state): State<AppState>,
    viewer: Viewer,
    Path(username): Path<String>,
) -> AppResult<Redirect> {
    let follower = viewer
        .require(&format!("/profiles/{}/unfollow", username))?
        .clone();
    let author = state
        .store
        .find_user_by_username(&username)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User '{}' not found", username)))?;

    state.graph.unfollow(follower.id, author.id).await?;
    Ok(Redirect::to(&format!("/profiles/{}/posts", author.username)))
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/posts", get(list_home).post(create_post))
        .route("/posts/{id}", get(get_post))
        .route("/posts/{id}/edit", post(edit_post))
        .route("/posts/{id}/comments", post(create_comment))
        .route("/groups/{slug}/posts", get(list_group))
        .route("/profiles/{username}/posts", get(list_profile))
        .route("/profiles/{username}/follow", post(follow_profile))
        .route("/profiles/{username}/unfollow", post(unfollow_profile))
        .route("/feed/following", get(list_following))
        .layer(
            ServiceBuilder::new()
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods(Any)
                        .allow_headers(Any),
                )
                .layer(middleware::from_fn_with_state(
                    state.clone(),
                    viewer_middleware,
                )),
        )
        .with_state(state)
}
