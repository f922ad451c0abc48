// Viewer resolution - bearer tokens resolve to a user through the session
// table; every request gets a Viewer injected into its extensions, anonymous
// when no valid token is present.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{request::Parts, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::warn;
use uuid::Uuid;

use crate::app_state::AppState;
use crate::error::{AppError, AppResult};
use crate::models::{Post, User};

/// Request-scoped viewer identity: an authenticated user or anonymous.
#[derive(Debug, Clone)]
pub struct Viewer {
    pub user: Option<User>,
    pub request_id: String,
}

impl Viewer {
    pub fn anonymous() -> Self {
        Self {
            user: None,
            request_id: Uuid::new_v4().to_string(),
        }
    }

    pub fn authenticated(user: User) -> Self {
        Self {
            user: Some(user),
            request_id: Uuid::new_v4().to_string(),
        }
    }

    pub fn user_id(&self) -> Option<i64> {
        self.user.as_ref().map(|u| u.id)
    }

    /// Auth gate: the identified user, or Unauthenticated carrying the
    /// return path for the login redirect.
    pub fn require(&self, next: &str) -> AppResult<&User> {
        self.user
            .as_ref()
            .ok_or_else(|| AppError::Unauthenticated(next.to_string()))
    }
}

/// Only a post's author may edit it.
pub fn can_edit(caller: &User, post: &Post) -> bool {
    caller.id == post.author_id
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("authorization")?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

/// Middleware that resolves the caller's identity and injects a [`Viewer`]
/// into request extensions for handlers to extract.
pub async fn viewer_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let viewer = match bearer_token(request.headers()) {
        Some(token) => match state.store.find_session_user(token).await {
            Ok(Some(user)) => Viewer::authenticated(user),
            Ok(None) => {
                warn!("Unknown session token presented");
                Viewer::anonymous()
            }
            Err(err) => return err.into_response(),
        },
        None => Viewer::anonymous(),
    };

    request.extensions_mut().insert(viewer);
    next.run(request).await
}

impl<S> FromRequestParts<S> for Viewer
where
    S: Send + Sync,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Viewer>()
            .cloned()
            .ok_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}
