//! Session revalidation middleware.
//!
//! Runs [`AuthSession::check_auth`] ahead of routing: a session carrying
//! persisted credentials gets them confirmed against the backend exactly
//! once per process lifetime (the memo in the application state short-
//! circuits every later request). A failed revalidation clears the
//! credentials, so by the time any route or gate reads the session it is
//! already in a terminal state - authenticated or not.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tower_sessions::Session;

use crate::session::AuthSession;
use crate::state::AppState;

/// Revalidate the session's credentials before the request is routed.
pub async fn revalidate_session(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    if let Some(session) = request.extensions().get::<Session>() {
        AuthSession::new(session.clone())
            .check_auth(state.api(), state.revalidated())
            .await;
    }

    next.run(request).await
}
