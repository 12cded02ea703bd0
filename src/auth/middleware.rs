//! Cookie-session gate for protected routes.
//!
//! Mount with `axum::middleware::from_fn_with_state(state, require_session)`.
//! On success the resolved [`SessionUser`] is available to the handler as an
//! `Extension`; otherwise the request is answered with 401 and never reaches
//! the handler.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::warn;
use uuid::Uuid;

use super::{
    jwt::{InvalidReason, JwtKeys, TokenVerdict},
    session::extract_session_token,
};
use crate::error::AppError;

/// Identity resolved from a valid session cookie.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionUser(pub Uuid);

pub async fn require_session(
    State(keys): State<Arc<JwtKeys>>,
    mut request: Request,
    next: Next,
) -> Response {
    let verdict = match extract_session_token(request.headers()) {
        Some(token) => keys.verify(&token),
        None => TokenVerdict::Invalid(InvalidReason::Missing),
    };

    match verdict {
        TokenVerdict::Valid(user_id) => {
            request.extensions_mut().insert(SessionUser(user_id));
            next.run(request).await
        }
        TokenVerdict::Invalid(reason) => {
            warn!(%reason, path = %request.uri().path(), "session rejected");
            AppError::Unauthorized.into_response()
        }
    }
}
