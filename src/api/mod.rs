//! API route definitions
//!
//! Routes are plain REST under /api; health probes live at the root.

pub mod auth;
pub mod books;
pub mod health;

use axum_extra::headers::authorization::Bearer;
use axum_extra::headers::Authorization;
use axum_extra::TypedHeader;

use crate::db::UserRecord;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// The single choke point for protected routes: every handler that mutates
/// state resolves its bearer token to a user here before proceeding.
pub(crate) async fn require_user(
    state: &AppState,
    bearer: Option<&TypedHeader<Authorization<Bearer>>>,
) -> ApiResult<UserRecord> {
    let bearer = bearer.ok_or_else(|| ApiError::Unauthorized("Not authenticated".into()))?;
    state.auth.resolve(bearer.0.token()).await
}
