//! Authentication endpoints: signup, signin, signout, token refresh

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Form, Json, Router};
use axum_extra::headers::authorization::Bearer;
use axum_extra::headers::Authorization;
use axum_extra::TypedHeader;
use serde::{Deserialize, Serialize};

use super::require_user;
use crate::error::ApiResult;
use crate::services::auth::{AuthTokens, RefreshedToken, SignupInput, SignupOutcome};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub email: String,
    pub username: String,
    pub password: String,
}

/// Sign-in is form-encoded, mirroring the password-grant login form shape
#[derive(Debug, Deserialize)]
pub struct SigninForm {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub msg: &'static str,
}

/// Register a new user
async fn signup(
    State(state): State<AppState>,
    Json(body): Json<SignupRequest>,
) -> ApiResult<(StatusCode, Json<SignupOutcome>)> {
    let outcome = state
        .auth
        .signup(SignupInput {
            email: body.email,
            username: body.username,
            password: body.password,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(outcome)))
}

/// Authenticate and receive an access/refresh token pair
async fn signin(
    State(state): State<AppState>,
    Form(body): Form<SigninForm>,
) -> ApiResult<Json<AuthTokens>> {
    let tokens = state.auth.signin(&body.email, &body.password).await?;
    Ok(Json(tokens))
}

/// Sign out the current user, clearing the stored refresh token.
///
/// Already-issued access tokens stay valid until their expiry; there is no
/// revocation list.
async fn signout(
    State(state): State<AppState>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
) -> ApiResult<Json<MessageResponse>> {
    let user = require_user(&state, bearer.as_ref()).await?;
    state.auth.signout(&user).await?;
    Ok(Json(MessageResponse {
        msg: "Successfully logged out",
    }))
}

/// Exchange a refresh token for a new access token
async fn refresh(
    State(state): State<AppState>,
    Json(body): Json<RefreshRequest>,
) -> ApiResult<Json<RefreshedToken>> {
    let token = state.auth.refresh(&body.refresh_token).await?;
    Ok(Json(token))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/signin", post(signin))
        .route("/signout", post(signout))
        .route("/refresh", post(refresh))
}
