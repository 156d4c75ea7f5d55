//! Authentication endpoints.

use axum::{Json, Router, extract::State, routing::post};
use careride_common::AppResult;
use careride_db::entities::Role;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{middleware::AppState, response::ApiResponse};

/// Create the auth router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/signin", post(signin))
}

/// Signup request.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    #[validate(length(min = 1, max = 128))]
    pub username: String,

    #[validate(length(min = 8, max = 128))]
    pub password: String,

    pub role: Role,

    #[validate(length(max = 20))]
    pub phone: Option<String>,
}

/// Signup response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupResponse {
    pub id: String,
    pub username: String,
    pub role: Role,
    pub token: String,
}

/// Create a new account with a role profile.
async fn signup(
    State(state): State<AppState>,
    Json(req): Json<SignupRequest>,
) -> AppResult<ApiResponse<SignupResponse>> {
    req.validate()?;

    let input = careride_core::SignupInput {
        username: req.username,
        password: req.password,
        role: req.role,
        phone: req.phone,
    };

    let (user, profile) = state.user_service.signup(input).await?;

    Ok(ApiResponse::ok(SignupResponse {
        id: user.id,
        username: user.username,
        role: profile.role,
        token: user.token,
    }))
}

/// Signin request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SigninRequest {
    pub username: String,
    pub password: String,
}

/// Signin response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SigninResponse {
    pub id: String,
    pub username: String,
    pub role: Role,
    pub token: String,
}

/// Sign in to an existing account.
async fn signin(
    State(state): State<AppState>,
    Json(req): Json<SigninRequest>,
) -> AppResult<ApiResponse<SigninResponse>> {
    let user = state
        .user_service
        .authenticate(&req.username, &req.password)
        .await?;
    let profile = state.user_service.get_profile(&user.id).await?;

    Ok(ApiResponse::ok(SigninResponse {
        id: user.id,
        username: user.username,
        role: profile.role,
        token: user.token,
    }))
}
