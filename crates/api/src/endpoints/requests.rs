//! Transport request endpoints.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use careride_common::{AppError, AppResult};
use careride_core::{CreateRequestInput, RequestView};
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// Create the requests router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_open))
        .route("/create", post(create))
        .route("/accepted", get(list_accepted))
        .route("/closed", get(list_closed))
        .route("/{id}/accept", post(accept))
        .route("/{id}/reject", post(reject))
        .route("/{id}/cancel", post(cancel))
        .route("/{id}/delete", post(delete))
}

/// Request list response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestListResponse {
    pub requests: Vec<RequestView>,
}

/// Create request body. Fields are optional so a missing one reports a
/// validation error rather than a deserialization failure.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRequestBody {
    pub pickup: Option<String>,
    pub destination: Option<String>,
    pub time: Option<String>,
    pub notes: Option<String>,
    pub phone: Option<String>,
}

/// Reject request body.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RejectBody {
    pub reason: Option<String>,
}

/// List open requests, scoped to the caller's role.
async fn list_open(
    AuthUser(user, profile): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<RequestListResponse>> {
    let requests = state.transport_service.list_open(&user, &profile).await?;
    Ok(ApiResponse::ok(RequestListResponse { requests }))
}

/// Create a transport request.
async fn create(
    AuthUser(user, profile): AuthUser,
    State(state): State<AppState>,
    Json(body): Json<CreateRequestBody>,
) -> AppResult<ApiResponse<RequestView>> {
    let mut missing = Vec::new();
    if body.pickup.as_deref().is_none_or(str::is_empty) {
        missing.push("pickup");
    }
    if body.destination.as_deref().is_none_or(str::is_empty) {
        missing.push("destination");
    }
    if body.time.as_deref().is_none_or(str::is_empty) {
        missing.push("time");
    }
    if !missing.is_empty() {
        return Err(AppError::Validation(format!(
            "Missing fields: {}",
            missing.join(", ")
        )));
    }

    let input = CreateRequestInput {
        pickup: body.pickup.unwrap_or_default(),
        destination: body.destination.unwrap_or_default(),
        requested_time: parse_requested_time(&body.time.unwrap_or_default())?,
        notes: body.notes,
        phone: body.phone,
    };

    let view = state.transport_service.create(&user, &profile, input).await?;
    Ok(ApiResponse::ok(view))
}

/// Accept an open request (volunteer).
async fn accept(
    AuthUser(user, profile): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<StatusResponse>> {
    state.transport_service.accept(&user, &profile, &id).await?;
    Ok(ApiResponse::ok(StatusResponse { ok: true }))
}

/// Reject an open request with an optional reason (volunteer).
async fn reject(
    AuthUser(user, profile): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Option<Json<RejectBody>>,
) -> AppResult<ApiResponse<StatusResponse>> {
    let reason = body.and_then(|Json(b)| b.reason);
    state
        .transport_service
        .reject(&user, &profile, &id, reason)
        .await?;
    Ok(ApiResponse::ok(StatusResponse { ok: true }))
}

/// Cancel an open request (owning patient).
async fn cancel(
    AuthUser(user, profile): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<StatusResponse>> {
    state.transport_service.cancel(&user, &profile, &id).await?;
    Ok(ApiResponse::ok(StatusResponse { ok: true }))
}

/// Delete a request under role-dependent rules.
async fn delete(
    AuthUser(user, profile): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<StatusResponse>> {
    state.transport_service.delete(&user, &profile, &id).await?;
    Ok(ApiResponse::ok(StatusResponse { ok: true }))
}

/// List requests accepted by the calling volunteer.
async fn list_accepted(
    AuthUser(user, profile): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<RequestListResponse>> {
    let requests = state
        .transport_service
        .list_accepted(&user, &profile)
        .await?;
    Ok(ApiResponse::ok(RequestListResponse { requests }))
}

/// List the calling patient's closed requests.
async fn list_closed(
    AuthUser(user, profile): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<RequestListResponse>> {
    let requests = state.transport_service.list_closed(&user, &profile).await?;
    Ok(ApiResponse::ok(RequestListResponse { requests }))
}

/// Simple status response.
#[derive(Serialize)]
pub struct StatusResponse {
    pub ok: bool,
}

/// Parse the requested time. Accepts RFC 3339 and the HTML
/// `datetime-local` formats.
fn parse_requested_time(raw: &str) -> AppResult<DateTime<FixedOffset>> {
    if let Ok(time) = DateTime::parse_from_rfc3339(raw) {
        return Ok(time);
    }

    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M"] {
        if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(raw, format) {
            return Ok(naive.and_utc().fixed_offset());
        }
    }

    Err(AppError::Validation(format!("Invalid time: {raw}")))
}
