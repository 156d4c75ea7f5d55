//! API middleware.

#![allow(missing_docs)]

use axum::{body::Body, extract::State, http::Request, middleware::Next, response::Response};
use careride_core::{QuizService, TransportService, UserService};

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub user_service: UserService,
    pub transport_service: TransportService,
    pub quiz_service: QuizService,
}

/// Authentication middleware. Resolves a Bearer token to the user and their
/// profile and stores both in request extensions.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    if let Some(auth_header) = req.headers().get("Authorization")
        && let Ok(auth_str) = auth_header.to_str()
        && let Some(token) = auth_str.strip_prefix("Bearer ")
        && let Ok(user) = state.user_service.authenticate_by_token(token).await
        && let Ok(profile) = state.user_service.get_profile(&user.id).await
    {
        req.extensions_mut().insert(user);
        req.extensions_mut().insert(profile);
    }

    next.run(req).await
}
