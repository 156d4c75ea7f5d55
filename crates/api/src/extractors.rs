//! Request extractors.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
};
use careride_db::entities::{profile, user};

/// Authenticated user with their role profile.
#[derive(Debug, Clone)]
pub struct AuthUser(pub user::Model, pub profile::Model);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Set by the auth middleware
        let user = parts.extensions.get::<user::Model>().cloned();
        let profile = parts.extensions.get::<profile::Model>().cloned();

        match (user, profile) {
            (Some(user), Some(profile)) => Ok(Self(user, profile)),
            _ => Err((StatusCode::UNAUTHORIZED, "Unauthorized")),
        }
    }
}
