//! API endpoints.

mod auth;
mod quiz;
mod requests;

use axum::Router;

use crate::middleware::AppState;

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/requests", requests::router())
        .nest("/quiz", quiz::router())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request, http::StatusCode};
    use careride_core::{
        CompletionClient, CompletionConfig, MemoryUsageStore, QuizService, TransportService,
        UsageLimiter, UsageStore, UserService,
    };
    use careride_db::repositories::{
        AssignmentRepository, ProfileRepository, RejectionRepository, TransportRequestRepository,
        UserRepository,
    };
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;
    use tower::ServiceExt;

    fn test_state() -> AppState {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let user_repo = UserRepository::new(Arc::clone(&db));
        let profile_repo = ProfileRepository::new(Arc::clone(&db));

        let user_service = UserService::new(user_repo.clone(), profile_repo.clone());
        let transport_service = TransportService::new(
            TransportRequestRepository::new(Arc::clone(&db)),
            AssignmentRepository::new(Arc::clone(&db)),
            RejectionRepository::new(Arc::clone(&db)),
            profile_repo,
            user_repo,
        );

        let usage_store = Arc::new(MemoryUsageStore::new()) as Arc<dyn UsageStore>;
        let quiz_service = QuizService::new(
            Arc::new(CompletionClient::new(CompletionConfig::default())),
            UsageLimiter::new(usage_store, "test"),
            vec![],
        );

        AppState {
            user_service,
            transport_service,
            quiz_service,
        }
    }

    #[tokio::test]
    async fn test_unauthenticated_request_is_rejected() {
        let app = router().with_state(test_state());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/requests")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_unauthenticated_quiz_is_rejected() {
        let app = router().with_state(test_state());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/quiz/questions")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
