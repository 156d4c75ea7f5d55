//! Careride server entry point.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{Router, middleware, routing::get};
use careride_api::{middleware::AppState, router as api_router};
use careride_common::Config;
use careride_core::{
    CompletionClient, CompletionConfig, QuizService, RedisUsageStore, TransportService,
    UsageLimiter, UsageStore, UserService,
};
use fred::interfaces::ClientLike;

use careride_db::repositories::{
    AssignmentRepository, ProfileRepository, RejectionRepository, TransportRequestRepository,
    UserRepository,
};
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

async fn health() -> &'static str {
    "ok"
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "careride=debug,tower_http=debug".into()),
        )
        .init();

    info!("Starting careride server...");

    // Load configuration
    let config = Config::load()?;

    // Connect to database and run migrations
    let db = careride_db::init(&config).await?;
    info!("Connected to database");

    info!("Running database migrations...");
    careride_db::migrate(&db).await?;
    info!("Migrations completed");

    // Connect to Redis for quiz usage counters
    let fred_config = fred::types::config::Config::from_url(&config.redis.url)
        .expect("Failed to parse Redis URL");
    let fred_client = fred::clients::Client::new(fred_config, None, None, None);
    fred_client.connect();
    fred_client
        .wait_for_connect()
        .await
        .expect("Failed to connect to Redis");
    let fred_client = Arc::new(fred_client);
    info!("Connected to Redis");

    // Initialize repositories
    let db = Arc::new(db);
    let user_repo = UserRepository::new(Arc::clone(&db));
    let profile_repo = ProfileRepository::new(Arc::clone(&db));
    let request_repo = TransportRequestRepository::new(Arc::clone(&db));
    let assignment_repo = AssignmentRepository::new(Arc::clone(&db));
    let rejection_repo = RejectionRepository::new(Arc::clone(&db));

    // Initialize services
    let user_service = UserService::new(user_repo.clone(), profile_repo.clone());
    let transport_service = TransportService::new(
        request_repo,
        assignment_repo,
        rejection_repo,
        profile_repo,
        user_repo,
    );

    let usage_store = Arc::new(RedisUsageStore::new(fred_client)) as Arc<dyn UsageStore>;
    let usage_limiter = UsageLimiter::new(usage_store, config.redis.prefix.clone());
    let completion = Arc::new(CompletionClient::new(CompletionConfig::from(&config.quiz)));
    let quiz_service = QuizService::new(
        completion,
        usage_limiter,
        config.quiz.question_paths.clone(),
    );

    // Create app state
    let state = AppState {
        user_service,
        transport_service,
        quiz_service,
    };

    // Build the application router
    let app = Router::new()
        .route("/health", get(health))
        .nest("/api", api_router())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            careride_api::middleware::auth_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    // Start server with graceful shutdown
    let addr = SocketAddr::new(config.server.host.parse()?, config.server.port);
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}
