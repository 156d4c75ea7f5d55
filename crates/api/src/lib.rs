//! HTTP API layer for careride.
//!
//! This crate provides the REST API:
//!
//! - **Endpoints**: auth, transport requests, trivia quiz
//! - **Extractors**: authentication
//! - **Middleware**: token resolution, app state
//!
//! Built on Axum 0.8 with Tower middleware stack.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;

pub use endpoints::router;
pub use middleware::{AppState, auth_middleware};
