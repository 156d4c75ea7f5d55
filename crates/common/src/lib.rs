//! Common utilities and shared types for careride.
//!
//! This crate provides foundational components used across all careride crates:
//!
//! - **Configuration**: Application settings via [`Config`]
//! - **Error handling**: Unified error types via [`AppError`] and [`AppResult`]
//! - **ID Generation**: ULID-based unique identifiers via [`IdGenerator`]

pub mod config;
pub mod error;
pub mod id;

pub use config::{Config, QuizConfig};
pub use error::{AppError, AppResult};
pub use id::IdGenerator;
