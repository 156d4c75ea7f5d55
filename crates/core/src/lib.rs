//! Core business logic for careride.

pub mod services;

pub use services::*;
