//! # salesassist-core
//!
//! Core types, configuration, and utilities for SalesAssist.
//!
//! This crate provides shared functionality used across all SalesAssist crates:
//!
//! - **Configuration**: Environment-sourced settings, validated once at startup
//! - **Types**: Conversation content, events, sessions, and tool declarations
//! - **Utilities**: Path resolution, ID generation, secrets, and environment handling

pub mod config;
pub mod types;
pub mod error;
pub mod paths;
pub mod env;
pub mod id;
pub mod secret;

// Re-exports for convenience
pub use config::{Backend, Config};
pub use error::{ConfigError, Error, Result};
pub use types::*;
pub use secret::SecretString;
