//! # racenotes-core
//!
//! Core types, traits, and abstractions for the racenotes library.
//!
//! This crate provides the domain model, the error taxonomy with its
//! retryable/fatal classification, and the trait seams the sync
//! coordinator is built against.

pub mod config;
pub mod defaults;
pub mod error;
pub mod logging;
pub mod models;
pub mod traits;

// Re-export commonly used types at crate root
pub use config::CoreConfig;
pub use error::{Error, Result};
pub use models::*;
pub use traits::*;
