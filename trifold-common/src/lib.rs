//! # Trifold Common Library
//!
//! Shared code for the Trifold modules:
//! - Domain models (providers, ratings, history items)
//! - Configuration loading and root folder resolution
//! - Database initialization and schema management
//! - Common error types

pub mod config;
pub mod db;
pub mod error;
pub mod model;

pub use error::{Error, Result};
pub use model::{AiResponse, HistoryItem, Provider, Rating, RatingCategory, StorageBackend};
