//! # Factgate Common Library
//!
//! Shared code for the factgate curation service:
//! - Domain models (annotation tasks, term corrections)
//! - Database schema and queries
//! - Configuration loading
//! - Language normalization helpers

pub mod config;
pub mod db;
pub mod error;
pub mod lang;
pub mod models;

pub use error::{Error, Result};
