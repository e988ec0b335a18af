//! Database access layer for factgate
//!
//! SQLite via sqlx. Schema creation is idempotent; all mutation of task
//! state goes through [`tasks::atomic_resolve`].

pub mod categories;
pub mod init;
pub mod products;
pub mod tasks;

pub use init::{create_tables, init_database};
