//! SQLite persistence module
//!
//! Repository pattern for SQLite database access.

pub mod repos;
pub mod schema;

pub use repos::{
    create_memory_pool, create_pool, init_database, run_migrations, ComplaintRepo, SequenceRepo,
};
pub use schema::{ComplaintRow, StatusHistoryRow};
