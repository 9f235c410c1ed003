//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod in_memory_action_repository;
mod postgres_action_repository;

pub use in_memory_action_repository::InMemoryActionRepository;
pub use postgres_action_repository::PostgresActionRepository;

/// Schema migrations for the PostgreSQL action store.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");
