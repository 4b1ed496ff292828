//! Storage layer for the Portico control plane
//!
//! SeaORM entities, migrations and repositories over PostgreSQL. Repositories
//! borrow any [`sea_orm::ConnectionTrait`] implementor, so the same code runs
//! against the pooled connection or inside a per-request transaction.

pub mod connection;
pub mod entities;
pub mod error;
pub mod migrations;
pub mod repositories;

pub use connection::{connect, DatabaseConnection};
pub use error::{StorageError, StorageResult};
