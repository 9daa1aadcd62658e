//! # budgetdesk-adapter-storage-sqlite-sqlx
//!
//! `SQLite` persistence adapter using [sqlx](https://docs.rs/sqlx).
//!
//! ## Responsibilities
//! - Implement the generic `Repository<E>` port from `budgetdesk-app` for
//!   every table
//! - Translate `QuerySpec` filters, sorts and windows into bound SQL
//! - Manage `SQLite` connection pool lifecycle
//! - Run database migrations (using sqlx embedded migrations)
//! - Map between domain types and database rows
//!
//! ## Dependency rule
//! Depends on `budgetdesk-app` (for port traits) and `budgetdesk-domain` (for domain types).
//! The `app` and `domain` crates must never reference this adapter.

pub mod budget_repo;
pub mod client_repo;
pub mod country_repo;
pub mod error;
pub mod pool;
pub mod repository;
pub mod setting_repo;
mod sql;
pub mod table;
pub mod user_repo;

pub use budget_repo::SqliteBudgetRepository;
pub use client_repo::SqliteClientRepository;
pub use country_repo::SqliteCountryRepository;
pub use pool::{Config, Database};
pub use repository::SqliteRepository;
pub use setting_repo::SqliteSettingRepository;
pub use user_repo::SqliteUserRepository;
