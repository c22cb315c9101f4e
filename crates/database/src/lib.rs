//! # Trade Diary Database Crate
//!
//! This crate is the system's "permanent archive" for journal entries. It
//! defines the `TradeStore` abstraction and its two implementations.
//!
//! ## Architectural Principles
//!
//! - **Adapter:** All storage-specific logic lives here. The rest of the
//!   application only sees the `TradeStore` trait and `core-types` values.
//! - **Owner Scoped:** Every operation takes the acting user's id. Rows of
//!   other users are never returned or modified.
//! - **Atomic Writes:** PnL is recomputed before every write. Patches run as a
//!   locked read-modify-write and imports are all-or-nothing.
//! - **Asynchronous & Pooled:** The PostgreSQL store uses a `PgPool` and
//!   runtime-checked `sqlx` queries.
//!
//! ## Public API
//!
//! - `TradeStore`: The async trait every store implements.
//! - `DbRepository`: PostgreSQL implementation backed by a connection pool.
//! - `MemoryTradeStore`: In-process implementation for tests and demos.
//! - `connect` / `run_migrations`: Pool setup and schema migration.
//! - `DbError`: The specific error types that can be returned from this crate.

pub mod connection;
pub mod error;
pub mod memory;
pub mod repository;
pub mod store;

pub use connection::{connect, run_migrations};
pub use error::DbError;
pub use memory::MemoryTradeStore;
pub use repository::{DbRepository, DbTrade};
pub use store::TradeStore;
