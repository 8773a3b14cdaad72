//! # tally-db: Record Store for Tally
//!
//! This crate keeps every bookkeeping record: transactions, employees,
//! customer bindings, transfers, withdrawals, bonus deductions, the gift
//! and salary logs, and inventory. It uses SQLite through sqlx, with an
//! in-memory store for tests and offline use.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Tally Data Flow                                  │
//! │                                                                         │
//! │  Bookkeeper::deduct_bonus(session, amount)                             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     tally-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │  RecordStore  │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │  (store.rs)   │    │ (repository/) │    │  (embedded)  │  │   │
//! │  │   │               │    │               │    │              │  │   │
//! │  │   │ Database      │───►│ Transactions  │    │ 001_init.sql │  │   │
//! │  │   │ MemoryStore   │    │ Employees     │    │              │  │   │
//! │  │   │ FallbackStore │    │ Deductions .. │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database                             │   │
//! │  │   <platform data dir>/tally/tally.db                            │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`store`] - The `RecordStore` trait and its SQLite implementation
//! - [`memory`] - In-memory `RecordStore`
//! - [`fallback`] - Primary/secondary `RecordStore` decorator
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - SQL for each record family
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use tally_db::{Database, DbConfig, FallbackStore, MemoryStore, RecordStore};
//!
//! let db = Database::new(DbConfig::new("path/to/tally.db")).await?;
//! let store: Arc<dyn RecordStore> = Arc::new(FallbackStore::new(db, MemoryStore::new()));
//!
//! let sales = store.list_transactions(&TransactionFilter::of_type(TransactionType::Sale)).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod fallback;
pub mod memory;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod store;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use fallback::FallbackStore;
pub use memory::MemoryStore;
pub use pool::{Database, DbConfig};
pub use store::RecordStore;
