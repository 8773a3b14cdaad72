//! # Repository Module
//!
//! SQLite repository implementations for Tally.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  Bookkeeper (tally-service)                                            │
//! │       │                                                                 │
//! │       │  store.list_transactions(&filter)                              │
//! │       ▼                                                                 │
//! │  RecordStore for Database (store.rs)                                   │
//! │       │                                                                 │
//! │       │  db.transactions().list(&filter)                               │
//! │       ▼                                                                 │
//! │  TransactionRepository                                                 │
//! │  ├── list(&self, filter)                                               │
//! │  ├── get_by_id(&self, id)                                              │
//! │  ├── insert(&self, tx)        ── also moves stock                      │
//! │  ├── update(&self, tx)        ── reverses old stock, applies new       │
//! │  └── delete(&self, id)        ── gives stock back                      │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! │  SQL stays in this module; rows decode straight into tally-core types. │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`TransactionRepository`] - Transaction log CRUD with inventory side effects
//! - [`EmployeeRepository`] - Staff records
//! - [`BindingRepository`] - Customer → employee bindings
//! - [`PaymentRepository`] - Transfers and withdrawals
//! - [`DeductionRepository`] - Bonus deduction log with conditional append
//! - [`LogRepository`] - Gift and salary history
//! - [`InventoryRepository`] - Stock levels and change log

pub mod binding;
pub mod deduction;
pub mod employee;
pub mod inventory;
pub mod log;
pub mod payment;
pub mod transaction;

pub use binding::BindingRepository;
pub use deduction::DeductionRepository;
pub use employee::EmployeeRepository;
pub use inventory::InventoryRepository;
pub use log::LogRepository;
pub use payment::PaymentRepository;
pub use transaction::TransactionRepository;
