//! # tally-core: Pure Bookkeeping Rules for Tally
//!
//! This crate is the **heart** of Tally. It contains every calculation rule
//! as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Tally Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                          UI                                     │   │
//! │  │   Transactions ── Salaries ── Bonus Pool ── Gifts ── Payments   │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 tally-service (Bookkeeper)                      │   │
//! │  │   session checks, reads records, calls the engines, writes logs │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ tally-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────┐ ┌────────────┐ ┌──────────┐ ┌────────────────┐  │   │
//! │  │   │  salary  │ │ bonus_pool │ │   gift   │ │ reconciliation │  │   │
//! │  │   └──────────┘ └────────────┘ └──────────┘ └────────────────┘  │   │
//! │  │   ┌──────────┐ ┌────────────┐ ┌──────────┐ ┌────────────────┐  │   │
//! │  │   │  money   │ │  quantity  │ │ calendar │ │  types/session │  │   │
//! │  │   └──────────┘ └────────────┘ └──────────┘ └────────────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO CLOCK • PURE FUNCTIONS              │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  tally-db (Record Store)                        │   │
//! │  │              SQLite, in-memory fake, fallback                   │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`quantity`] - Unit counts in hundredths
//! - [`calendar`] - Business months in a fixed UTC offset
//! - [`types`] - Domain records (Transaction, Employee, Transfer, ...)
//! - [`session`] - Roles and the explicit caller session
//! - [`salary`] - Salary Calculator
//! - [`bonus_pool`] - Bonus Pool Accrual
//! - [`gift`] - Customer Gift Eligibility
//! - [`reconciliation`] - Payment Reconciliation
//! - [`inventory`] - Stock movements caused by transactions
//! - [`stats`] - Dashboard totals
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: same records + same "now" = same output
//! 2. **No I/O**: Database, network, file system and the clock are FORBIDDEN here
//! 3. **Integer Money**: amounts are cents (i64), quantities are hundredths (i64)
//! 4. **Explicit Errors**: All errors are typed, never strings or panics
//!
//! ## Example Usage
//!
//! ```rust
//! use tally_core::quantity::Quantity;
//! use tally_core::salary::{bonus_for, commission_for, BASE_SALARY};
//!
//! let sold = Quantity::from_units(5500);
//! let total = BASE_SALARY + commission_for(sold) + bonus_for(sold);
//!
//! // 3000 + 3850 + 2000
//! assert_eq!(total.yuan(), 8850);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod bonus_pool;
pub mod calendar;
pub mod error;
pub mod gift;
pub mod inventory;
pub mod money;
pub mod quantity;
pub mod reconciliation;
pub mod salary;
pub mod session;
pub mod stats;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use tally_core::Money` instead of
// `use tally_core::money::Money`

pub use calendar::{BusinessCalendar, YearMonth};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use quantity::Quantity;
pub use session::{Role, Session};
pub use types::*;
