//! # tally-service: Bookkeeping Operations
//!
//! Everything the UI can ask of the books, as methods on [`Bookkeeper`].
//!
//! ## Module Organization
//! ```text
//! tally_service/
//! ├── lib.rs          ◄─── You are here (exports, tracing setup)
//! ├── bookkeeper.rs   ◄─── Store + calendar + clock handle
//! ├── salary.rs       ◄─── Monthly salaries and the salary log
//! ├── bonus.rs        ◄─── Bonus pool and deductions
//! ├── gift.rs         ◄─── Gift eligibility and the gift log
//! ├── payment.rs      ◄─── Balances, transfers, withdrawals
//! ├── records.rs      ◄─── Transactions, employees, inventory
//! ├── customers.rs    ◄─── Customer bindings
//! ├── config.rs       ◄─── tally.toml + environment
//! └── error.rs        ◄─── ApiError for every operation
//! ```
//!
//! ## Request Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  UI ──► Bookkeeper::op(&session, input)                                 │
//! │              │                                                          │
//! │              ├── session.require_privileged(..)      (gated ops only)   │
//! │              ├── validate input                       (tally-core)      │
//! │              ├── read records                         (RecordStore)     │
//! │              ├── run the engine                       (tally-core)      │
//! │              └── append logs / records                (RecordStore)     │
//! │              │                                                          │
//! │              ▼                                                          │
//! │         ApiResult<T>                                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust,ignore
//! let config = LedgerConfig::load_or_default(None);
//! init_tracing(&config.logging.filter);
//!
//! let db = Database::new(config.db_config()?).await?;
//! let store = Arc::new(FallbackStore::new(db, MemoryStore::new()));
//! let keeper = Bookkeeper::new(store, config.calendar()?);
//!
//! let june = keeper.get_all_employees_monthly_salary(YearMonth::new(2024, 6)?).await?;
//! ```

pub mod bookkeeper;
pub mod bonus;
pub mod config;
pub mod customers;
pub mod error;
pub mod gift;
pub mod payment;
pub mod records;
pub mod salary;

use tracing_subscriber::EnvFilter;

pub use bookkeeper::{Bookkeeper, Clock};
pub use config::LedgerConfig;
pub use error::{ApiError, ApiResult, ConfigError, ErrorCode};

/// Installs the global fmt subscriber.
///
/// `RUST_LOG` wins over `default_filter` when set.
pub fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}
