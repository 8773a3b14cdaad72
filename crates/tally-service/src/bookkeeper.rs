//! # Bookkeeper
//!
//! The handle every operation hangs off.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Bookkeeper                                     │
//! │                                                                         │
//! │   store: Arc<dyn RecordStore>     calendar: BusinessCalendar            │
//! │   clock: Fn() -> DateTime<Utc>                                          │
//! │                                                                         │
//! │   salary.rs      calculate_monthly_salary, get_all_employees_...       │
//! │   bonus.rs       calculate_bonus_pool, deduct_bonus, get_deductions    │
//! │   gift.rs        get_customer_gift_data, get_gift_summary, ...         │
//! │   payment.rs     get_employee_payment_stats, transfer_to_merchant, ... │
//! │   records.rs     transactions, employees, inventory                     │
//! │   customers.rs   customer bindings                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A `Bookkeeper` holds no session. Gated operations take the caller's
//! [`Session`] as an argument, so two callers with different roles can
//! share one instance.

use chrono::{DateTime, NaiveDate, Utc};
use std::fmt;
use std::sync::Arc;
use tally_core::{BusinessCalendar, Session, YearMonth};
use tally_db::RecordStore;
use tracing::warn;
use uuid::Uuid;

use crate::error::ApiResult;

/// Source of "now" for month windows and record timestamps.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Runs the engines against a record store.
#[derive(Clone)]
pub struct Bookkeeper {
    store: Arc<dyn RecordStore>,
    calendar: BusinessCalendar,
    clock: Clock,
}

impl Bookkeeper {
    /// Creates a bookkeeper reading the system clock.
    pub fn new(store: Arc<dyn RecordStore>, calendar: BusinessCalendar) -> Self {
        Bookkeeper {
            store,
            calendar,
            clock: Arc::new(Utc::now),
        }
    }

    /// Replaces the clock. Tests pin it to a fixed instant.
    pub fn with_clock(mut self, clock: impl Fn() -> DateTime<Utc> + Send + Sync + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn store(&self) -> &dyn RecordStore {
        self.store.as_ref()
    }

    pub fn calendar(&self) -> &BusinessCalendar {
        &self.calendar
    }

    pub fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }

    pub fn current_month(&self) -> YearMonth {
        self.calendar.current_month(self.now())
    }

    /// Today's date in the business offset.
    pub fn today(&self) -> NaiveDate {
        self.now().with_timezone(&self.calendar.offset()).date_naive()
    }

    /// Fails with `PERMISSION_DENIED` unless `session` may perform `action`.
    pub(crate) fn authorize(&self, session: &Session, action: &str) -> ApiResult<()> {
        session.require_privileged(action).map_err(|err| {
            warn!(user = %session.name, role = %session.role, action, "Permission denied");
            err.into()
        })
    }

    pub(crate) fn new_id() -> String {
        Uuid::new_v4().to_string()
    }
}

impl fmt::Debug for Bookkeeper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bookkeeper")
            .field("calendar", &self.calendar)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Test Fixtures
// =============================================================================

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use chrono::TimeZone;
    use tally_core::{
        Employee, EmployeeStatus, Money, Quantity, Role, Transaction, TransactionType,
    };
    use tally_db::MemoryStore;

    /// 15 June 2024, noon UTC.
    pub fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
    }

    /// A UTC bookkeeper over an empty in-memory store, frozen at [`now`].
    pub fn bookkeeper() -> Bookkeeper {
        bookkeeper_at(now())
    }

    pub fn bookkeeper_at(at: DateTime<Utc>) -> Bookkeeper {
        let calendar = BusinessCalendar::from_utc_offset_hours(0).unwrap();
        Bookkeeper::new(Arc::new(MemoryStore::new()), calendar).with_clock(move || at)
    }

    pub fn merchant() -> Session {
        Session::new("u-boss", "Boss Chen", Role::Merchant)
    }

    pub fn clerk() -> Session {
        Session::new("u-zhang", "Zhang San", Role::Employee)
    }

    pub fn at(year: i32, month: u32, day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(year, month, day, 4, 0, 0).unwrap()
    }

    pub async fn hire(keeper: &Bookkeeper, name: &str, role: Role) -> Employee {
        let employee = Employee {
            id: Bookkeeper::new_id(),
            name: name.to_string(),
            username: name.to_lowercase().replace(' ', "."),
            role,
            status: EmployeeStatus::Active,
            created_at: at(2024, 1, 1),
        };
        keeper.store().insert_employee(&employee).await.unwrap();
        employee
    }

    /// Stores a transaction directly, bypassing the session check.
    #[allow(clippy::too_many_arguments)]
    pub async fn record(
        keeper: &Bookkeeper,
        kind: TransactionType,
        customer: &str,
        collector: &str,
        units: i64,
        total_yuan: i64,
        created_at: DateTime<Utc>,
    ) -> Transaction {
        let tx = Transaction {
            id: Bookkeeper::new_id(),
            transaction_type: kind,
            customer_name: customer.to_string(),
            product_name: None,
            collector: collector.to_string(),
            quantity: Quantity::from_units(units),
            gift_quantity: Quantity::zero(),
            unit_price: Money::zero(),
            total_amount: Money::from_yuan(total_yuan),
            created_at,
        };
        keeper.store().insert_transaction(&tx).await.unwrap();
        tx
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn test_clock_drives_month_and_today() {
        let keeper = bookkeeper_at(at(2024, 2, 29));
        assert_eq!(keeper.current_month(), YearMonth::new(2024, 2).unwrap());
        assert_eq!(keeper.today(), NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
    }

    #[test]
    fn test_today_follows_business_offset() {
        let calendar = BusinessCalendar::from_utc_offset_hours(8).unwrap();
        let late_evening_utc = chrono::TimeZone::with_ymd_and_hms(&Utc, 2024, 6, 30, 20, 0, 0).unwrap();
        let keeper = Bookkeeper::new(Arc::new(tally_db::MemoryStore::new()), calendar)
            .with_clock(move || late_evening_utc);

        assert_eq!(keeper.today(), NaiveDate::from_ymd_opt(2024, 7, 1).unwrap());
        assert_eq!(keeper.current_month(), YearMonth::new(2024, 7).unwrap());
    }

    #[test]
    fn test_authorize() {
        let keeper = bookkeeper();
        assert!(keeper.authorize(&merchant(), "create transfer").is_ok());

        let err = keeper.authorize(&clerk(), "create transfer").unwrap_err();
        assert_eq!(err.code, ErrorCode::PermissionDenied);
        assert_eq!(err.message, "Role employee may not create transfer");
    }
}
