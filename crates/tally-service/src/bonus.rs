//! Bonus pool operations.
//!
//! ## Deduction Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  deduct_bonus(session, amount)                                          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  authorize ──► read deductions (n rows) ──► recompute balance           │
//! │                        ▲                          │                     │
//! │                        │                          ▼                     │
//! │                        │                 amount > balance? ──► reject   │
//! │                        │                          │                     │
//! │                        │                          ▼                     │
//! │                        │          append only if still n rows           │
//! │                        │                          │                     │
//! │                        └──── Conflict (≤ 3 tries) ┤                     │
//! │                                                   ▼                     │
//! │                                              Deduction                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Two operators deducting at once can no longer both spend the same
//! balance: the loser sees the winner's row on retry and is re-checked
//! against the smaller balance.

use tally_core::bonus_pool::{self, BonusPoolSnapshot};
use tally_core::{Deduction, EmployeeFilter, Money, Session, TransactionFilter, YearMonth};
use tally_db::DbError;
use tracing::{debug, info, warn};

use crate::bookkeeper::Bookkeeper;
use crate::error::{ApiError, ApiResult, ErrorCode};

/// Attempts at the conditional append before giving up.
pub const DEDUCTION_ATTEMPTS: u32 = 3;

impl Bookkeeper {
    /// The pool as of `month` (default: the current month).
    ///
    /// Monthly figures cover `month` only; the cumulative pool and the
    /// deductions cover all history.
    pub async fn calculate_bonus_pool(&self, month: Option<YearMonth>) -> ApiResult<BonusPoolSnapshot> {
        let month = month.unwrap_or_else(|| self.current_month());
        debug!(%month, "calculate_bonus_pool");

        let deductions = self.store().list_deductions(None).await?;
        self.bonus_snapshot(month, &deductions).await
    }

    /// Takes `amount` out of the pool on behalf of `session`.
    pub async fn deduct_bonus(&self, session: &Session, amount: Money) -> ApiResult<Deduction> {
        self.authorize(session, "deduct from the bonus pool")?;

        for attempt in 1..=DEDUCTION_ATTEMPTS {
            let deductions = self.store().list_deductions(None).await?;
            let snapshot = self.bonus_snapshot(self.current_month(), &deductions).await?;

            let deduction = bonus_pool::prepare_deduction(
                Self::new_id(),
                amount,
                session,
                snapshot.current_balance,
                self.now(),
                self.calendar(),
            )
            .map_err(|err| {
                warn!(
                    operator = %session.name,
                    %amount,
                    balance = %snapshot.current_balance,
                    "Bonus deduction rejected: {}",
                    err
                );
                ApiError::from(err)
            })?;

            let expected = deductions.len() as i64;
            match self.store().append_deduction_if_unchanged(&deduction, expected).await {
                Ok(()) => {
                    info!(
                        operator = %session.name,
                        %amount,
                        remaining = %deduction.remaining_balance,
                        "Bonus deducted"
                    );
                    return Ok(deduction);
                }
                Err(DbError::Conflict { .. }) => {
                    warn!(attempt, %amount, "Bonus pool changed during deduction, retrying");
                }
                Err(err) => return Err(err.into()),
            }
        }

        Err(ApiError::new(
            ErrorCode::Conflict,
            format!(
                "Bonus pool kept changing, deduction not recorded after {} attempts",
                DEDUCTION_ATTEMPTS
            ),
        ))
    }

    /// The deduction log, newest first, optionally for one month.
    pub async fn get_deductions(&self, month: Option<YearMonth>) -> ApiResult<Vec<Deduction>> {
        Ok(self.store().list_deductions(month).await?)
    }

    async fn bonus_snapshot(
        &self,
        month: YearMonth,
        deductions: &[Deduction],
    ) -> ApiResult<BonusPoolSnapshot> {
        let transactions = self.store().list_transactions(&TransactionFilter::all()).await?;
        let employees = self.store().list_employees(&EmployeeFilter::default()).await?;

        Ok(bonus_pool::calculate_bonus_pool(
            month,
            &transactions,
            &employees,
            deductions,
            self.calendar(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bookkeeper::fixtures::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use tally_core::{
        BusinessCalendar, CustomerBinding, Employee, GiftRecord, InventoryChange, InventoryItem,
        Role, SalaryRecord, Transaction, TransactionType, Transfer, Withdrawal,
    };
    use tally_db::{Database, DbConfig, DbResult, MemoryStore, RecordStore};

    /// 1,000,000 in sales, one salary of 3,070: net profit 966,930,
    /// monthly pool 9,669.30.
    async fn june_with_profit(keeper: &Bookkeeper) {
        hire(keeper, "Zhang San", Role::Employee).await;
        record(keeper, TransactionType::Sale, "Li Si", "Zhang San", 100, 1_000_000, at(2024, 6, 3)).await;
    }

    #[tokio::test]
    async fn test_pool_snapshot() {
        let keeper = bookkeeper();
        june_with_profit(&keeper).await;

        let snapshot = keeper.calculate_bonus_pool(None).await.unwrap();

        assert_eq!((snapshot.year, snapshot.month), (2024, 6));
        assert_eq!(snapshot.total_salary, Money::from_yuan(3_070));
        assert_eq!(snapshot.net_profit, Money::from_yuan(966_930));
        assert_eq!(snapshot.bonus_pool, Money::from_major_minor(9_669, 30));
        assert_eq!(snapshot.current_balance, snapshot.cumulative_bonus_pool);
    }

    #[tokio::test]
    async fn test_empty_month_is_zero_sales_not_error() {
        let keeper = bookkeeper();
        let snapshot = keeper
            .calculate_bonus_pool(Some(YearMonth::new(2023, 1).unwrap()))
            .await
            .unwrap();

        assert_eq!(snapshot.sales_amount, Money::zero());
        assert_eq!(snapshot.net_profit, Money::from_yuan(-30_000));
        assert_eq!(snapshot.cumulative_bonus_pool, Money::zero());
    }

    #[tokio::test]
    async fn test_deduction_reduces_balance() {
        let keeper = bookkeeper();
        june_with_profit(&keeper).await;
        let before = keeper.calculate_bonus_pool(None).await.unwrap().current_balance;

        let deduction = keeper.deduct_bonus(&merchant(), Money::from_yuan(1_000)).await.unwrap();

        assert_eq!(deduction.remaining_balance, before - Money::from_yuan(1_000));
        assert_eq!(deduction.operator_name, "Boss Chen");
        assert_eq!((deduction.year, deduction.month), (2024, 6));

        let after = keeper.calculate_bonus_pool(None).await.unwrap();
        assert_eq!(after.total_deductions, Money::from_yuan(1_000));
        assert_eq!(after.current_balance, deduction.remaining_balance);
    }

    #[tokio::test]
    async fn test_overdraw_is_rejected_and_nothing_written() {
        let keeper = bookkeeper();
        june_with_profit(&keeper).await;

        let err = keeper
            .deduct_bonus(&merchant(), Money::from_yuan(50_000))
            .await
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::InsufficientBalance);
        assert!(keeper.get_deductions(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_deducting_500_from_300_changes_nothing() {
        let keeper = bookkeeper();
        // No salaried staff: net profit 60,000 - 30,000 = 30,000, pool 300.
        record(&keeper, TransactionType::Sale, "Li Si", "Boss Chen", 10, 60_000, at(2024, 6, 3)).await;
        assert_eq!(
            keeper.calculate_bonus_pool(None).await.unwrap().current_balance,
            Money::from_yuan(300)
        );

        let err = keeper.deduct_bonus(&merchant(), Money::from_yuan(500)).await.unwrap_err();

        assert_eq!(err.code, ErrorCode::InsufficientBalance);
        assert!(keeper.get_deductions(None).await.unwrap().is_empty());
        assert_eq!(
            keeper.calculate_bonus_pool(None).await.unwrap().current_balance,
            Money::from_yuan(300)
        );
    }

    #[tokio::test]
    async fn test_deduction_requires_positive_amount_and_privilege() {
        let keeper = bookkeeper();
        june_with_profit(&keeper).await;

        let err = keeper.deduct_bonus(&merchant(), Money::zero()).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let err = keeper.deduct_bonus(&clerk(), Money::from_yuan(10)).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::PermissionDenied);
    }

    #[tokio::test]
    async fn test_deductions_filtered_by_month() {
        let keeper = bookkeeper();
        june_with_profit(&keeper).await;
        keeper.deduct_bonus(&merchant(), Money::from_yuan(10)).await.unwrap();
        keeper.deduct_bonus(&merchant(), Money::from_yuan(20)).await.unwrap();

        let june = keeper.get_deductions(YearMonth::new(2024, 6).ok()).await.unwrap();
        assert_eq!(june.len(), 2);
        let may = keeper.get_deductions(YearMonth::new(2024, 5).ok()).await.unwrap();
        assert!(may.is_empty());
    }

    /// Loses the first `losses` conditional appends, as if another operator
    /// had deducted in between.
    struct Contended {
        inner: MemoryStore,
        losses: AtomicU32,
    }

    #[async_trait]
    impl RecordStore for Contended {
        async fn list_transactions(&self, f: &TransactionFilter) -> DbResult<Vec<Transaction>> {
            self.inner.list_transactions(f).await
        }
        async fn get_transaction(&self, id: &str) -> DbResult<Option<Transaction>> {
            self.inner.get_transaction(id).await
        }
        async fn insert_transaction(&self, tx: &Transaction) -> DbResult<()> {
            self.inner.insert_transaction(tx).await
        }
        async fn update_transaction(&self, tx: &Transaction) -> DbResult<()> {
            self.inner.update_transaction(tx).await
        }
        async fn delete_transaction(&self, id: &str) -> DbResult<Transaction> {
            self.inner.delete_transaction(id).await
        }
        async fn list_employees(&self, f: &EmployeeFilter) -> DbResult<Vec<Employee>> {
            self.inner.list_employees(f).await
        }
        async fn get_employee(&self, id: &str) -> DbResult<Option<Employee>> {
            self.inner.get_employee(id).await
        }
        async fn insert_employee(&self, e: &Employee) -> DbResult<()> {
            self.inner.insert_employee(e).await
        }
        async fn update_employee(&self, e: &Employee) -> DbResult<()> {
            self.inner.update_employee(e).await
        }
        async fn list_bindings(&self) -> DbResult<Vec<CustomerBinding>> {
            self.inner.list_bindings().await
        }
        async fn upsert_binding(&self, b: &CustomerBinding) -> DbResult<()> {
            self.inner.upsert_binding(b).await
        }
        async fn delete_binding(&self, customer: &str) -> DbResult<bool> {
            self.inner.delete_binding(customer).await
        }
        async fn list_transfers(&self) -> DbResult<Vec<Transfer>> {
            self.inner.list_transfers().await
        }
        async fn insert_transfer(&self, t: &Transfer) -> DbResult<()> {
            self.inner.insert_transfer(t).await
        }
        async fn list_withdrawals(&self) -> DbResult<Vec<Withdrawal>> {
            self.inner.list_withdrawals().await
        }
        async fn insert_withdrawal(&self, w: &Withdrawal) -> DbResult<()> {
            self.inner.insert_withdrawal(w).await
        }
        async fn delete_withdrawal(&self, id: &str) -> DbResult<()> {
            self.inner.delete_withdrawal(id).await
        }
        async fn list_deductions(&self, month: Option<YearMonth>) -> DbResult<Vec<Deduction>> {
            self.inner.list_deductions(month).await
        }
        async fn append_deduction_if_unchanged(&self, d: &Deduction, expected: i64) -> DbResult<()> {
            let lose = self
                .losses
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
            if lose {
                return Err(DbError::conflict("bonus_deductions", expected));
            }
            self.inner.append_deduction_if_unchanged(d, expected).await
        }
        async fn append_gift_records(&self, r: &[GiftRecord]) -> DbResult<()> {
            self.inner.append_gift_records(r).await
        }
        async fn list_gift_records(&self) -> DbResult<Vec<GiftRecord>> {
            self.inner.list_gift_records().await
        }
        async fn append_salary_record(&self, r: &SalaryRecord) -> DbResult<()> {
            self.inner.append_salary_record(r).await
        }
        async fn list_salary_records(&self) -> DbResult<Vec<SalaryRecord>> {
            self.inner.list_salary_records().await
        }
        async fn list_inventory(&self) -> DbResult<Vec<InventoryItem>> {
            self.inner.list_inventory().await
        }
        async fn list_inventory_changes(&self) -> DbResult<Vec<InventoryChange>> {
            self.inner.list_inventory_changes().await
        }
    }

    fn contended(losses: u32) -> Bookkeeper {
        let store = Contended {
            inner: MemoryStore::new(),
            losses: AtomicU32::new(losses),
        };
        let calendar = BusinessCalendar::from_utc_offset_hours(0).unwrap();
        Bookkeeper::new(Arc::new(store), calendar).with_clock(now)
    }

    #[tokio::test]
    async fn test_conflict_is_retried() {
        let keeper = contended(2);
        june_with_profit(&keeper).await;

        let deduction = keeper.deduct_bonus(&merchant(), Money::from_yuan(100)).await.unwrap();

        assert_eq!(deduction.amount, Money::from_yuan(100));
        assert_eq!(keeper.get_deductions(None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_persistent_conflict_surfaces() {
        let keeper = contended(DEDUCTION_ATTEMPTS);
        june_with_profit(&keeper).await;

        let err = keeper.deduct_bonus(&merchant(), Money::from_yuan(100)).await.unwrap_err();

        assert_eq!(err.code, ErrorCode::Conflict);
        assert!(keeper.get_deductions(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_second_deduction_sees_the_first() {
        let keeper = bookkeeper();
        june_with_profit(&keeper).await;
        let balance = keeper.calculate_bonus_pool(None).await.unwrap().current_balance;
        let two_thirds = Money::from_cents(balance.cents() * 2 / 3);
        let boss = merchant();

        let (a, b) = tokio::join!(
            keeper.deduct_bonus(&boss, two_thirds),
            keeper.deduct_bonus(&boss, two_thirds),
        );

        assert_eq!([a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count(), 1);
        let after = keeper.calculate_bonus_pool(None).await.unwrap();
        assert!(!after.current_balance.is_negative());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_racing_deductions_on_sqlite_cannot_overdraw() {
        let path = std::env::temp_dir().join(format!("tally-race-{}.db", uuid::Uuid::new_v4()));
        let db = Database::new(DbConfig::new(&path).max_connections(8)).await.unwrap();
        let calendar = BusinessCalendar::from_utc_offset_hours(0).unwrap();
        let keeper = Bookkeeper::new(Arc::new(db), calendar).with_clock(now);
        june_with_profit(&keeper).await;

        let balance = keeper.calculate_bonus_pool(None).await.unwrap().current_balance;
        let two_thirds = Money::from_cents(balance.cents() * 2 / 3);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let keeper = keeper.clone();
                tokio::spawn(async move { keeper.deduct_bonus(&merchant(), two_thirds).await })
            })
            .collect();

        let mut succeeded = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => succeeded += 1,
                Err(e) => assert!(
                    matches!(e.code, ErrorCode::InsufficientBalance | ErrorCode::Conflict),
                    "unexpected error: {}",
                    e
                ),
            }
        }

        assert_eq!(succeeded, 1);
        assert_eq!(keeper.get_deductions(None).await.unwrap().len(), 1);
        let after = keeper.calculate_bonus_pool(None).await.unwrap();
        assert_eq!(after.current_balance, balance - two_thirds);

        drop(keeper);
        for suffix in ["", "-wal", "-shm"] {
            let _ = std::fs::remove_file(format!("{}{}", path.display(), suffix));
        }
    }
}
