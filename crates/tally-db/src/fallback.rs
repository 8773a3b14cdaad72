//! # Fallback Store
//!
//! A [`RecordStore`] decorator that keeps the bookkeeping usable while the
//! primary store is down.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  call ──► primary ──► Ok / NotFound / Duplicate / Conflict ──► caller   │
//! │              │                                                          │
//! │              └── unavailable (connection, pool, query failure)          │
//! │                      │                                                  │
//! │                      ▼                                                  │
//! │                   warn! ──► secondary ──► caller                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Only [`DbError::is_unavailable`] errors trigger the fallback. A request
//! the primary rejected on its merits would be rejected the same way by
//! the secondary, so those errors pass straight through.
//!
//! Records written to the secondary store stay there. Nothing copies them
//! back once the primary recovers.

use async_trait::async_trait;
use tracing::warn;

use crate::error::{DbError, DbResult};
use crate::store::RecordStore;
use tally_core::{
    CustomerBinding, Deduction, Employee, EmployeeFilter, GiftRecord, InventoryChange,
    InventoryItem, SalaryRecord, Transaction, TransactionFilter, Transfer, Withdrawal, YearMonth,
};

/// Forwards to `primary`; retries on `secondary` when `primary` is unavailable.
#[derive(Debug, Clone)]
pub struct FallbackStore<P, S> {
    primary: P,
    secondary: S,
}

impl<P, S> FallbackStore<P, S> {
    pub fn new(primary: P, secondary: S) -> Self {
        FallbackStore { primary, secondary }
    }

    pub fn primary(&self) -> &P {
        &self.primary
    }

    pub fn secondary(&self) -> &S {
        &self.secondary
    }
}

fn log_degraded(operation: &'static str, err: &DbError) {
    warn!(operation, error = %err, "Primary store unavailable, using secondary store");
}

/// Runs one store call on the primary, and again on the secondary if needed.
macro_rules! with_fallback {
    ($self:ident . $op:ident ( $($arg:expr),* )) => {
        match $self.primary.$op($($arg),*).await {
            Err(err) if err.is_unavailable() => {
                log_degraded(stringify!($op), &err);
                $self.secondary.$op($($arg),*).await
            }
            result => result,
        }
    };
}

#[async_trait]
impl<P, S> RecordStore for FallbackStore<P, S>
where
    P: RecordStore,
    S: RecordStore,
{
    async fn list_transactions(&self, filter: &TransactionFilter) -> DbResult<Vec<Transaction>> {
        with_fallback!(self.list_transactions(filter))
    }

    async fn get_transaction(&self, id: &str) -> DbResult<Option<Transaction>> {
        with_fallback!(self.get_transaction(id))
    }

    async fn insert_transaction(&self, tx: &Transaction) -> DbResult<()> {
        with_fallback!(self.insert_transaction(tx))
    }

    async fn update_transaction(&self, tx: &Transaction) -> DbResult<()> {
        with_fallback!(self.update_transaction(tx))
    }

    async fn delete_transaction(&self, id: &str) -> DbResult<Transaction> {
        with_fallback!(self.delete_transaction(id))
    }

    async fn list_employees(&self, filter: &EmployeeFilter) -> DbResult<Vec<Employee>> {
        with_fallback!(self.list_employees(filter))
    }

    async fn get_employee(&self, id: &str) -> DbResult<Option<Employee>> {
        with_fallback!(self.get_employee(id))
    }

    async fn insert_employee(&self, employee: &Employee) -> DbResult<()> {
        with_fallback!(self.insert_employee(employee))
    }

    async fn update_employee(&self, employee: &Employee) -> DbResult<()> {
        with_fallback!(self.update_employee(employee))
    }

    async fn list_bindings(&self) -> DbResult<Vec<CustomerBinding>> {
        with_fallback!(self.list_bindings())
    }

    async fn upsert_binding(&self, binding: &CustomerBinding) -> DbResult<()> {
        with_fallback!(self.upsert_binding(binding))
    }

    async fn delete_binding(&self, customer_name: &str) -> DbResult<bool> {
        with_fallback!(self.delete_binding(customer_name))
    }

    async fn list_transfers(&self) -> DbResult<Vec<Transfer>> {
        with_fallback!(self.list_transfers())
    }

    async fn insert_transfer(&self, transfer: &Transfer) -> DbResult<()> {
        with_fallback!(self.insert_transfer(transfer))
    }

    async fn list_withdrawals(&self) -> DbResult<Vec<Withdrawal>> {
        with_fallback!(self.list_withdrawals())
    }

    async fn insert_withdrawal(&self, withdrawal: &Withdrawal) -> DbResult<()> {
        with_fallback!(self.insert_withdrawal(withdrawal))
    }

    async fn delete_withdrawal(&self, id: &str) -> DbResult<()> {
        with_fallback!(self.delete_withdrawal(id))
    }

    async fn list_deductions(&self, month: Option<YearMonth>) -> DbResult<Vec<Deduction>> {
        with_fallback!(self.list_deductions(month))
    }

    async fn append_deduction_if_unchanged(
        &self,
        deduction: &Deduction,
        expected_count: i64,
    ) -> DbResult<()> {
        with_fallback!(self.append_deduction_if_unchanged(deduction, expected_count))
    }

    async fn append_gift_records(&self, records: &[GiftRecord]) -> DbResult<()> {
        with_fallback!(self.append_gift_records(records))
    }

    async fn list_gift_records(&self) -> DbResult<Vec<GiftRecord>> {
        with_fallback!(self.list_gift_records())
    }

    async fn append_salary_record(&self, record: &SalaryRecord) -> DbResult<()> {
        with_fallback!(self.append_salary_record(record))
    }

    async fn list_salary_records(&self) -> DbResult<Vec<SalaryRecord>> {
        with_fallback!(self.list_salary_records())
    }

    async fn list_inventory(&self) -> DbResult<Vec<InventoryItem>> {
        with_fallback!(self.list_inventory())
    }

    async fn list_inventory_changes(&self) -> DbResult<Vec<InventoryChange>> {
        with_fallback!(self.list_inventory_changes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use crate::pool::{Database, DbConfig};
    use chrono::{NaiveDate, TimeZone, Utc};
    use tally_core::{EmployeeStatus, Money, Role};

    fn transfer(id: &str) -> Transfer {
        Transfer {
            id: id.to_string(),
            employee_name: "Zhang San".to_string(),
            amount: Money::from_yuan(100),
            transfer_date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            note: None,
            created_at: Utc.with_ymd_and_hms(2024, 6, 1, 4, 0, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_healthy_primary_serves_everything() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let store = FallbackStore::new(db, MemoryStore::new());

        store.insert_transfer(&transfer("tr1")).await.unwrap();

        assert_eq!(store.primary().list_transfers().await.unwrap().len(), 1);
        assert!(store.secondary().list_transfers().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_closed_primary_falls_back() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.close().await;
        let store = FallbackStore::new(db, MemoryStore::new());

        store.insert_transfer(&transfer("tr1")).await.unwrap();
        let transfers = store.list_transfers().await.unwrap();

        assert_eq!(transfers.len(), 1);
        assert_eq!(store.secondary().list_transfers().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_rejections_are_not_retried() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let store = FallbackStore::new(db, MemoryStore::new());

        let employee = Employee {
            id: "e1".to_string(),
            name: "Zhang San".to_string(),
            username: "zhangsan".to_string(),
            role: Role::Employee,
            status: EmployeeStatus::Active,
            created_at: Utc.with_ymd_and_hms(2024, 6, 1, 4, 0, 0).unwrap(),
        };
        store.insert_employee(&employee).await.unwrap();

        let twin = Employee {
            id: "e2".to_string(),
            ..employee
        };
        let err = store.insert_employee(&twin).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));

        // The secondary would have accepted it.
        let all = EmployeeFilter::default();
        assert!(store.secondary().list_employees(&all).await.unwrap().is_empty());
    }
}
