//! # Record Store
//!
//! The single boundary between the bookkeeping rules and wherever records
//! are kept.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                 Bookkeeper (Arc<dyn RecordStore>)                       │
//! │                               │                                         │
//! │          ┌────────────────────┼─────────────────────┐                   │
//! │          ▼                    ▼                     ▼                   │
//! │  ┌───────────────┐   ┌────────────────┐   ┌─────────────────────────┐  │
//! │  │   Database    │   │  MemoryStore   │   │  FallbackStore<P, S>    │  │
//! │  │   (SQLite)    │   │ (tests/offline)│   │  P fails → warn → S     │  │
//! │  └───────────────┘   └────────────────┘   └─────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Contract
//! - Every list is newest first, except inventory (by product name) and
//!   the salary log (latest month first).
//! - `insert_transaction`, `update_transaction` and `delete_transaction`
//!   move stock in the same atomic step as the record write.
//! - `append_deduction_if_unchanged` fails with [`DbError::Conflict`] when
//!   the deduction log no longer holds `expected_count` rows.
//! - IDs and timestamps arrive on the records; stores only generate IDs
//!   for the inventory change log.
//!
//! [`DbError::Conflict`]: crate::error::DbError::Conflict

use async_trait::async_trait;

use crate::error::DbResult;
use crate::pool::Database;
use tally_core::{
    CustomerBinding, Deduction, Employee, EmployeeFilter, GiftRecord, InventoryChange,
    InventoryItem, SalaryRecord, Transaction, TransactionFilter, Transfer, Withdrawal, YearMonth,
};

/// Storage operations the bookkeeping service depends on.
#[async_trait]
pub trait RecordStore: Send + Sync {
    // Transactions
    async fn list_transactions(&self, filter: &TransactionFilter) -> DbResult<Vec<Transaction>>;
    async fn get_transaction(&self, id: &str) -> DbResult<Option<Transaction>>;
    async fn insert_transaction(&self, tx: &Transaction) -> DbResult<()>;
    /// Replaces the stored transaction with the same ID.
    async fn update_transaction(&self, tx: &Transaction) -> DbResult<()>;
    /// Returns the deleted transaction.
    async fn delete_transaction(&self, id: &str) -> DbResult<Transaction>;

    // Employees
    async fn list_employees(&self, filter: &EmployeeFilter) -> DbResult<Vec<Employee>>;
    async fn get_employee(&self, id: &str) -> DbResult<Option<Employee>>;
    /// Fails with `UniqueViolation` when the username is taken.
    async fn insert_employee(&self, employee: &Employee) -> DbResult<()>;
    async fn update_employee(&self, employee: &Employee) -> DbResult<()>;

    // Customer bindings
    async fn list_bindings(&self) -> DbResult<Vec<CustomerBinding>>;
    /// Replaces any existing binding for the same customer.
    async fn upsert_binding(&self, binding: &CustomerBinding) -> DbResult<()>;
    /// Returns whether a binding existed.
    async fn delete_binding(&self, customer_name: &str) -> DbResult<bool>;

    // Transfers and withdrawals
    async fn list_transfers(&self) -> DbResult<Vec<Transfer>>;
    async fn insert_transfer(&self, transfer: &Transfer) -> DbResult<()>;
    async fn list_withdrawals(&self) -> DbResult<Vec<Withdrawal>>;
    async fn insert_withdrawal(&self, withdrawal: &Withdrawal) -> DbResult<()>;
    async fn delete_withdrawal(&self, id: &str) -> DbResult<()>;

    // Bonus deductions
    async fn list_deductions(&self, month: Option<YearMonth>) -> DbResult<Vec<Deduction>>;
    async fn append_deduction_if_unchanged(
        &self,
        deduction: &Deduction,
        expected_count: i64,
    ) -> DbResult<()>;

    // Logs
    async fn append_gift_records(&self, records: &[GiftRecord]) -> DbResult<()>;
    async fn list_gift_records(&self) -> DbResult<Vec<GiftRecord>>;
    async fn append_salary_record(&self, record: &SalaryRecord) -> DbResult<()>;
    async fn list_salary_records(&self) -> DbResult<Vec<SalaryRecord>>;

    // Inventory
    async fn list_inventory(&self) -> DbResult<Vec<InventoryItem>>;
    async fn list_inventory_changes(&self) -> DbResult<Vec<InventoryChange>>;
}

// =============================================================================
// SQLite
// =============================================================================

#[async_trait]
impl RecordStore for Database {
    async fn list_transactions(&self, filter: &TransactionFilter) -> DbResult<Vec<Transaction>> {
        self.transactions().list(filter).await
    }

    async fn get_transaction(&self, id: &str) -> DbResult<Option<Transaction>> {
        self.transactions().get_by_id(id).await
    }

    async fn insert_transaction(&self, tx: &Transaction) -> DbResult<()> {
        self.transactions().insert(tx).await
    }

    async fn update_transaction(&self, tx: &Transaction) -> DbResult<()> {
        self.transactions().update(tx).await
    }

    async fn delete_transaction(&self, id: &str) -> DbResult<Transaction> {
        self.transactions().delete(id).await
    }

    async fn list_employees(&self, filter: &EmployeeFilter) -> DbResult<Vec<Employee>> {
        self.employees().list(filter).await
    }

    async fn get_employee(&self, id: &str) -> DbResult<Option<Employee>> {
        self.employees().get_by_id(id).await
    }

    async fn insert_employee(&self, employee: &Employee) -> DbResult<()> {
        self.employees().insert(employee).await
    }

    async fn update_employee(&self, employee: &Employee) -> DbResult<()> {
        self.employees().update(employee).await
    }

    async fn list_bindings(&self) -> DbResult<Vec<CustomerBinding>> {
        self.bindings().list().await
    }

    async fn upsert_binding(&self, binding: &CustomerBinding) -> DbResult<()> {
        self.bindings().upsert(binding).await
    }

    async fn delete_binding(&self, customer_name: &str) -> DbResult<bool> {
        self.bindings().delete(customer_name).await
    }

    async fn list_transfers(&self) -> DbResult<Vec<Transfer>> {
        self.payments().list_transfers().await
    }

    async fn insert_transfer(&self, transfer: &Transfer) -> DbResult<()> {
        self.payments().insert_transfer(transfer).await
    }

    async fn list_withdrawals(&self) -> DbResult<Vec<Withdrawal>> {
        self.payments().list_withdrawals().await
    }

    async fn insert_withdrawal(&self, withdrawal: &Withdrawal) -> DbResult<()> {
        self.payments().insert_withdrawal(withdrawal).await
    }

    async fn delete_withdrawal(&self, id: &str) -> DbResult<()> {
        self.payments().delete_withdrawal(id).await
    }

    async fn list_deductions(&self, month: Option<YearMonth>) -> DbResult<Vec<Deduction>> {
        self.deductions().list(month).await
    }

    async fn append_deduction_if_unchanged(
        &self,
        deduction: &Deduction,
        expected_count: i64,
    ) -> DbResult<()> {
        self.deductions()
            .append_if_unchanged(deduction, expected_count)
            .await
    }

    async fn append_gift_records(&self, records: &[GiftRecord]) -> DbResult<()> {
        self.logs().append_gift_records(records).await
    }

    async fn list_gift_records(&self) -> DbResult<Vec<GiftRecord>> {
        self.logs().list_gift_records().await
    }

    async fn append_salary_record(&self, record: &SalaryRecord) -> DbResult<()> {
        self.logs().append_salary_record(record).await
    }

    async fn list_salary_records(&self) -> DbResult<Vec<SalaryRecord>> {
        self.logs().list_salary_records().await
    }

    async fn list_inventory(&self) -> DbResult<Vec<InventoryItem>> {
        self.inventory().list().await
    }

    async fn list_inventory_changes(&self) -> DbResult<Vec<InventoryChange>> {
        self.inventory().list_changes().await
    }
}

// =============================================================================
// Contract Tests (run against every implementation)
// =============================================================================
