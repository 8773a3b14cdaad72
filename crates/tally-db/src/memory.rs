//! # In-Memory Record Store
//!
//! A [`RecordStore`] kept entirely in process memory.
//!
//! ## Usage
//! - Fast, isolated store for service tests
//! - Secondary store behind [`FallbackStore`](crate::fallback::FallbackStore)
//!   while the database is unreachable
//!
//! It follows the same contract as the SQLite store: same ordering, same
//! uniqueness rules, same stock side effects and the same conditional
//! deduction append. Each call holds one lock for its whole duration, so
//! every write is atomic.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::store::RecordStore;
use tally_core::inventory::{stock_movement, StockMovement};
use tally_core::{
    CustomerBinding, Deduction, Employee, EmployeeFilter, GiftRecord, InventoryChange,
    InventoryItem, SalaryRecord, Transaction, TransactionFilter, Transfer, Withdrawal, YearMonth,
};

#[derive(Debug, Default)]
struct MemoryState {
    transactions: Vec<Transaction>,
    employees: Vec<Employee>,
    bindings: Vec<CustomerBinding>,
    transfers: Vec<Transfer>,
    withdrawals: Vec<Withdrawal>,
    deductions: Vec<Deduction>,
    gift_records: Vec<GiftRecord>,
    salary_records: Vec<SalaryRecord>,
    inventory: BTreeMap<String, InventoryItem>,
    inventory_changes: Vec<InventoryChange>,
}

impl MemoryState {
    fn apply_movement(&mut self, movement: &StockMovement, transaction_id: &str, at: DateTime<Utc>) {
        let old_stock = self
            .inventory
            .get(&movement.product_name)
            .map(|item| item.current_stock)
            .unwrap_or_default();

        let change = movement.to_change(
            Uuid::new_v4().to_string(),
            old_stock,
            Some(transaction_id.to_string()),
            at,
        );

        self.inventory.insert(
            change.product_name.clone(),
            InventoryItem {
                product_name: change.product_name.clone(),
                current_stock: change.new_stock,
                updated_at: at,
            },
        );
        self.inventory_changes.push(change);
    }

    fn transaction_index(&self, id: &str) -> DbResult<usize> {
        self.transactions
            .iter()
            .position(|tx| tx.id == id)
            .ok_or_else(|| DbError::not_found("Transaction", id))
    }
}

/// Newest first; among equal timestamps the later insert comes first.
fn newest_first<T: Clone>(items: &[T], created_at: impl Fn(&T) -> DateTime<Utc>) -> Vec<T> {
    let mut out: Vec<T> = items.iter().rev().cloned().collect();
    out.sort_by(|a, b| created_at(b).cmp(&created_at(a)));
    out
}

/// Record store backed by process memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        MemoryStore::default()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    // =========================================================================
    // Transactions
    // =========================================================================

    async fn list_transactions(&self, filter: &TransactionFilter) -> DbResult<Vec<Transaction>> {
        let state = self.state.read().await;
        let matching: Vec<Transaction> = state
            .transactions
            .iter()
            .filter(|tx| filter.matches(tx))
            .cloned()
            .collect();

        let mut out = newest_first(&matching, |tx| tx.created_at);
        if let Some(limit) = filter.limit {
            out.truncate(limit as usize);
        }
        Ok(out)
    }

    async fn get_transaction(&self, id: &str) -> DbResult<Option<Transaction>> {
        let state = self.state.read().await;
        Ok(state.transactions.iter().find(|tx| tx.id == id).cloned())
    }

    async fn insert_transaction(&self, tx: &Transaction) -> DbResult<()> {
        debug!(id = %tx.id, kind = %tx.transaction_type, "Inserting transaction (memory)");

        let mut state = self.state.write().await;
        if state.transactions.iter().any(|existing| existing.id == tx.id) {
            return Err(DbError::duplicate("id", &tx.id));
        }

        state.transactions.push(tx.clone());
        if let Some(movement) = stock_movement(tx) {
            state.apply_movement(&movement, &tx.id, Utc::now());
        }
        Ok(())
    }

    async fn update_transaction(&self, tx: &Transaction) -> DbResult<()> {
        let mut state = self.state.write().await;
        let index = state.transaction_index(&tx.id)?;
        let now = Utc::now();

        let old = state.transactions[index].clone();
        if let Some(movement) = stock_movement(&old) {
            state.apply_movement(&movement.reversed(), &old.id, now);
        }

        // The creation time is fixed once written.
        let mut updated = tx.clone();
        updated.created_at = old.created_at;
        state.transactions[index] = updated;

        if let Some(movement) = stock_movement(tx) {
            state.apply_movement(&movement, &tx.id, now);
        }
        Ok(())
    }

    async fn delete_transaction(&self, id: &str) -> DbResult<Transaction> {
        let mut state = self.state.write().await;
        let index = state.transaction_index(id)?;

        let old = state.transactions.remove(index);
        if let Some(movement) = stock_movement(&old) {
            state.apply_movement(&movement.reversed(), &old.id, Utc::now());
        }
        Ok(old)
    }

    // =========================================================================
    // Employees
    // =========================================================================

    async fn list_employees(&self, filter: &EmployeeFilter) -> DbResult<Vec<Employee>> {
        let state = self.state.read().await;
        let matching: Vec<Employee> = state
            .employees
            .iter()
            .filter(|employee| filter.matches(employee))
            .cloned()
            .collect();
        Ok(newest_first(&matching, |employee| employee.created_at))
    }

    async fn get_employee(&self, id: &str) -> DbResult<Option<Employee>> {
        let state = self.state.read().await;
        Ok(state.employees.iter().find(|employee| employee.id == id).cloned())
    }

    async fn insert_employee(&self, employee: &Employee) -> DbResult<()> {
        let mut state = self.state.write().await;
        if state
            .employees
            .iter()
            .any(|existing| existing.username == employee.username)
        {
            return Err(DbError::duplicate("username", &employee.username));
        }
        state.employees.push(employee.clone());
        Ok(())
    }

    async fn update_employee(&self, employee: &Employee) -> DbResult<()> {
        let mut state = self.state.write().await;
        let existing = state
            .employees
            .iter_mut()
            .find(|existing| existing.id == employee.id)
            .ok_or_else(|| DbError::not_found("Employee", &employee.id))?;

        existing.name = employee.name.clone();
        existing.role = employee.role;
        existing.status = employee.status;
        Ok(())
    }

    // =========================================================================
    // Customer bindings
    // =========================================================================

    async fn list_bindings(&self) -> DbResult<Vec<CustomerBinding>> {
        let state = self.state.read().await;
        Ok(newest_first(&state.bindings, |binding| binding.created_at))
    }

    async fn upsert_binding(&self, binding: &CustomerBinding) -> DbResult<()> {
        let mut state = self.state.write().await;
        state
            .bindings
            .retain(|existing| existing.customer_name != binding.customer_name);
        state.bindings.push(binding.clone());
        Ok(())
    }

    async fn delete_binding(&self, customer_name: &str) -> DbResult<bool> {
        let mut state = self.state.write().await;
        let before = state.bindings.len();
        state
            .bindings
            .retain(|existing| existing.customer_name != customer_name);
        Ok(state.bindings.len() < before)
    }

    // =========================================================================
    // Transfers and withdrawals
    // =========================================================================

    async fn list_transfers(&self) -> DbResult<Vec<Transfer>> {
        let state = self.state.read().await;
        Ok(newest_first(&state.transfers, |transfer| transfer.created_at))
    }

    async fn insert_transfer(&self, transfer: &Transfer) -> DbResult<()> {
        self.state.write().await.transfers.push(transfer.clone());
        Ok(())
    }

    async fn list_withdrawals(&self) -> DbResult<Vec<Withdrawal>> {
        let state = self.state.read().await;
        Ok(newest_first(&state.withdrawals, |withdrawal| withdrawal.created_at))
    }

    async fn insert_withdrawal(&self, withdrawal: &Withdrawal) -> DbResult<()> {
        self.state.write().await.withdrawals.push(withdrawal.clone());
        Ok(())
    }

    async fn delete_withdrawal(&self, id: &str) -> DbResult<()> {
        let mut state = self.state.write().await;
        let index = state
            .withdrawals
            .iter()
            .position(|withdrawal| withdrawal.id == id)
            .ok_or_else(|| DbError::not_found("Withdrawal", id))?;
        state.withdrawals.remove(index);
        Ok(())
    }

    // =========================================================================
    // Bonus deductions
    // =========================================================================

    async fn list_deductions(&self, month: Option<YearMonth>) -> DbResult<Vec<Deduction>> {
        let state = self.state.read().await;
        let matching: Vec<Deduction> = state
            .deductions
            .iter()
            .filter(|d| month.map_or(true, |m| d.year == m.year() && d.month == m.month()))
            .cloned()
            .collect();
        Ok(newest_first(&matching, |d| d.created_at))
    }

    async fn append_deduction_if_unchanged(
        &self,
        deduction: &Deduction,
        expected_count: i64,
    ) -> DbResult<()> {
        let mut state = self.state.write().await;
        if state.deductions.len() as i64 != expected_count {
            return Err(DbError::conflict("bonus_deductions", expected_count));
        }
        state.deductions.push(deduction.clone());
        Ok(())
    }

    // =========================================================================
    // Logs
    // =========================================================================

    async fn append_gift_records(&self, records: &[GiftRecord]) -> DbResult<()> {
        self.state
            .write()
            .await
            .gift_records
            .extend_from_slice(records);
        Ok(())
    }

    async fn list_gift_records(&self) -> DbResult<Vec<GiftRecord>> {
        let state = self.state.read().await;
        Ok(newest_first(&state.gift_records, |record| record.created_at))
    }

    async fn append_salary_record(&self, record: &SalaryRecord) -> DbResult<()> {
        self.state.write().await.salary_records.push(record.clone());
        Ok(())
    }

    async fn list_salary_records(&self) -> DbResult<Vec<SalaryRecord>> {
        let state = self.state.read().await;
        let mut out = newest_first(&state.salary_records, |record| record.created_at);
        out.sort_by(|a, b| (b.year, b.month).cmp(&(a.year, a.month)));
        Ok(out)
    }

    // =========================================================================
    // Inventory
    // =========================================================================

    async fn list_inventory(&self) -> DbResult<Vec<InventoryItem>> {
        let state = self.state.read().await;
        Ok(state.inventory.values().cloned().collect())
    }

    async fn list_inventory_changes(&self) -> DbResult<Vec<InventoryChange>> {
        let state = self.state.read().await;
        Ok(newest_first(&state.inventory_changes, |change| change.created_at))
    }
}
