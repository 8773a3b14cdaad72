//! Transaction, employee and inventory operations.
//!
//! Stock is maintained by the store inside the same write as the
//! transaction, so nothing here touches inventory directly.

use tally_core::reconciliation::total_withdrawals;
use tally_core::stats::{transaction_stats, TransactionStats};
use tally_core::validation::{validate_name, validate_new_employee, validate_new_transaction, validate_transaction};
use tally_core::{
    Employee, EmployeeFilter, EmployeeStatus, EmployeeUpdate, InventoryChange, InventoryItem,
    NewEmployee, NewTransaction, Role, Session, Transaction, TransactionFilter, TransactionUpdate,
};
use tracing::{debug, info};

use crate::bookkeeper::Bookkeeper;
use crate::error::{ApiError, ApiResult};

impl Bookkeeper {
    // =========================================================================
    // Transactions
    // =========================================================================

    /// Records a transaction stamped with the current time.
    pub async fn create_transaction(
        &self,
        session: &Session,
        new: NewTransaction,
    ) -> ApiResult<Transaction> {
        self.authorize(session, "create transaction")?;

        let validated = validate_new_transaction(&new)?;
        let tx = Transaction::from_new(Self::new_id(), validated, self.now());
        self.store().insert_transaction(&tx).await?;

        info!(
            id = %tx.id,
            kind = %tx.transaction_type,
            customer = %tx.customer_name,
            amount = %tx.total_amount,
            "Transaction recorded"
        );
        Ok(tx)
    }

    /// Applies `update` to an existing transaction.
    ///
    /// `created_at` never changes, so an edit cannot move a record into
    /// another month.
    pub async fn update_transaction(
        &self,
        session: &Session,
        id: &str,
        update: TransactionUpdate,
    ) -> ApiResult<Transaction> {
        self.authorize(session, "update transaction")?;

        let mut tx = self
            .store()
            .get_transaction(id)
            .await?
            .ok_or_else(|| ApiError::not_found("Transaction", id))?;

        if update.is_empty() {
            return Ok(tx);
        }

        update.apply_to(&mut tx);
        validate_transaction(&tx)?;
        self.store().update_transaction(&tx).await?;

        info!(id, updated_by = %session.name, "Transaction updated");
        Ok(tx)
    }

    /// Deletes a transaction and returns what was removed.
    pub async fn delete_transaction(&self, session: &Session, id: &str) -> ApiResult<Transaction> {
        self.authorize(session, "delete transaction")?;

        let removed = self.store().delete_transaction(id).await?;

        info!(id, deleted_by = %session.name, "Transaction deleted");
        Ok(removed)
    }

    /// Transactions matching `filter`, newest first.
    pub async fn get_transactions(&self, filter: &TransactionFilter) -> ApiResult<Vec<Transaction>> {
        debug!(?filter, "get_transactions");
        Ok(self.store().list_transactions(filter).await?)
    }

    /// Dashboard totals over the transactions matching `filter`.
    ///
    /// The limit is ignored: totals always cover every match. All
    /// withdrawals come off the net amount whatever the filter says.
    pub async fn get_transaction_stats(&self, filter: &TransactionFilter) -> ApiResult<TransactionStats> {
        let unlimited = TransactionFilter {
            limit: None,
            ..filter.clone()
        };
        let transactions = self.store().list_transactions(&unlimited).await?;
        let withdrawals = self.store().list_withdrawals().await?;

        Ok(transaction_stats(
            &transactions,
            total_withdrawals(&withdrawals, None),
        ))
    }

    // =========================================================================
    // Employees
    // =========================================================================

    /// Creates an active account. The role defaults to `employee`.
    pub async fn create_employee(&self, session: &Session, new: NewEmployee) -> ApiResult<Employee> {
        self.authorize(session, "create employee")?;

        let validated = validate_new_employee(&new)?;
        let employee = Employee {
            id: Self::new_id(),
            name: validated.name,
            username: validated.username,
            role: validated.role.unwrap_or(Role::Employee),
            status: EmployeeStatus::Active,
            created_at: self.now(),
        };
        self.store().insert_employee(&employee).await?;

        info!(name = %employee.name, role = %employee.role, "Employee created");
        Ok(employee)
    }

    /// Changes an employee's name, role or status.
    pub async fn update_employee(
        &self,
        session: &Session,
        id: &str,
        update: EmployeeUpdate,
    ) -> ApiResult<Employee> {
        self.authorize(session, "update employee")?;

        let mut employee = self
            .store()
            .get_employee(id)
            .await?
            .ok_or_else(|| ApiError::not_found("Employee", id))?;

        update.apply_to(&mut employee);
        validate_name("name", &employee.name)?;
        self.store().update_employee(&employee).await?;

        info!(id, status = ?employee.status, role = %employee.role, "Employee updated");
        Ok(employee)
    }

    pub async fn get_employees(&self, filter: &EmployeeFilter) -> ApiResult<Vec<Employee>> {
        Ok(self.store().list_employees(filter).await?)
    }

    // =========================================================================
    // Inventory
    // =========================================================================

    /// Current stock, by product name.
    pub async fn get_inventory(&self) -> ApiResult<Vec<InventoryItem>> {
        Ok(self.store().list_inventory().await?)
    }

    /// The stock change log, newest first.
    pub async fn get_inventory_changes(&self) -> ApiResult<Vec<InventoryChange>> {
        Ok(self.store().list_inventory_changes().await?)
    }
}
