//! # Payment Repository
//!
//! Money leaving a collector's hands: employee → merchant transfers and
//! merchant withdrawals from the business.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use tally_core::{Transfer, Withdrawal};

/// Repository for transfers and withdrawals.
#[derive(Debug, Clone)]
pub struct PaymentRepository {
    pool: SqlitePool,
}

impl PaymentRepository {
    /// Creates a new PaymentRepository.
    pub fn new(pool: SqlitePool) -> Self {
        PaymentRepository { pool }
    }

    // =========================================================================
    // Transfers
    // =========================================================================

    /// Lists every employee → merchant transfer, newest first.
    pub async fn list_transfers(&self) -> DbResult<Vec<Transfer>> {
        let transfers = sqlx::query_as::<_, Transfer>(
            r#"
            SELECT id, employee_name, amount, transfer_date, note, created_at
            FROM employee_transfers
            ORDER BY julianday(created_at) DESC, rowid DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(transfers)
    }

    pub async fn insert_transfer(&self, transfer: &Transfer) -> DbResult<()> {
        debug!(id = %transfer.id, employee = %transfer.employee_name, amount = %transfer.amount, "Inserting transfer");

        sqlx::query(
            r#"
            INSERT INTO employee_transfers (id, employee_name, amount, transfer_date, note, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&transfer.id)
        .bind(&transfer.employee_name)
        .bind(transfer.amount)
        .bind(transfer.transfer_date)
        .bind(&transfer.note)
        .bind(transfer.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    // =========================================================================
    // Withdrawals
    // =========================================================================

    /// Lists every merchant withdrawal, newest first.
    pub async fn list_withdrawals(&self) -> DbResult<Vec<Withdrawal>> {
        let withdrawals = sqlx::query_as::<_, Withdrawal>(
            r#"
            SELECT id, merchant_name, amount, withdrawal_date, note, created_at
            FROM merchant_withdrawals
            ORDER BY julianday(created_at) DESC, rowid DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(withdrawals)
    }

    pub async fn insert_withdrawal(&self, withdrawal: &Withdrawal) -> DbResult<()> {
        debug!(id = %withdrawal.id, merchant = %withdrawal.merchant_name, amount = %withdrawal.amount, "Inserting withdrawal");

        sqlx::query(
            r#"
            INSERT INTO merchant_withdrawals (id, merchant_name, amount, withdrawal_date, note, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&withdrawal.id)
        .bind(&withdrawal.merchant_name)
        .bind(withdrawal.amount)
        .bind(withdrawal.withdrawal_date)
        .bind(&withdrawal.note)
        .bind(withdrawal.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Deletes a withdrawal.
    ///
    /// ## Errors
    /// * `DbError::NotFound` - no withdrawal with this ID
    pub async fn delete_withdrawal(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting withdrawal");

        let result = sqlx::query("DELETE FROM merchant_withdrawals WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Withdrawal", id));
        }

        Ok(())
    }
}
