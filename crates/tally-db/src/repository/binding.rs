//! # Customer Binding Repository
//!
//! Which employee looks after which customer. One binding per customer:
//! binding again replaces the previous assignment.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use tally_core::CustomerBinding;

/// Repository for customer binding operations.
#[derive(Debug, Clone)]
pub struct BindingRepository {
    pool: SqlitePool,
}

impl BindingRepository {
    /// Creates a new BindingRepository.
    pub fn new(pool: SqlitePool) -> Self {
        BindingRepository { pool }
    }

    /// Lists all bindings, newest first.
    pub async fn list(&self) -> DbResult<Vec<CustomerBinding>> {
        let bindings = sqlx::query_as::<_, CustomerBinding>(
            r#"
            SELECT id, customer_name, employee_name, created_at
            FROM customer_bindings
            ORDER BY julianday(created_at) DESC, rowid DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(bindings)
    }

    /// Stores a binding, replacing any existing binding for the same customer.
    pub async fn upsert(&self, binding: &CustomerBinding) -> DbResult<()> {
        debug!(customer = %binding.customer_name, employee = %binding.employee_name, "Binding customer");

        let mut db_tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        sqlx::query("DELETE FROM customer_bindings WHERE customer_name = ?1")
            .bind(&binding.customer_name)
            .execute(&mut *db_tx)
            .await?;

        sqlx::query(
            r#"
            INSERT INTO customer_bindings (id, customer_name, employee_name, created_at)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(&binding.id)
        .bind(&binding.customer_name)
        .bind(&binding.employee_name)
        .bind(binding.created_at)
        .execute(&mut *db_tx)
        .await?;

        db_tx
            .commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        Ok(())
    }

    /// Removes the binding for a customer.
    ///
    /// ## Returns
    /// `true` if a binding existed.
    pub async fn delete(&self, customer_name: &str) -> DbResult<bool> {
        debug!(customer = %customer_name, "Unbinding customer");

        let result = sqlx::query("DELETE FROM customer_bindings WHERE customer_name = ?1")
            .bind(customer_name)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
