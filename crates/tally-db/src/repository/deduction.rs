//! # Bonus Deduction Repository
//!
//! The deduction log is append-only. Appends are conditional so two
//! operators cannot both spend the same balance:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Operator A                        Operator B                           │
//! │  ──────────                        ──────────                           │
//! │  read 2 deductions, balance 500    read 2 deductions, balance 500       │
//! │  append if count = 2  ✓            │                                    │
//! │                                    append if count = 2  ✗ Conflict      │
//! │                                    re-read 3 deductions, balance 200    │
//! │                                    re-check, append if count = 3        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The count check and the insert are one SQL statement, so SQLite runs
//! them atomically.

use sqlx::SqlitePool;
use tracing::{debug, warn};

use crate::error::{DbError, DbResult};
use tally_core::{Deduction, YearMonth};

/// Repository for the bonus deduction log.
#[derive(Debug, Clone)]
pub struct DeductionRepository {
    pool: SqlitePool,
}

impl DeductionRepository {
    /// Creates a new DeductionRepository.
    pub fn new(pool: SqlitePool) -> Self {
        DeductionRepository { pool }
    }

    /// Lists deductions newest first, optionally only those booked in one month.
    pub async fn list(&self, month: Option<YearMonth>) -> DbResult<Vec<Deduction>> {
        let deductions = sqlx::query_as::<_, Deduction>(
            r#"
            SELECT id, amount, operator_id, operator_name, remaining_balance, year, month, created_at
            FROM bonus_deductions
            WHERE (?1 IS NULL OR (year = ?1 AND month = ?2))
            ORDER BY julianday(created_at) DESC, rowid DESC
            "#,
        )
        .bind(month.map(|m| m.year()))
        .bind(month.map(|m| m.month()))
        .fetch_all(&self.pool)
        .await?;

        Ok(deductions)
    }

    /// Appends a deduction only if the log still holds `expected_count` rows.
    ///
    /// ## Errors
    /// * `DbError::Conflict` - another deduction landed since the balance was read
    pub async fn append_if_unchanged(&self, deduction: &Deduction, expected_count: i64) -> DbResult<()> {
        debug!(
            id = %deduction.id,
            amount = %deduction.amount,
            expected_count,
            "Appending bonus deduction"
        );

        let result = sqlx::query(
            r#"
            INSERT INTO bonus_deductions (
                id, amount, operator_id, operator_name, remaining_balance, year, month, created_at
            )
            SELECT ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8
            WHERE (SELECT COUNT(*) FROM bonus_deductions) = ?9
            "#,
        )
        .bind(&deduction.id)
        .bind(deduction.amount)
        .bind(&deduction.operator_id)
        .bind(&deduction.operator_name)
        .bind(deduction.remaining_balance)
        .bind(deduction.year)
        .bind(deduction.month)
        .bind(deduction.created_at)
        .bind(expected_count)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            warn!(id = %deduction.id, expected_count, "Deduction log changed concurrently");
            return Err(DbError::conflict("bonus_deductions", expected_count));
        }

        Ok(())
    }
}
