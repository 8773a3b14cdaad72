//! # Log Repository
//!
//! Append-only history tables written from engine results:
//! the gift log (`customer_gifts`) and the salary log (`salary_records`).

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use tally_core::{GiftRecord, SalaryRecord};

/// Repository for the gift and salary logs.
#[derive(Debug, Clone)]
pub struct LogRepository {
    pool: SqlitePool,
}

impl LogRepository {
    /// Creates a new LogRepository.
    pub fn new(pool: SqlitePool) -> Self {
        LogRepository { pool }
    }

    // =========================================================================
    // Gift log
    // =========================================================================

    /// Appends a batch of gift records. All or nothing.
    pub async fn append_gift_records(&self, records: &[GiftRecord]) -> DbResult<()> {
        if records.is_empty() {
            return Ok(());
        }

        debug!(count = records.len(), "Appending gift records");

        let mut db_tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        for record in records {
            sqlx::query(
                r#"
                INSERT INTO customer_gifts (
                    id, customer_name, daily_gift_quantity,
                    current_month_sales, last_month_sales,
                    current_month_amount, last_month_amount,
                    gift_source, gift_end_date, remaining_days, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
                "#,
            )
            .bind(&record.id)
            .bind(&record.customer_name)
            .bind(record.daily_gift_quantity)
            .bind(record.current_month_sales)
            .bind(record.last_month_sales)
            .bind(record.current_month_amount)
            .bind(record.last_month_amount)
            .bind(record.gift_source)
            .bind(record.gift_end_date)
            .bind(record.remaining_days)
            .bind(record.created_at)
            .execute(&mut *db_tx)
            .await?;
        }

        db_tx
            .commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        Ok(())
    }

    /// Lists the gift log, newest first.
    pub async fn list_gift_records(&self) -> DbResult<Vec<GiftRecord>> {
        let records = sqlx::query_as::<_, GiftRecord>(
            r#"
            SELECT
                id, customer_name, daily_gift_quantity,
                current_month_sales, last_month_sales,
                current_month_amount, last_month_amount,
                gift_source, gift_end_date, remaining_days, created_at
            FROM customer_gifts
            ORDER BY julianday(created_at) DESC, rowid DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    // =========================================================================
    // Salary log
    // =========================================================================

    pub async fn append_salary_record(&self, record: &SalaryRecord) -> DbResult<()> {
        debug!(
            employee = %record.employee_name,
            year = record.year,
            month = record.month,
            total = %record.total_salary,
            "Appending salary record"
        );

        sqlx::query(
            r#"
            INSERT INTO salary_records (
                id, employee_name, year, month, base_salary, total_sales_quantity,
                commission, bonus, total_salary, transaction_count, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
        )
        .bind(&record.id)
        .bind(&record.employee_name)
        .bind(record.year)
        .bind(record.month)
        .bind(record.base_salary)
        .bind(record.total_sales_quantity)
        .bind(record.commission)
        .bind(record.bonus)
        .bind(record.total_salary)
        .bind(record.transaction_count)
        .bind(record.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Lists the salary log, latest month first.
    pub async fn list_salary_records(&self) -> DbResult<Vec<SalaryRecord>> {
        let records = sqlx::query_as::<_, SalaryRecord>(
            r#"
            SELECT
                id, employee_name, year, month, base_salary, total_sales_quantity,
                commission, bonus, total_salary, transaction_count, created_at
            FROM salary_records
            ORDER BY year DESC, month DESC, julianday(created_at) DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }
}
