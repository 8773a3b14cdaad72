//! # Transaction Repository
//!
//! Database operations for the transaction log.
//!
//! ## Write Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Transaction Writes + Stock                           │
//! │                                                                         │
//! │  insert(tx)                                                             │
//! │     └── INSERT row, apply movement(tx)                                  │
//! │                                                                         │
//! │  update(tx')                                                            │
//! │     └── load old row                                                    │
//! │     └── apply reversed movement(old)                                    │
//! │     └── UPDATE row, apply movement(tx')                                 │
//! │                                                                         │
//! │  delete(id)                                                             │
//! │     └── load old row, apply reversed movement(old), DELETE row          │
//! │                                                                         │
//! │  Every step of one call runs in ONE database transaction.               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::inventory::apply_movement;
use tally_core::inventory::stock_movement;
use tally_core::{Transaction, TransactionFilter};

/// Repository for transaction database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = TransactionRepository::new(pool);
///
/// // Last 20 sales
/// let filter = TransactionFilter { limit: Some(20), ..TransactionFilter::of_type(TransactionType::Sale) };
/// let sales = repo.list(&filter).await?;
/// ```
#[derive(Debug, Clone)]
pub struct TransactionRepository {
    pool: SqlitePool,
}

impl TransactionRepository {
    /// Creates a new TransactionRepository.
    pub fn new(pool: SqlitePool) -> Self {
        TransactionRepository { pool }
    }

    /// Lists transactions matching a filter, newest first.
    ///
    /// ## Filter Semantics
    /// - `customer_name` is a case-insensitive substring match
    /// - `start` / `end` are inclusive instants
    /// - No `limit` means no limit (`LIMIT -1` in SQLite)
    pub async fn list(&self, filter: &TransactionFilter) -> DbResult<Vec<Transaction>> {
        let customer = filter
            .customer_name
            .as_deref()
            .map(str::trim)
            .filter(|needle| !needle.is_empty());
        let limit = filter.limit.map(i64::from).unwrap_or(-1);

        debug!(?filter, "Listing transactions");

        let transactions = sqlx::query_as::<_, Transaction>(
            r#"
            SELECT
                id, transaction_type, customer_name, product_name, collector,
                quantity, gift_quantity, unit_price, total_amount, created_at
            FROM transactions
            WHERE (?1 IS NULL OR transaction_type = ?1)
              AND (?2 IS NULL OR instr(lower(customer_name), lower(?2)) > 0)
              AND (?3 IS NULL OR collector = ?3)
              AND (?4 IS NULL OR julianday(created_at) >= julianday(?4))
              AND (?5 IS NULL OR julianday(created_at) <= julianday(?5))
            ORDER BY julianday(created_at) DESC, rowid DESC
            LIMIT ?6
            "#,
        )
        .bind(filter.transaction_type)
        .bind(customer)
        .bind(filter.collector.as_deref())
        .bind(filter.start)
        .bind(filter.end)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        debug!(count = transactions.len(), "Listed transactions");
        Ok(transactions)
    }

    /// Gets a transaction by ID.
    ///
    /// ## Returns
    /// * `Ok(Some(Transaction))` - Transaction found
    /// * `Ok(None)` - Transaction not found
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Transaction>> {
        let mut conn = self.pool.acquire().await?;
        fetch_one_by_id(&mut conn, id).await
    }

    /// Inserts a transaction and applies its stock movement.
    pub async fn insert(&self, tx: &Transaction) -> DbResult<()> {
        debug!(id = %tx.id, kind = %tx.transaction_type, total = %tx.total_amount, "Inserting transaction");

        let mut db_tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO transactions (
                id, transaction_type, customer_name, product_name, collector,
                quantity, gift_quantity, unit_price, total_amount, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&tx.id)
        .bind(tx.transaction_type)
        .bind(&tx.customer_name)
        .bind(&tx.product_name)
        .bind(&tx.collector)
        .bind(tx.quantity)
        .bind(tx.gift_quantity)
        .bind(tx.unit_price)
        .bind(tx.total_amount)
        .bind(tx.created_at)
        .execute(&mut *db_tx)
        .await?;

        if let Some(movement) = stock_movement(tx) {
            apply_movement(&mut db_tx, &movement, Some(&tx.id), Utc::now()).await?;
        }

        db_tx
            .commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        Ok(())
    }

    /// Replaces a stored transaction, moving stock from the old values to the new.
    ///
    /// ## Errors
    /// * `DbError::NotFound` - no transaction with `tx.id`
    pub async fn update(&self, tx: &Transaction) -> DbResult<()> {
        debug!(id = %tx.id, "Updating transaction");

        let mut db_tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let old = fetch_one_by_id(&mut db_tx, &tx.id)
            .await?
            .ok_or_else(|| DbError::not_found("Transaction", &tx.id))?;

        let now = Utc::now();
        if let Some(movement) = stock_movement(&old) {
            apply_movement(&mut db_tx, &movement.reversed(), Some(&old.id), now).await?;
        }

        sqlx::query(
            r#"
            UPDATE transactions SET
                transaction_type = ?2,
                customer_name = ?3,
                product_name = ?4,
                collector = ?5,
                quantity = ?6,
                gift_quantity = ?7,
                unit_price = ?8,
                total_amount = ?9
            WHERE id = ?1
            "#,
        )
        .bind(&tx.id)
        .bind(tx.transaction_type)
        .bind(&tx.customer_name)
        .bind(&tx.product_name)
        .bind(&tx.collector)
        .bind(tx.quantity)
        .bind(tx.gift_quantity)
        .bind(tx.unit_price)
        .bind(tx.total_amount)
        .execute(&mut *db_tx)
        .await?;

        if let Some(movement) = stock_movement(tx) {
            apply_movement(&mut db_tx, &movement, Some(&tx.id), now).await?;
        }

        db_tx
            .commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        Ok(())
    }

    /// Deletes a transaction and gives its stock back.
    ///
    /// ## Returns
    /// The deleted transaction.
    ///
    /// ## Errors
    /// * `DbError::NotFound` - no transaction with this ID
    pub async fn delete(&self, id: &str) -> DbResult<Transaction> {
        debug!(id = %id, "Deleting transaction");

        let mut db_tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let old = fetch_one_by_id(&mut db_tx, id)
            .await?
            .ok_or_else(|| DbError::not_found("Transaction", id))?;

        if let Some(movement) = stock_movement(&old) {
            apply_movement(&mut db_tx, &movement.reversed(), Some(&old.id), Utc::now()).await?;
        }

        sqlx::query("DELETE FROM transactions WHERE id = ?1")
            .bind(id)
            .execute(&mut *db_tx)
            .await?;

        db_tx
            .commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        Ok(old)
    }
}

async fn fetch_one_by_id(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Transaction>> {
    let tx = sqlx::query_as::<_, Transaction>(
        r#"
        SELECT
            id, transaction_type, customer_name, product_name, collector,
            quantity, gift_quantity, unit_price, total_amount, created_at
        FROM transactions
        WHERE id = ?1
        "#,
    )
    .bind(id)
    .fetch_optional(conn)
    .await?;

    Ok(tx)
}
