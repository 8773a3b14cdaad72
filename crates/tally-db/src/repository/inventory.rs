//! # Inventory Repository
//!
//! Stock per product and the change log behind it.
//!
//! Nothing writes to these tables directly. Stock only moves as a side
//! effect of a transaction write, inside that write's database transaction:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  BEGIN                                                                  │
//! │    INSERT INTO transactions ...                                         │
//! │    apply_movement(Rice, decrease 12)                                    │
//! │      ├── SELECT current_stock            (missing row = 0)             │
//! │      ├── UPSERT inventory                 50 → 38                       │
//! │      └── INSERT inventory_changes         old 50, new 38                │
//! │  COMMIT                                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use tally_core::inventory::StockMovement;
use tally_core::{InventoryChange, InventoryItem, Quantity};

/// Repository for inventory reads.
#[derive(Debug, Clone)]
pub struct InventoryRepository {
    pool: SqlitePool,
}

impl InventoryRepository {
    /// Creates a new InventoryRepository.
    pub fn new(pool: SqlitePool) -> Self {
        InventoryRepository { pool }
    }

    /// Lists stock for every product, by product name.
    pub async fn list(&self) -> DbResult<Vec<InventoryItem>> {
        let items = sqlx::query_as::<_, InventoryItem>(
            r#"
            SELECT product_name, current_stock, updated_at
            FROM inventory
            ORDER BY product_name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Lists the stock change log, newest first.
    pub async fn list_changes(&self) -> DbResult<Vec<InventoryChange>> {
        let changes = sqlx::query_as::<_, InventoryChange>(
            r#"
            SELECT
                id, product_name, change_type, quantity_change,
                old_stock, new_stock, transaction_id, created_at
            FROM inventory_changes
            ORDER BY julianday(created_at) DESC, rowid DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(changes)
    }
}

/// Applies one stock movement on an open connection and logs it.
///
/// Callers pass the connection of their own database transaction so the
/// stock change commits or rolls back together with the record write.
pub(crate) async fn apply_movement(
    conn: &mut SqliteConnection,
    movement: &StockMovement,
    transaction_id: Option<&str>,
    at: DateTime<Utc>,
) -> DbResult<InventoryChange> {
    let old_stock: Quantity =
        sqlx::query_scalar("SELECT current_stock FROM inventory WHERE product_name = ?1")
            .bind(&movement.product_name)
            .fetch_optional(&mut *conn)
            .await?
            .unwrap_or_default();

    let change = movement.to_change(
        Uuid::new_v4().to_string(),
        old_stock,
        transaction_id.map(str::to_string),
        at,
    );

    sqlx::query(
        r#"
        INSERT INTO inventory (product_name, current_stock, updated_at)
        VALUES (?1, ?2, ?3)
        ON CONFLICT(product_name) DO UPDATE SET
            current_stock = excluded.current_stock,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(&change.product_name)
    .bind(change.new_stock)
    .bind(at)
    .execute(&mut *conn)
    .await?;

    sqlx::query(
        r#"
        INSERT INTO inventory_changes (
            id, product_name, change_type, quantity_change,
            old_stock, new_stock, transaction_id, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        "#,
    )
    .bind(&change.id)
    .bind(&change.product_name)
    .bind(change.change_type)
    .bind(change.quantity_change)
    .bind(change.old_stock)
    .bind(change.new_stock)
    .bind(&change.transaction_id)
    .bind(change.created_at)
    .execute(&mut *conn)
    .await?;

    debug!(
        product = %change.product_name,
        old_stock = %change.old_stock,
        new_stock = %change.new_stock,
        "Stock updated"
    );

    Ok(change)
}
