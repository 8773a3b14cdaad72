//! # Employee Repository
//!
//! Database operations for staff records.
//!
//! Usernames are unique. Employees are never deleted; they are switched
//! to `inactive` so their historical transactions keep a known collector.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use tally_core::{Employee, EmployeeFilter};

/// Repository for employee database operations.
#[derive(Debug, Clone)]
pub struct EmployeeRepository {
    pool: SqlitePool,
}

impl EmployeeRepository {
    /// Creates a new EmployeeRepository.
    pub fn new(pool: SqlitePool) -> Self {
        EmployeeRepository { pool }
    }

    /// Lists employees matching a status/role filter, newest first.
    pub async fn list(&self, filter: &EmployeeFilter) -> DbResult<Vec<Employee>> {
        let employees = sqlx::query_as::<_, Employee>(
            r#"
            SELECT id, name, username, role, status, created_at
            FROM employees
            WHERE (?1 IS NULL OR status = ?1)
              AND (?2 IS NULL OR role = ?2)
            ORDER BY julianday(created_at) DESC, rowid DESC
            "#,
        )
        .bind(filter.status)
        .bind(filter.role)
        .fetch_all(&self.pool)
        .await?;

        Ok(employees)
    }

    /// Gets an employee by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Employee>> {
        let employee = sqlx::query_as::<_, Employee>(
            r#"
            SELECT id, name, username, role, status, created_at
            FROM employees
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(employee)
    }

    /// Inserts an employee.
    ///
    /// ## Errors
    /// * `DbError::UniqueViolation` - the username is taken
    pub async fn insert(&self, employee: &Employee) -> DbResult<()> {
        debug!(id = %employee.id, username = %employee.username, role = %employee.role, "Inserting employee");

        sqlx::query(
            r#"
            INSERT INTO employees (id, name, username, role, status, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&employee.id)
        .bind(&employee.name)
        .bind(&employee.username)
        .bind(employee.role)
        .bind(employee.status)
        .bind(employee.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { .. } => DbError::duplicate("username", &employee.username),
            other => other,
        })?;

        Ok(())
    }

    /// Updates name, role and status. Username and creation time are fixed.
    ///
    /// ## Errors
    /// * `DbError::NotFound` - no employee with `employee.id`
    pub async fn update(&self, employee: &Employee) -> DbResult<()> {
        debug!(id = %employee.id, status = ?employee.status, "Updating employee");

        let result = sqlx::query(
            r#"
            UPDATE employees SET name = ?2, role = ?3, status = ?4
            WHERE id = ?1
            "#,
        )
        .bind(&employee.id)
        .bind(&employee.name)
        .bind(employee.role)
        .bind(employee.status)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Employee", &employee.id));
        }

        Ok(())
    }
}
