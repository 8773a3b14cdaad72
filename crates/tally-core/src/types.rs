//! # Domain Types
//!
//! The records the Record Store holds and the engines read.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Records                                  │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │  Transaction    │   │    Employee     │   │ CustomerBinding │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  type           │   │  name           │   │  customer_name  │       │
//! │  │  customer_name  │   │  username       │   │  employee_name  │       │
//! │  │  collector ─────┼──►│  role           │◄──┼─                │       │
//! │  │  quantity       │   │  status         │   └─────────────────┘       │
//! │  │  gift_quantity  │   └─────────────────┘                              │
//! │  │  total_amount   │                                                    │
//! │  └─────────────────┘                                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Transfer     │   │   Withdrawal    │   │   Deduction     │       │
//! │  │  employee →     │   │  merchant →     │   │  bonus pool →   │       │
//! │  │  merchant       │   │  cash out       │   │  payout         │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  Append-only logs: SalaryRecord, GiftRecord, InventoryChange            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Identity
//! Every record has a UUID v4 `id` assigned by the service layer before it is
//! written. People are referenced by **display name** (`collector`,
//! `employee_name`, `merchant_name`), which is how the shop records them.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::calendar::YearMonth;
use crate::error::ValidationError;
use crate::gift::GiftSource;
use crate::money::Money;
use crate::quantity::Quantity;
use crate::session::Role;

// =============================================================================
// Transaction Type
// =============================================================================

/// What kind of movement a transaction records.
///
/// ## Effect Table
/// ```text
/// ┌──────────┬──────────────────┬──────────────────────────────┐
/// │  type    │ net revenue      │ stock                        │
/// ├──────────┼──────────────────┼──────────────────────────────┤
/// │ purchase │ 0                │ + quantity                   │
/// │ sale     │ + total_amount   │ − (quantity + gift_quantity) │
/// │ return   │ − total_amount   │ + quantity                   │
/// │ gift     │ 0                │ − (quantity + gift_quantity) │
/// └──────────┴──────────────────┴──────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Purchase,
    Sale,
    Return,
    Gift,
}

impl TransactionType {
    pub const ALL: [TransactionType; 4] = [
        TransactionType::Purchase,
        TransactionType::Sale,
        TransactionType::Return,
        TransactionType::Gift,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Purchase => "purchase",
            TransactionType::Sale => "sale",
            TransactionType::Return => "return",
            TransactionType::Gift => "gift",
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TransactionType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ValidationError::NotAllowed {
                field: "type".to_string(),
                allowed: TransactionType::ALL.iter().map(|t| t.as_str().to_string()).collect(),
            })
    }
}

// =============================================================================
// Transaction
// =============================================================================

/// One logged movement of goods and/or money.
///
/// `quantity` on a sale excludes `gift_quantity`; the two are separate
/// fields on the same record and only `quantity` counts toward salary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Transaction {
    pub id: String,
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    pub customer_name: String,
    pub product_name: Option<String>,
    /// Employee or merchant who received the payment.
    pub collector: String,
    pub quantity: Quantity,
    pub gift_quantity: Quantity,
    pub unit_price: Money,
    pub total_amount: Money,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    /// Builds a record from validated input.
    pub fn from_new(id: String, new: NewTransaction, created_at: DateTime<Utc>) -> Self {
        Transaction {
            id,
            transaction_type: new.transaction_type,
            customer_name: new.customer_name.trim().to_string(),
            product_name: new
                .product_name
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty()),
            collector: new.collector.trim().to_string(),
            quantity: new.quantity,
            gift_quantity: new.gift_quantity,
            unit_price: new.unit_price,
            total_amount: new.total_amount,
            created_at,
        }
    }

    /// Contribution to net revenue: `+total` for a sale, `-total` for a
    /// return, zero otherwise.
    #[inline]
    pub fn net_revenue(&self) -> Money {
        match self.transaction_type {
            TransactionType::Sale => self.total_amount,
            TransactionType::Return => -self.total_amount,
            TransactionType::Purchase | TransactionType::Gift => Money::zero(),
        }
    }

    #[inline]
    pub fn is_sale(&self) -> bool {
        self.transaction_type == TransactionType::Sale
    }
}

/// Input for recording a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewTransaction {
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    pub customer_name: String,
    #[serde(default)]
    pub product_name: Option<String>,
    pub collector: String,
    pub quantity: Quantity,
    #[serde(default)]
    pub gift_quantity: Quantity,
    #[serde(default)]
    pub unit_price: Money,
    pub total_amount: Money,
}

/// Partial edit of a transaction. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TransactionUpdate {
    #[serde(default, rename = "type")]
    pub transaction_type: Option<TransactionType>,
    #[serde(default)]
    pub customer_name: Option<String>,
    /// `Some(None)` clears the product.
    #[serde(default)]
    pub product_name: Option<Option<String>>,
    #[serde(default)]
    pub collector: Option<String>,
    #[serde(default)]
    pub quantity: Option<Quantity>,
    #[serde(default)]
    pub gift_quantity: Option<Quantity>,
    #[serde(default)]
    pub unit_price: Option<Money>,
    #[serde(default)]
    pub total_amount: Option<Money>,
}

impl TransactionUpdate {
    pub fn is_empty(&self) -> bool {
        *self == TransactionUpdate::default()
    }

    /// Applies the edit in place. `id` and `created_at` never change.
    pub fn apply_to(&self, tx: &mut Transaction) {
        if let Some(t) = self.transaction_type {
            tx.transaction_type = t;
        }
        if let Some(name) = &self.customer_name {
            tx.customer_name = name.trim().to_string();
        }
        if let Some(product) = &self.product_name {
            tx.product_name = product
                .as_ref()
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty());
        }
        if let Some(collector) = &self.collector {
            tx.collector = collector.trim().to_string();
        }
        if let Some(q) = self.quantity {
            tx.quantity = q;
        }
        if let Some(q) = self.gift_quantity {
            tx.gift_quantity = q;
        }
        if let Some(p) = self.unit_price {
            tx.unit_price = p;
        }
        if let Some(a) = self.total_amount {
            tx.total_amount = a;
        }
    }
}

/// Query over the transaction log.
///
/// Results are always newest first. `customer_name` is a case-insensitive
/// substring match; `start`/`end` are inclusive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TransactionFilter {
    #[serde(default, rename = "type")]
    pub transaction_type: Option<TransactionType>,
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub collector: Option<String>,
    #[serde(default)]
    #[ts(as = "Option<String>")]
    pub start: Option<DateTime<Utc>>,
    #[serde(default)]
    #[ts(as = "Option<String>")]
    pub end: Option<DateTime<Utc>>,
    #[serde(default)]
    pub limit: Option<u32>,
}

impl TransactionFilter {
    /// Everything.
    pub fn all() -> Self {
        TransactionFilter::default()
    }

    pub fn of_type(transaction_type: TransactionType) -> Self {
        TransactionFilter {
            transaction_type: Some(transaction_type),
            ..Default::default()
        }
    }

    pub fn between(mut self, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        self.start = Some(start);
        self.end = Some(end);
        self
    }

    /// Whether a record passes every predicate except `limit`.
    pub fn matches(&self, tx: &Transaction) -> bool {
        if let Some(t) = self.transaction_type {
            if tx.transaction_type != t {
                return false;
            }
        }
        if let Some(needle) = self.customer_name.as_deref().map(str::trim) {
            if !needle.is_empty()
                && !tx
                    .customer_name
                    .to_lowercase()
                    .contains(&needle.to_lowercase())
            {
                return false;
            }
        }
        if let Some(collector) = &self.collector {
            if &tx.collector != collector {
                return false;
            }
        }
        if let Some(start) = self.start {
            if tx.created_at < start {
                return false;
            }
        }
        if let Some(end) = self.end {
            if tx.created_at > end {
                return false;
            }
        }
        true
    }
}

// =============================================================================
// Employee
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum EmployeeStatus {
    Active,
    Inactive,
}

impl Default for EmployeeStatus {
    fn default() -> Self {
        EmployeeStatus::Active
    }
}

/// A member of staff (including the merchant).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Employee {
    pub id: String,
    /// Display name; matches `Transaction.collector`.
    pub name: String,
    /// Login name, unique.
    pub username: String,
    pub role: Role,
    pub status: EmployeeStatus,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Employee {
    #[inline]
    pub fn is_active(&self) -> bool {
        self.status == EmployeeStatus::Active
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewEmployee {
    pub name: String,
    pub username: String,
    /// Defaults to `employee`.
    #[serde(default)]
    pub role: Option<Role>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct EmployeeUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default)]
    pub status: Option<EmployeeStatus>,
}

impl EmployeeUpdate {
    pub fn apply_to(&self, employee: &mut Employee) {
        if let Some(name) = &self.name {
            employee.name = name.trim().to_string();
        }
        if let Some(role) = self.role {
            employee.role = role;
        }
        if let Some(status) = self.status {
            employee.status = status;
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct EmployeeFilter {
    #[serde(default)]
    pub status: Option<EmployeeStatus>,
    #[serde(default)]
    pub role: Option<Role>,
}

impl EmployeeFilter {
    /// Active staff with the `employee` role: the people who earn salary.
    pub fn salaried() -> Self {
        EmployeeFilter {
            status: Some(EmployeeStatus::Active),
            role: Some(Role::Employee),
        }
    }

    pub fn matches(&self, employee: &Employee) -> bool {
        self.status.map_or(true, |s| employee.status == s)
            && self.role.map_or(true, |r| employee.role == r)
    }
}

// =============================================================================
// Customer Binding
// =============================================================================

/// Assigns a customer to the employee who looks after them. One per customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct CustomerBinding {
    pub id: String,
    pub customer_name: String,
    pub employee_name: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Transfers & Withdrawals
// =============================================================================

/// Money an employee has handed over to the merchant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Transfer {
    pub id: String,
    pub employee_name: String,
    pub amount: Money,
    #[ts(as = "String")]
    pub transfer_date: NaiveDate,
    pub note: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewTransfer {
    pub employee_name: String,
    pub amount: Money,
    /// Defaults to today in the business calendar.
    #[serde(default)]
    #[ts(as = "Option<String>")]
    pub transfer_date: Option<NaiveDate>,
    #[serde(default)]
    pub note: Option<String>,
}

/// Cash the merchant has taken out of the business.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Withdrawal {
    pub id: String,
    pub merchant_name: String,
    pub amount: Money,
    #[ts(as = "String")]
    pub withdrawal_date: NaiveDate,
    pub note: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewWithdrawal {
    #[serde(default)]
    pub amount: Money,
    /// Defaults to today in the business calendar.
    #[serde(default)]
    #[ts(as = "Option<String>")]
    pub withdrawal_date: Option<NaiveDate>,
    #[serde(default)]
    pub note: Option<String>,
}

// =============================================================================
// Bonus Pool Deduction
// =============================================================================

/// A payout from the bonus pool. Append-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Deduction {
    pub id: String,
    pub amount: Money,
    pub operator_id: String,
    pub operator_name: String,
    /// Pool balance right after this deduction.
    pub remaining_balance: Money,
    /// Business month the deduction was made in.
    pub year: i32,
    pub month: u32,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Deduction {
    pub fn year_month(&self) -> Result<YearMonth, ValidationError> {
        YearMonth::new(self.year, self.month)
    }
}

// =============================================================================
// Logs
// =============================================================================

/// A saved copy of a computed monthly salary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct SalaryRecord {
    pub id: String,
    pub employee_name: String,
    pub year: i32,
    pub month: u32,
    pub base_salary: Money,
    pub total_sales_quantity: Quantity,
    pub commission: Money,
    pub bonus: Money,
    pub total_salary: Money,
    pub transaction_count: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// A saved snapshot of one customer's gift eligibility.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct GiftRecord {
    pub id: String,
    pub customer_name: String,
    pub daily_gift_quantity: i64,
    pub current_month_sales: Quantity,
    pub last_month_sales: Quantity,
    pub current_month_amount: Money,
    pub last_month_amount: Money,
    pub gift_source: GiftSource,
    #[ts(as = "String")]
    pub gift_end_date: DateTime<Utc>,
    pub remaining_days: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Inventory
// =============================================================================

/// Direction of a stock movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum StockChange {
    Increase,
    Decrease,
}

/// Current stock of one product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct InventoryItem {
    pub product_name: String,
    pub current_stock: Quantity,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// One stock movement caused by a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct InventoryChange {
    pub id: String,
    pub product_name: String,
    pub change_type: StockChange,
    /// Always non-negative; `change_type` carries the direction.
    pub quantity_change: Quantity,
    pub old_stock: Quantity,
    pub new_stock: Quantity,
    pub transaction_id: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample(transaction_type: TransactionType, total_yuan: i64) -> Transaction {
        Transaction {
            id: "t1".to_string(),
            transaction_type,
            customer_name: "Li Si".to_string(),
            product_name: Some("Rice".to_string()),
            collector: "Zhang San".to_string(),
            quantity: Quantity::from_units(10),
            gift_quantity: Quantity::zero(),
            unit_price: Money::from_yuan(5),
            total_amount: Money::from_yuan(total_yuan),
            created_at: Utc.with_ymd_and_hms(2024, 6, 10, 2, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_net_revenue_by_type() {
        assert_eq!(sample(TransactionType::Sale, 50).net_revenue(), Money::from_yuan(50));
        assert_eq!(sample(TransactionType::Return, 50).net_revenue(), Money::from_yuan(-50));
        assert!(sample(TransactionType::Purchase, 50).net_revenue().is_zero());
        assert!(sample(TransactionType::Gift, 50).net_revenue().is_zero());
    }

    #[test]
    fn test_transaction_type_roundtrip_names() {
        assert_eq!("SALE".parse::<TransactionType>().unwrap(), TransactionType::Sale);
        assert!("refund".parse::<TransactionType>().is_err());
        let json = serde_json::to_string(&sample(TransactionType::Gift, 0)).unwrap();
        assert!(json.contains("\"type\":\"gift\""));
    }

    #[test]
    fn test_filter_customer_substring_is_case_insensitive() {
        let tx = sample(TransactionType::Sale, 50);
        let filter = TransactionFilter {
            customer_name: Some("li s".to_string()),
            ..Default::default()
        };
        assert!(filter.matches(&tx));

        let filter = TransactionFilter {
            customer_name: Some("wang".to_string()),
            ..Default::default()
        };
        assert!(!filter.matches(&tx));
    }

    #[test]
    fn test_filter_date_range_is_inclusive() {
        let tx = sample(TransactionType::Sale, 50);
        let at = tx.created_at;
        assert!(TransactionFilter::all().between(at, at).matches(&tx));
        assert!(!TransactionFilter::all()
            .between(at + chrono::Duration::seconds(1), at + chrono::Duration::days(1))
            .matches(&tx));
        assert!(!TransactionFilter::of_type(TransactionType::Return).matches(&tx));
    }

    #[test]
    fn test_update_applies_only_set_fields() {
        let mut tx = sample(TransactionType::Sale, 50);
        let update = TransactionUpdate {
            total_amount: Some(Money::from_yuan(60)),
            product_name: Some(None),
            ..Default::default()
        };
        update.apply_to(&mut tx);

        assert_eq!(tx.total_amount, Money::from_yuan(60));
        assert_eq!(tx.product_name, None);
        assert_eq!(tx.customer_name, "Li Si");
        assert!(TransactionUpdate::default().is_empty());
    }

    #[test]
    fn test_from_new_drops_blank_product() {
        let new = NewTransaction {
            transaction_type: TransactionType::Purchase,
            customer_name: " Supplier ".to_string(),
            product_name: Some("  ".to_string()),
            collector: "Boss".to_string(),
            quantity: Quantity::from_units(100),
            gift_quantity: Quantity::zero(),
            unit_price: Money::from_yuan(2),
            total_amount: Money::from_yuan(200),
        };
        let tx = Transaction::from_new("t9".to_string(), new, Utc::now());
        assert_eq!(tx.customer_name, "Supplier");
        assert_eq!(tx.product_name, None);
    }

    #[test]
    fn test_employee_filter() {
        let emp = Employee {
            id: "e1".to_string(),
            name: "Zhang San".to_string(),
            username: "zhangsan".to_string(),
            role: Role::Employee,
            status: EmployeeStatus::Active,
            created_at: Utc::now(),
        };
        assert!(EmployeeFilter::salaried().matches(&emp));
        assert!(EmployeeFilter::default().matches(&emp));

        let boss = Employee {
            role: Role::Merchant,
            ..emp.clone()
        };
        assert!(!EmployeeFilter::salaried().matches(&boss));
    }
}
