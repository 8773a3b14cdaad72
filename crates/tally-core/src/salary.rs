//! # Salary Calculator
//!
//! Turns one employee's sales for one month into a salary.
//!
//! ## Formula
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  sales transactions collected by the employee in the month              │
//! │          │                                                              │
//! │          ▼                                                              │
//! │  total_sales_quantity = Σ quantity        (gift_quantity NEVER counted) │
//! │          │                                                              │
//! │          ├──► commission = floor(q × 0.7)   whole yuan                  │
//! │          │                                                              │
//! │          └──► bonus      = tier(q)                                      │
//! │                                                                         │
//! │  total_salary = 3000 + commission + bonus                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Bonus Tiers
//! ```text
//! ┌───────────────────┬──────────┐
//! │ units sold        │ bonus    │
//! ├───────────────────┼──────────┤
//! │      0 -  1,000   │      0   │
//! │  1,001 -  3,000   │    500   │
//! │  3,001 -  5,000   │  1,000   │
//! │  5,001 -  7,000   │  2,000   │
//! │  7,001 - 20,000   │  5,000   │
//! │ 20,001 +          │ 10,000   │
//! └───────────────────┴──────────┘
//! ```
//! A fractional quantity past a tier's upper bound (e.g. 1000.5) belongs to
//! the next tier, so every non-negative quantity maps to exactly one tier.
//!
//! A month with no sales is not an error: it yields the base salary alone.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use ts_rs::TS;

use crate::calendar::{BusinessCalendar, YearMonth};
use crate::money::Money;
use crate::quantity::Quantity;
use crate::types::{SalaryRecord, Transaction};

/// Fixed monthly base salary.
pub const BASE_SALARY: Money = Money::from_yuan(3000);

/// Commission per unit sold, as a fraction: 7/10 yuan.
const COMMISSION_NUMERATOR: i64 = 7;
const COMMISSION_DENOMINATOR: i64 = 10;

// =============================================================================
// Bonus Tiers
// =============================================================================

/// One row of the bonus table. Bounds are whole units, inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct BonusTier {
    pub min_units: i64,
    /// `None` for the open-ended top tier.
    pub max_units: Option<i64>,
    pub bonus: Money,
}

impl BonusTier {
    /// Human-readable range for the salary screen: `"1001 - 3000"` or `"> 20001"`.
    pub fn range_label(&self) -> String {
        match self.max_units {
            Some(max) => format!("{} - {}", self.min_units, max),
            None => format!("> {}", self.min_units),
        }
    }
}

/// The bonus table, ordered by quantity.
pub static BONUS_TIERS: [BonusTier; 6] = [
    BonusTier { min_units: 0, max_units: Some(1_000), bonus: Money::from_yuan(0) },
    BonusTier { min_units: 1_001, max_units: Some(3_000), bonus: Money::from_yuan(500) },
    BonusTier { min_units: 3_001, max_units: Some(5_000), bonus: Money::from_yuan(1_000) },
    BonusTier { min_units: 5_001, max_units: Some(7_000), bonus: Money::from_yuan(2_000) },
    BonusTier { min_units: 7_001, max_units: Some(20_000), bonus: Money::from_yuan(5_000) },
    BonusTier { min_units: 20_001, max_units: None, bonus: Money::from_yuan(10_000) },
];

/// The tier a quantity falls into.
pub fn bonus_tier_for(quantity: Quantity) -> &'static BonusTier {
    let top = &BONUS_TIERS[BONUS_TIERS.len() - 1];
    BONUS_TIERS
        .iter()
        .find(|tier| match tier.max_units {
            Some(max) => quantity <= Quantity::from_units(max),
            None => true,
        })
        .unwrap_or(top)
}

/// Tier bonus for a monthly sales quantity.
pub fn bonus_for(quantity: Quantity) -> Money {
    bonus_tier_for(quantity).bonus
}

/// `floor(quantity × 0.7)` in whole yuan, computed without floating point.
///
/// ```rust
/// use tally_core::quantity::Quantity;
/// use tally_core::salary::commission_for;
///
/// assert_eq!(commission_for(Quantity::from_units(5500)).yuan(), 3850);
/// ```
pub fn commission_for(quantity: Quantity) -> Money {
    Money::from_yuan(quantity.floor_units_times(COMMISSION_NUMERATOR, COMMISSION_DENOMINATOR))
}

// =============================================================================
// Employee Salary
// =============================================================================

/// A computed monthly salary. Derived on demand, never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct EmployeeSalary {
    pub employee_name: String,
    pub year: i32,
    pub month: u32,
    pub base_salary: Money,
    pub total_sales_quantity: Quantity,
    pub commission: Money,
    pub bonus: Money,
    pub total_salary: Money,
    /// Every transaction the employee collected that month, any type.
    pub transaction_count: i64,
}

impl EmployeeSalary {
    /// Copies the figures into a log entry.
    pub fn to_record(&self, id: String, created_at: chrono::DateTime<chrono::Utc>) -> SalaryRecord {
        SalaryRecord {
            id,
            employee_name: self.employee_name.clone(),
            year: self.year,
            month: self.month,
            base_salary: self.base_salary,
            total_sales_quantity: self.total_sales_quantity,
            commission: self.commission,
            bonus: self.bonus,
            total_salary: self.total_salary,
            transaction_count: self.transaction_count,
            created_at,
        }
    }
}

/// Computes one employee's salary for one month.
///
/// `transactions` may hold any span of records; only those collected by
/// `employee_name` inside the month count.
pub fn calculate_monthly_salary(
    employee_name: &str,
    month: YearMonth,
    transactions: &[Transaction],
    calendar: &BusinessCalendar,
) -> EmployeeSalary {
    let collected: Vec<&Transaction> = transactions
        .iter()
        .filter(|tx| tx.collector == employee_name && calendar.contains(month, tx.created_at))
        .collect();

    let total_sales_quantity: Quantity = collected
        .iter()
        .filter(|tx| tx.is_sale())
        .map(|tx| tx.quantity)
        .sum();

    let commission = commission_for(total_sales_quantity);
    let bonus = bonus_for(total_sales_quantity);

    EmployeeSalary {
        employee_name: employee_name.to_string(),
        year: month.year(),
        month: month.month(),
        base_salary: BASE_SALARY,
        total_sales_quantity,
        commission,
        bonus,
        total_salary: BASE_SALARY + commission + bonus,
        transaction_count: collected.len() as i64,
    }
}

/// Salaries for a set of employees, highest total first.
///
/// Duplicate names are computed once.
pub fn calculate_salaries<'a>(
    employee_names: impl IntoIterator<Item = &'a str>,
    month: YearMonth,
    transactions: &[Transaction],
    calendar: &BusinessCalendar,
) -> Vec<EmployeeSalary> {
    let names: BTreeSet<&str> = employee_names.into_iter().collect();
    let mut salaries: Vec<EmployeeSalary> = names
        .into_iter()
        .map(|name| calculate_monthly_salary(name, month, transactions, calendar))
        .collect();

    salaries.sort_by(|a, b| {
        b.total_salary
            .cmp(&a.total_salary)
            .then_with(|| a.employee_name.cmp(&b.employee_name))
    });
    salaries
}

// =============================================================================
// Unit Tests
// =============================================================================
