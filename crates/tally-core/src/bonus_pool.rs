//! # Bonus Pool Accrual
//!
//! The company-wide profit-sharing pool: 1% of every month's net profit,
//! accumulated over all history, reduced only by explicit deductions.
//!
//! ## Accrual Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ALL transactions                                                       │
//! │        │ partition by business month                                    │
//! │        ▼                                                                │
//! │  ┌──────────┐ ┌──────────┐ ┌──────────┐                                 │
//! │  │ 2024-04  │ │ 2024-05  │ │ 2024-06  │   one MonthlyProfit each        │
//! │  └────┬─────┘ └────┬─────┘ └────┬─────┘                                 │
//! │       │            │            │                                       │
//! │  net_profit = sales − returns − salaries − 30000                        │
//! │  bonus_pool = net_profit × 1%   (rounded to the cent)                   │
//! │       │            │            │                                       │
//! │       └────────────┴─────┬──────┘                                       │
//! │                          ▼                                              │
//! │             cumulative_bonus_pool = Σ bonus_pool                        │
//! │             current_balance = cumulative − Σ ALL deductions             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Everything is recomputed from the full record set on every call. There is
//! no stored running total to drift out of sync.
//!
//! A losing month contributes a negative accrual, so the cumulative pool can
//! shrink as well as grow.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use ts_rs::TS;

use crate::calendar::{BusinessCalendar, YearMonth};
use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::salary::calculate_salaries;
use crate::session::Session;
use crate::types::{Deduction, Employee, EmployeeFilter, Transaction, TransactionType};
use crate::validation::validate_positive_amount;

/// Monthly fixed cost subtracted before the pool share.
pub const FIXED_COST: Money = Money::from_yuan(30_000);

/// Pool share of net profit, in basis points (100 = 1%).
pub const BONUS_POOL_RATE_BPS: u32 = 100;

// =============================================================================
// Monthly Profit
// =============================================================================

/// Net profit and pool accrual for one month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct MonthlyProfit {
    pub year: i32,
    pub month: u32,
    pub sales_amount: Money,
    pub return_amount: Money,
    pub total_salary: Money,
    pub fixed_cost: Money,
    pub net_profit: Money,
    /// This month's accrual.
    pub bonus_pool: Money,
}

/// Computes one month's profit from the transactions that fall in it.
///
/// `total_salary` covers active `employee`-role staff who collected at least
/// one transaction in the month. The merchant draws no salary.
pub fn monthly_profit(
    month: YearMonth,
    transactions: &[Transaction],
    employees: &[Employee],
    calendar: &BusinessCalendar,
) -> MonthlyProfit {
    let in_month: Vec<Transaction> = transactions
        .iter()
        .filter(|tx| calendar.contains(month, tx.created_at))
        .cloned()
        .collect();

    profit_for_month_records(month, &in_month, employees, calendar)
}

/// Same as [`monthly_profit`] but `in_month` is already restricted to the month.
fn profit_for_month_records(
    month: YearMonth,
    in_month: &[Transaction],
    employees: &[Employee],
    calendar: &BusinessCalendar,
) -> MonthlyProfit {
    let sum_of = |kind: TransactionType| -> Money {
        in_month
            .iter()
            .filter(|tx| tx.transaction_type == kind)
            .map(|tx| tx.total_amount)
            .sum()
    };
    let sales_amount = sum_of(TransactionType::Sale);
    let return_amount = sum_of(TransactionType::Return);

    let salaried = EmployeeFilter::salaried();
    let names = employees
        .iter()
        .filter(|e| salaried.matches(e))
        .map(|e| e.name.as_str());
    let total_salary: Money = calculate_salaries(names, month, in_month, calendar)
        .iter()
        .filter(|s| s.transaction_count > 0)
        .map(|s| s.total_salary)
        .sum();

    let net_profit = sales_amount - return_amount - total_salary - FIXED_COST;

    MonthlyProfit {
        year: month.year(),
        month: month.month(),
        sales_amount,
        return_amount,
        total_salary,
        fixed_cost: FIXED_COST,
        net_profit,
        bonus_pool: net_profit.apply_bps(BONUS_POOL_RATE_BPS),
    }
}

/// Every month that has at least one transaction, oldest first.
pub fn monthly_history(
    transactions: &[Transaction],
    employees: &[Employee],
    calendar: &BusinessCalendar,
) -> Vec<MonthlyProfit> {
    let mut by_month: BTreeMap<YearMonth, Vec<Transaction>> = BTreeMap::new();
    for tx in transactions {
        by_month
            .entry(calendar.month_of(tx.created_at))
            .or_default()
            .push(tx.clone());
    }

    by_month
        .iter()
        .map(|(month, records)| profit_for_month_records(*month, records, employees, calendar))
        .collect()
}

/// Σ of every month's rounded accrual.
pub fn cumulative_bonus_pool(
    transactions: &[Transaction],
    employees: &[Employee],
    calendar: &BusinessCalendar,
) -> Money {
    monthly_history(transactions, employees, calendar)
        .iter()
        .map(|m| m.bonus_pool)
        .sum()
}

/// Σ of every deduction ever made, regardless of month.
pub fn total_deductions(deductions: &[Deduction]) -> Money {
    deductions.iter().map(|d| d.amount).sum()
}

// =============================================================================
// Snapshot
// =============================================================================

/// The bonus pool screen: one month's figures plus the all-time balance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct BonusPoolSnapshot {
    pub year: i32,
    pub month: u32,
    pub sales_amount: Money,
    pub return_amount: Money,
    pub total_salary: Money,
    pub fixed_cost: Money,
    pub net_profit: Money,
    /// The requested month's accrual.
    pub bonus_pool: Money,
    pub cumulative_bonus_pool: Money,
    pub total_deductions: Money,
    pub current_balance: Money,
}

/// Builds the snapshot for `month` from the full history.
pub fn calculate_bonus_pool(
    month: YearMonth,
    transactions: &[Transaction],
    employees: &[Employee],
    deductions: &[Deduction],
    calendar: &BusinessCalendar,
) -> BonusPoolSnapshot {
    let history = monthly_history(transactions, employees, calendar);

    let requested = history
        .iter()
        .find(|m| m.year == month.year() && m.month == month.month())
        .cloned()
        .unwrap_or_else(|| profit_for_month_records(month, &[], employees, calendar));

    let cumulative_bonus_pool: Money = history.iter().map(|m| m.bonus_pool).sum();
    let total_deductions = total_deductions(deductions);

    BonusPoolSnapshot {
        year: requested.year,
        month: requested.month,
        sales_amount: requested.sales_amount,
        return_amount: requested.return_amount,
        total_salary: requested.total_salary,
        fixed_cost: requested.fixed_cost,
        net_profit: requested.net_profit,
        bonus_pool: requested.bonus_pool,
        cumulative_bonus_pool,
        total_deductions,
        current_balance: cumulative_bonus_pool - total_deductions,
    }
}

// =============================================================================
// Deduction
// =============================================================================

/// Checks a deduction request against the balance read at call time.
///
/// ## Rules
/// - `amount` must be positive
/// - `amount` must not exceed `current_balance`
///
/// ## Returns
/// The balance left after the deduction.
pub fn check_deduction(amount: Money, current_balance: Money) -> CoreResult<Money> {
    validate_positive_amount("amount", amount)?;

    if amount > current_balance {
        return Err(CoreError::InsufficientBonusBalance {
            requested: amount,
            available: current_balance,
        });
    }

    Ok(current_balance - amount)
}

/// Validates a deduction and builds the log entry to append.
///
/// The entry is stamped with the business month of `now`.
pub fn prepare_deduction(
    id: String,
    amount: Money,
    operator: &Session,
    current_balance: Money,
    now: DateTime<Utc>,
    calendar: &BusinessCalendar,
) -> CoreResult<Deduction> {
    let remaining_balance = check_deduction(amount, current_balance)?;
    let month = calendar.current_month(now);

    Ok(Deduction {
        id,
        amount,
        operator_id: operator.user_id.clone(),
        operator_name: operator.name.clone(),
        remaining_balance,
        year: month.year(),
        month: month.month(),
        created_at: now,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quantity::Quantity;
    use crate::session::Role;
    use crate::types::EmployeeStatus;
    use chrono::TimeZone;

    fn cal() -> BusinessCalendar {
        BusinessCalendar::from_utc_offset_hours(0).unwrap()
    }

    fn employee(name: &str, role: Role) -> Employee {
        Employee {
            id: format!("id-{name}"),
            name: name.to_string(),
            username: name.to_lowercase().replace(' ', "."),
            role,
            status: EmployeeStatus::Active,
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    fn tx(kind: TransactionType, collector: &str, units: i64, amount_yuan: i64, y: i32, m: u32, d: u32) -> Transaction {
        Transaction {
            id: format!("{kind}-{collector}-{y}-{m}-{d}-{amount_yuan}"),
            transaction_type: kind,
            customer_name: "Li Si".to_string(),
            product_name: None,
            collector: collector.to_string(),
            quantity: Quantity::from_units(units),
            gift_quantity: Quantity::zero(),
            unit_price: Money::zero(),
            total_amount: Money::from_yuan(amount_yuan),
            created_at: Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap(),
        }
    }

    fn deduction(amount_yuan: i64) -> Deduction {
        Deduction {
            id: format!("d-{amount_yuan}"),
            amount: Money::from_yuan(amount_yuan),
            operator_id: "u1".to_string(),
            operator_name: "Boss".to_string(),
            remaining_balance: Money::zero(),
            year: 2024,
            month: 6,
            created_at: Utc.with_ymd_and_hms(2024, 6, 20, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_month_net_profit_and_accrual() {
        let employees = vec![employee("A", Role::Employee), employee("Boss", Role::Merchant)];
        let txs = vec![
            tx(TransactionType::Sale, "A", 5500, 60_000, 2024, 6, 3),
            tx(TransactionType::Sale, "Boss", 0, 40_000, 2024, 6, 4),
            tx(TransactionType::Return, "Boss", 0, 10_000, 2024, 6, 5),
            tx(TransactionType::Purchase, "Boss", 1000, 25_000, 2024, 6, 5),
            tx(TransactionType::Sale, "A", 100, 9_999, 2024, 7, 1),
        ];
        let june = YearMonth::new(2024, 6).unwrap();
        let profit = monthly_profit(june, &txs, &employees, &cal());

        assert_eq!(profit.sales_amount, Money::from_yuan(100_000));
        assert_eq!(profit.return_amount, Money::from_yuan(10_000));
        // only A is salaried: 3000 + 3850 + 2000
        assert_eq!(profit.total_salary, Money::from_yuan(8_850));
        // 100000 - 10000 - 8850 - 30000
        assert_eq!(profit.net_profit, Money::from_yuan(51_150));
        assert_eq!(profit.bonus_pool, Money::from_major_minor(511, 50));
    }

    #[test]
    fn test_pool_from_known_figures() {
        // salesAmount=100000, returnAmount=10000, totalSalary=20000 → net 40000, pool 400
        let net = Money::from_yuan(100_000) - Money::from_yuan(10_000) - Money::from_yuan(20_000) - FIXED_COST;
        assert_eq!(net, Money::from_yuan(40_000));
        assert_eq!(net.apply_bps(BONUS_POOL_RATE_BPS), Money::from_yuan(400));
    }

    #[test]
    fn test_idle_salaried_employee_is_not_counted() {
        let employees = vec![employee("A", Role::Employee), employee("Idle", Role::Employee)];
        let txs = vec![tx(TransactionType::Sale, "A", 10, 50_000, 2024, 6, 3)];
        let profit = monthly_profit(YearMonth::new(2024, 6).unwrap(), &txs, &employees, &cal());
        // A: 3000 + 7 + 0
        assert_eq!(profit.total_salary, Money::from_yuan(3_007));
    }

    #[test]
    fn test_inactive_employee_draws_no_salary() {
        let mut gone = employee("A", Role::Employee);
        gone.status = EmployeeStatus::Inactive;
        let txs = vec![tx(TransactionType::Sale, "A", 10, 50_000, 2024, 6, 3)];
        let profit = monthly_profit(YearMonth::new(2024, 6).unwrap(), &txs, &[gone], &cal());
        assert!(profit.total_salary.is_zero());
    }

    #[test]
    fn test_cumulative_sums_every_month_including_losses() {
        let employees = vec![employee("Boss", Role::Merchant)];
        let txs = vec![
            tx(TransactionType::Sale, "Boss", 0, 70_000, 2024, 4, 10), // +40000 → +400
            tx(TransactionType::Sale, "Boss", 0, 10_000, 2024, 5, 10), // −20000 → −200
            tx(TransactionType::Sale, "Boss", 0, 80_000, 2024, 6, 10), // +50000 → +500
        ];
        let history = monthly_history(&txs, &employees, &cal());
        assert_eq!(history.len(), 3);
        assert_eq!(history[0].month, 4);
        assert_eq!(history[1].bonus_pool, Money::from_yuan(-200));

        assert_eq!(cumulative_bonus_pool(&txs, &employees, &cal()), Money::from_yuan(700));
    }

    #[test]
    fn test_snapshot_balance_uses_all_deductions() {
        let employees = vec![employee("Boss", Role::Merchant)];
        let txs = vec![
            tx(TransactionType::Sale, "Boss", 0, 70_000, 2024, 4, 10),
            tx(TransactionType::Sale, "Boss", 0, 80_000, 2024, 6, 10),
        ];
        let deductions = vec![deduction(100), deduction(50)];
        let snap = calculate_bonus_pool(
            YearMonth::new(2024, 4).unwrap(),
            &txs,
            &employees,
            &deductions,
            &cal(),
        );

        assert_eq!(snap.bonus_pool, Money::from_yuan(400));
        assert_eq!(snap.cumulative_bonus_pool, Money::from_yuan(900));
        assert_eq!(snap.total_deductions, Money::from_yuan(150));
        assert_eq!(snap.current_balance, Money::from_yuan(750));
    }

    #[test]
    fn test_snapshot_for_empty_month() {
        let snap = calculate_bonus_pool(YearMonth::new(2023, 1).unwrap(), &[], &[], &[], &cal());
        assert!(snap.sales_amount.is_zero());
        assert_eq!(snap.net_profit, -FIXED_COST);
        assert_eq!(snap.bonus_pool, Money::from_yuan(-300));
        // months without transactions never accrue
        assert!(snap.cumulative_bonus_pool.is_zero());
    }

    #[test]
    fn test_check_deduction() {
        assert_eq!(
            check_deduction(Money::from_yuan(100), Money::from_yuan(300)).unwrap(),
            Money::from_yuan(200)
        );
        assert_eq!(
            check_deduction(Money::from_yuan(300), Money::from_yuan(300)).unwrap(),
            Money::zero()
        );
        assert!(matches!(
            check_deduction(Money::from_yuan(500), Money::from_yuan(300)),
            Err(CoreError::InsufficientBonusBalance { .. })
        ));
        assert!(matches!(
            check_deduction(Money::zero(), Money::from_yuan(300)),
            Err(CoreError::Validation(_))
        ));
        assert!(check_deduction(Money::from_yuan(-1), Money::from_yuan(300)).is_err());
    }

    #[test]
    fn test_prepare_deduction_stamps_operator_and_month() {
        let boss = Session::new("u1", "Boss", Role::Merchant);
        let now = Utc.with_ymd_and_hms(2024, 6, 30, 20, 0, 0).unwrap();
        let record = prepare_deduction(
            "d1".to_string(),
            Money::from_yuan(100),
            &boss,
            Money::from_yuan(250),
            now,
            &BusinessCalendar::default(),
        )
        .unwrap();

        assert_eq!(record.remaining_balance, Money::from_yuan(150));
        assert_eq!(record.operator_name, "Boss");
        // 20:00 UTC on June 30th is July in UTC+8
        assert_eq!((record.year, record.month), (2024, 7));
    }
}
