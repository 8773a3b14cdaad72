//! # Customer Gift Eligibility
//!
//! Customers who buy enough in a month get free units every day until the
//! end of the following month.
//!
//! ## Eligibility Window
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │            prior month          current month          next month      │
//! │          ├───────────────┼─────────────────────┼────────────────────┤  │
//! │                                    ▲ today                              │
//! │                                                                         │
//! │  current month ≥ 300 units   ──────────────────────────────────────►│  │
//! │  (source: current month)                     gift_end = end of next     │
//! │                                                                         │
//! │  only prior month ≥ 300      ─────────────────────►│                    │
//! │  (source: prior month)        gift_end = end of current month           │
//! │                                                                         │
//! │  Current-month qualification always wins over prior-month.             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Gift Tiers
//! ```text
//! ┌─────────────────────┬──────────────┬─────────┐
//! │ units in the month  │ gifts / day  │ colour  │
//! ├─────────────────────┼──────────────┼─────────┤
//! │      0 -   299      │      0       │  -      │
//! │    300 -   999      │      1       │  blue   │
//! │  1,000 - 4,999      │      2       │  blue   │
//! │  5,000 +            │      2       │  red    │  ← VIP
//! └─────────────────────┴──────────────┴─────────┘
//! ```
//!
//! Only `sale` transactions count, and only their `quantity` (gift units
//! handed out never earn more gifts). The computation is read-only; saving
//! a snapshot is a separate, explicit step.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use ts_rs::TS;

use crate::calendar::{BusinessCalendar, YearMonth};
use crate::money::Money;
use crate::quantity::Quantity;
use crate::types::{GiftRecord, Transaction};

/// Units a customer must buy in one month to qualify.
pub const GIFT_QUALIFYING_UNITS: i64 = 300;

/// Entries with this many days left or fewer count as urgent.
pub const URGENT_REMAINING_DAYS: i64 = 3;

// =============================================================================
// Tiers
// =============================================================================

/// Badge colour on the gift screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum DisplayColor {
    Blue,
    /// VIP customers (5,000+ units).
    Red,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct GiftTier {
    pub min_units: i64,
    pub daily_gift_quantity: i64,
    /// `None` for the tier that is not displayed.
    pub color: Option<DisplayColor>,
}

/// Gift tiers ordered by threshold. Each tier starts at its `min_units`.
pub static GIFT_TIERS: [GiftTier; 4] = [
    GiftTier { min_units: 0, daily_gift_quantity: 0, color: None },
    GiftTier { min_units: 300, daily_gift_quantity: 1, color: Some(DisplayColor::Blue) },
    GiftTier { min_units: 1_000, daily_gift_quantity: 2, color: Some(DisplayColor::Blue) },
    GiftTier { min_units: 5_000, daily_gift_quantity: 2, color: Some(DisplayColor::Red) },
];

/// The highest tier whose threshold the quantity reaches.
pub fn gift_tier_for(quantity: Quantity) -> &'static GiftTier {
    GIFT_TIERS
        .iter()
        .rev()
        .find(|tier| quantity >= Quantity::from_units(tier.min_units))
        .unwrap_or(&GIFT_TIERS[0])
}

// =============================================================================
// Gift Source
// =============================================================================

/// Which month's purchases earned the gift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[ts(export)]
pub enum GiftSource {
    #[serde(rename = "current month")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "current_month"))]
    CurrentMonth,
    #[serde(rename = "prior month")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "prior_month"))]
    PriorMonth,
}

// =============================================================================
// Entries
// =============================================================================

/// One eligible customer on the gift screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CustomerGiftEntry {
    pub customer_name: String,
    pub current_month_sales: Quantity,
    pub last_month_sales: Quantity,
    pub current_month_amount: Money,
    pub last_month_amount: Money,
    pub current_month_transactions: i64,
    pub last_month_transactions: i64,
    pub daily_gift_quantity: i64,
    pub display_color: DisplayColor,
    pub gift_source: GiftSource,
    #[ts(as = "String")]
    pub gift_end_date: DateTime<Utc>,
    pub remaining_days: i64,
}

impl CustomerGiftEntry {
    /// Units bought over both months.
    pub fn combined_sales(&self) -> Quantity {
        self.current_month_sales + self.last_month_sales
    }

    pub fn is_urgent(&self) -> bool {
        self.remaining_days <= URGENT_REMAINING_DAYS
    }

    /// Copies the entry into a gift log record.
    pub fn to_record(&self, id: String, created_at: DateTime<Utc>) -> GiftRecord {
        GiftRecord {
            id,
            customer_name: self.customer_name.clone(),
            daily_gift_quantity: self.daily_gift_quantity,
            current_month_sales: self.current_month_sales,
            last_month_sales: self.last_month_sales,
            current_month_amount: self.current_month_amount,
            last_month_amount: self.last_month_amount,
            gift_source: self.gift_source,
            gift_end_date: self.gift_end_date,
            remaining_days: self.remaining_days,
            created_at,
        }
    }
}

/// Whole days from `now` until `end`, truncated, never negative.
pub fn remaining_days(end: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (end - now).num_days().max(0)
}

#[derive(Default)]
struct MonthTotals {
    units: Quantity,
    amount: Money,
    count: i64,
}

impl MonthTotals {
    fn add(&mut self, tx: &Transaction) {
        self.units += tx.quantity;
        self.amount += tx.total_amount;
        self.count += 1;
    }
}

/// Computes every customer currently owed daily gifts.
///
/// ## Ordering
/// Fewest remaining days first, then most combined units, then name.
///
/// Customers with no gifts or an expired window are left out.
pub fn customer_gift_data(
    transactions: &[Transaction],
    now: DateTime<Utc>,
    calendar: &BusinessCalendar,
) -> Vec<CustomerGiftEntry> {
    let current: YearMonth = calendar.current_month(now);
    let prior = current.prev();

    let mut totals: BTreeMap<&str, (MonthTotals, MonthTotals)> = BTreeMap::new();
    for tx in transactions.iter().filter(|tx| tx.is_sale()) {
        let month = calendar.month_of(tx.created_at);
        if month == current {
            totals.entry(tx.customer_name.as_str()).or_default().0.add(tx);
        } else if month == prior {
            totals.entry(tx.customer_name.as_str()).or_default().1.add(tx);
        }
    }

    let qualifying = Quantity::from_units(GIFT_QUALIFYING_UNITS);
    let current_source_end = calendar.month_end(current.next());
    let prior_source_end = calendar.month_end(current);

    let mut entries: Vec<CustomerGiftEntry> = totals
        .into_iter()
        .filter_map(|(customer, (this_month, last_month))| {
            let (tier, source, end) = if this_month.units >= qualifying {
                (gift_tier_for(this_month.units), GiftSource::CurrentMonth, current_source_end)
            } else if last_month.units >= qualifying {
                (gift_tier_for(last_month.units), GiftSource::PriorMonth, prior_source_end)
            } else {
                return None;
            };

            let color = tier.color?;
            let days = remaining_days(end, now);
            if tier.daily_gift_quantity <= 0 || days <= 0 {
                return None;
            }

            Some(CustomerGiftEntry {
                customer_name: customer.to_string(),
                current_month_sales: this_month.units,
                last_month_sales: last_month.units,
                current_month_amount: this_month.amount,
                last_month_amount: last_month.amount,
                current_month_transactions: this_month.count,
                last_month_transactions: last_month.count,
                daily_gift_quantity: tier.daily_gift_quantity,
                display_color: color,
                gift_source: source,
                gift_end_date: end,
                remaining_days: days,
            })
        })
        .collect();

    entries.sort_by(|a, b| {
        a.remaining_days
            .cmp(&b.remaining_days)
            .then_with(|| b.combined_sales().cmp(&a.combined_sales()))
            .then_with(|| a.customer_name.cmp(&b.customer_name))
    });
    entries
}

// =============================================================================
// Summary
// =============================================================================

/// Customer counts by combined two-month units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TierStats {
    /// 300 - 999 units.
    pub tier1: i64,
    /// 1,000 - 4,999 units.
    pub tier2: i64,
    /// 5,000+ units.
    pub tier3: i64,
}

/// Headline figures for the gift screen.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct GiftSummary {
    pub total_customers: i64,
    pub total_daily_gifts: i64,
    pub total_current_month_sales: Quantity,
    pub total_last_month_sales: Quantity,
    pub total_current_month_amount: Money,
    pub total_last_month_amount: Money,
    /// Entries with three days or fewer left.
    pub urgent_customers: i64,
    pub tier_stats: TierStats,
}

/// Aggregates a list of entries from [`customer_gift_data`].
pub fn gift_summary(entries: &[CustomerGiftEntry]) -> GiftSummary {
    let mut summary = GiftSummary {
        total_customers: entries.len() as i64,
        ..Default::default()
    };

    for entry in entries {
        summary.total_daily_gifts += entry.daily_gift_quantity;
        summary.total_current_month_sales += entry.current_month_sales;
        summary.total_last_month_sales += entry.last_month_sales;
        summary.total_current_month_amount += entry.current_month_amount;
        summary.total_last_month_amount += entry.last_month_amount;
        if entry.is_urgent() {
            summary.urgent_customers += 1;
        }

        let combined = entry.combined_sales();
        if combined >= Quantity::from_units(5_000) {
            summary.tier_stats.tier3 += 1;
        } else if combined >= Quantity::from_units(1_000) {
            summary.tier_stats.tier2 += 1;
        } else if combined >= Quantity::from_units(GIFT_QUALIFYING_UNITS) {
            summary.tier_stats.tier1 += 1;
        }
    }

    summary
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TransactionType;
    use chrono::TimeZone;

    fn cal() -> BusinessCalendar {
        BusinessCalendar::from_utc_offset_hours(0).unwrap()
    }

    fn sale(customer: &str, units: i64, created_at: DateTime<Utc>) -> Transaction {
        Transaction {
            id: format!("{customer}-{units}-{created_at}"),
            transaction_type: TransactionType::Sale,
            customer_name: customer.to_string(),
            product_name: Some("Rice".to_string()),
            collector: "Zhang San".to_string(),
            quantity: Quantity::from_units(units),
            gift_quantity: Quantity::zero(),
            unit_price: Money::from_yuan(2),
            total_amount: Money::from_yuan(units * 2),
            created_at,
        }
    }

    fn d(y: i32, m: u32, day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, day, 10, 0, 0).unwrap()
    }

    #[test]
    fn test_current_month_qualifier() {
        let now = d(2024, 6, 15);
        let txs = vec![sale("Li Si", 350, d(2024, 6, 2))];
        let entries = customer_gift_data(&txs, now, &cal());

        assert_eq!(entries.len(), 1);
        let e = &entries[0];
        assert_eq!(e.gift_source, GiftSource::CurrentMonth);
        assert_eq!(e.daily_gift_quantity, 1);
        assert_eq!(e.display_color, DisplayColor::Blue);
        assert_eq!(e.gift_end_date, cal().month_end(YearMonth::new(2024, 7).unwrap()));
        assert_eq!(e.current_month_amount, Money::from_yuan(700));
        assert_eq!(e.current_month_transactions, 1);
    }

    #[test]
    fn test_prior_month_qualifier_vip() {
        let now = d(2024, 6, 15);
        let txs = vec![sale("Wang Wu", 6000, d(2024, 5, 20))];
        let entries = customer_gift_data(&txs, now, &cal());

        assert_eq!(entries.len(), 1);
        let e = &entries[0];
        assert_eq!(e.gift_source, GiftSource::PriorMonth);
        assert_eq!(e.daily_gift_quantity, 2);
        assert_eq!(e.display_color, DisplayColor::Red);
        assert_eq!(e.gift_end_date, cal().month_end(YearMonth::new(2024, 6).unwrap()));
        // June 30 23:59:59.999 - June 15 10:00 = 15 days and change
        assert_eq!(e.remaining_days, 15);
    }

    #[test]
    fn test_current_month_takes_precedence() {
        let now = d(2024, 6, 15);
        let txs = vec![
            sale("Li Si", 6000, d(2024, 5, 3)),
            sale("Li Si", 400, d(2024, 6, 3)),
        ];
        let entries = customer_gift_data(&txs, now, &cal());
        assert_eq!(entries[0].gift_source, GiftSource::CurrentMonth);
        assert_eq!(entries[0].daily_gift_quantity, 1);
        assert_eq!(entries[0].display_color, DisplayColor::Blue);
    }

    #[test]
    fn test_below_threshold_and_non_sales_excluded() {
        let now = d(2024, 6, 15);
        let mut gift = sale("Gift Only", 900, d(2024, 6, 3));
        gift.transaction_type = TransactionType::Gift;
        let mut with_gift_units = sale("Close Call", 299, d(2024, 6, 3));
        with_gift_units.gift_quantity = Quantity::from_units(50);
        let txs = vec![
            gift,
            with_gift_units,
            sale("Old Timer", 5000, d(2024, 4, 3)),
        ];
        assert!(customer_gift_data(&txs, now, &cal()).is_empty());
    }

    #[test]
    fn test_prior_month_window_expires_on_last_day() {
        // 23:00 on June 30th: less than one whole day left
        let now = Utc.with_ymd_and_hms(2024, 6, 30, 23, 0, 0).unwrap();
        let txs = vec![
            sale("Expiring", 400, d(2024, 5, 3)),
            sale("Fresh", 400, d(2024, 6, 3)),
        ];
        let entries = customer_gift_data(&txs, now, &cal());
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].customer_name, "Fresh");
    }

    #[test]
    fn test_sort_by_urgency_then_volume() {
        let now = d(2024, 6, 15);
        let txs = vec![
            sale("Current Small", 300, d(2024, 6, 1)),
            sale("Prior Small", 300, d(2024, 5, 1)),
            sale("Prior Big", 2000, d(2024, 5, 1)),
        ];
        let names: Vec<String> = customer_gift_data(&txs, now, &cal())
            .into_iter()
            .map(|e| e.customer_name)
            .collect();
        assert_eq!(names, vec!["Prior Big", "Prior Small", "Current Small"]);
    }

    #[test]
    fn test_tier_lookup() {
        assert_eq!(gift_tier_for(Quantity::from_units(0)).daily_gift_quantity, 0);
        assert_eq!(gift_tier_for(Quantity::from_hundredths(29_999)).daily_gift_quantity, 0);
        assert_eq!(gift_tier_for(Quantity::from_units(300)).daily_gift_quantity, 1);
        assert_eq!(gift_tier_for(Quantity::from_units(999)).daily_gift_quantity, 1);
        assert_eq!(gift_tier_for(Quantity::from_units(1000)).daily_gift_quantity, 2);
        assert_eq!(gift_tier_for(Quantity::from_units(4999)).color, Some(DisplayColor::Blue));
        assert_eq!(gift_tier_for(Quantity::from_units(5000)).color, Some(DisplayColor::Red));
    }

    #[test]
    fn test_read_path_is_repeatable() {
        let now = d(2024, 6, 15);
        let txs = vec![sale("Li Si", 350, d(2024, 6, 2)), sale("Wang Wu", 6000, d(2024, 5, 2))];
        assert_eq!(customer_gift_data(&txs, now, &cal()), customer_gift_data(&txs, now, &cal()));
    }

    #[test]
    fn test_summary() {
        let now = d(2024, 6, 28);
        let txs = vec![
            sale("A", 350, d(2024, 6, 2)),
            sale("B", 6000, d(2024, 5, 2)),
            sale("C", 700, d(2024, 5, 2)),
            sale("C", 400, d(2024, 6, 2)),
        ];
        let entries = customer_gift_data(&txs, now, &cal());
        let summary = gift_summary(&entries);

        assert_eq!(summary.total_customers, 3);
        assert_eq!(summary.total_daily_gifts, 1 + 2 + 1);
        assert_eq!(summary.total_current_month_sales, Quantity::from_units(750));
        assert_eq!(summary.total_last_month_sales, Quantity::from_units(6700));
        // B's window ends June 30th: 2 days left
        assert_eq!(summary.urgent_customers, 1);
        assert_eq!(summary.tier_stats, TierStats { tier1: 1, tier2: 1, tier3: 1 });
    }

    #[test]
    fn test_gift_source_labels() {
        assert_eq!(serde_json::to_string(&GiftSource::CurrentMonth).unwrap(), "\"current month\"");
        assert_eq!(serde_json::to_string(&GiftSource::PriorMonth).unwrap(), "\"prior month\"");
    }
}
