//! # Monthly Report
//!
//! Prints one month of books: salaries, the bonus pool, gift customers and
//! outstanding balances.
//!
//! ## Usage
//! ```bash
//! # Current month, configured database
//! cargo run -p tally-service --bin tally-report
//!
//! # A specific month
//! cargo run -p tally-service --bin tally-report -- --month 2024-06
//!
//! # Explicit config file
//! cargo run -p tally-service --bin tally-report -- --config ./tally.toml
//! ```
//!
//! A section whose data cannot be read is printed empty and the failure
//! is logged. The report itself only fails if the config is unusable.

use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use tally_core::YearMonth;
use tally_db::{Database, FallbackStore, MemoryStore, RecordStore};
use tally_service::{init_tracing, ApiResult, Bookkeeper, LedgerConfig};
use tracing::warn;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut config_path: Option<PathBuf> = None;
    let mut month_arg: Option<String> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" | "-c" => {
                if i + 1 < args.len() {
                    config_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--month" | "-m" => {
                if i + 1 < args.len() {
                    month_arg = Some(args[i + 1].clone());
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Tally Monthly Report");
                println!();
                println!("Usage: tally-report [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -m, --month <YYYY-MM>  Month to report (default: current month)");
                println!("  -c, --config <PATH>    Config file (default: platform config dir)");
                println!("  -h, --help             Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    let config = LedgerConfig::load_or_default(config_path);
    init_tracing(&config.logging.filter);

    let store: Arc<dyn RecordStore> = match Database::new(config.db_config()?).await {
        Ok(db) => Arc::new(FallbackStore::new(db, MemoryStore::new())),
        Err(e) => {
            warn!("Database unavailable: {}. Reporting from an empty in-memory store.", e);
            Arc::new(MemoryStore::new())
        }
    };
    let keeper = Bookkeeper::new(store, config.calendar()?);

    let month = match month_arg.as_deref() {
        Some(raw) => parse_month(raw).ok_or_else(|| format!("Invalid month '{}', expected YYYY-MM", raw))?,
        None => keeper.current_month(),
    };

    println!("📒 Tally Report for {}", month);
    println!("==========================");

    // Salaries
    println!();
    println!("Salaries");
    let salaries = or_empty(keeper.get_all_employees_monthly_salary(month).await, "salaries");
    if salaries.is_empty() {
        println!("  (no active employees)");
    }
    for s in &salaries {
        println!(
            "  {:<16} sold {:>10}  commission {:>12}  bonus {:>11}  total {:>12}",
            s.employee_name,
            s.total_sales_quantity.to_string(),
            s.commission.to_string(),
            s.bonus.to_string(),
            s.total_salary.to_string()
        );
    }

    // Bonus pool
    let pool = or_empty(keeper.calculate_bonus_pool(Some(month)).await, "bonus pool");
    println!();
    println!("Bonus Pool");
    println!("  Sales            {:>14}", pool.sales_amount.to_string());
    println!("  Returns          {:>14}", pool.return_amount.to_string());
    println!("  Salaries         {:>14}", pool.total_salary.to_string());
    println!("  Fixed cost       {:>14}", pool.fixed_cost.to_string());
    println!("  Net profit       {:>14}", pool.net_profit.to_string());
    println!("  Month's accrual  {:>14}", pool.bonus_pool.to_string());
    println!("  All-time accrual {:>14}", pool.cumulative_bonus_pool.to_string());
    println!("  Deducted         {:>14}", pool.total_deductions.to_string());
    println!("  Balance          {:>14}", pool.current_balance.to_string());

    // Gifts (always relative to today)
    let gifts = or_empty(keeper.get_customer_gift_data().await, "gift eligibility");
    let summary = tally_core::gift::gift_summary(&gifts);
    println!();
    println!(
        "Gift Customers (today): {} customers, {} units/day, {} ending soon",
        summary.total_customers, summary.total_daily_gifts, summary.urgent_customers
    );
    for g in &gifts {
        println!(
            "  {:<24} {}/day  until {}  ({} days left)",
            g.customer_name,
            g.daily_gift_quantity,
            g.gift_end_date
                .with_timezone(&keeper.calendar().offset())
                .format("%Y-%m-%d"),
            g.remaining_days
        );
    }

    // Balances
    let balances = or_empty(keeper.get_all_employees_summary().await, "balances");
    println!();
    println!("Outstanding Balances");
    for b in &balances {
        let marker = if b.is_merchant { "*" } else { " " };
        println!(
            " {}{:<16} collected {:>12}  handed over {:>12}  balance {:>12}",
            marker,
            b.employee_name,
            b.total_amount.to_string(),
            b.total_transferred.to_string(),
            b.current_balance.to_string()
        );
    }

    println!();
    println!("✓ Done");

    Ok(())
}

/// Unwraps a read, or logs the failure and returns an empty value.
fn or_empty<T: Default>(result: ApiResult<T>, section: &str) -> T {
    result.unwrap_or_else(|e| {
        warn!(section, "Read failed: {}", e);
        T::default()
    })
}

/// Parses `YYYY-MM`.
fn parse_month(raw: &str) -> Option<YearMonth> {
    let (year, month) = raw.trim().split_once('-')?;
    YearMonth::new(year.parse().ok()?, month.parse().ok()?).ok()
}
