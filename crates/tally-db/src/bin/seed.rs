//! # Seed Data Generator
//!
//! Populates the database with staff and a few weeks of trading for development.
//!
//! ## Usage
//! ```bash
//! # Generate 60 days of trading (default)
//! cargo run -p tally-db --bin seed
//!
//! # Generate a custom number of days
//! cargo run -p tally-db --bin seed -- --days 120
//!
//! # Specify database path
//! cargo run -p tally-db --bin seed -- --db ./data/tally.db
//! ```
//!
//! ## Generated Data
//! - One merchant account and a handful of employees
//! - One purchase per product every ten days to keep stock up
//! - Daily sales spread across customers and collectors, some with gifts
//! - An occasional return
//! - A weekly transfer from each employee to the merchant
//!
//! Quantities and prices vary deterministically with the day index, so two
//! runs produce the same books.

use chrono::{Duration, Utc};
use std::env;
use tally_core::{
    Employee, EmployeeStatus, Money, Quantity, Role, Transaction, TransactionType, Transfer,
};
use tally_db::{Database, DbConfig};
use uuid::Uuid;

/// (name, username, role)
const STAFF: &[(&str, &str, Role)] = &[
    ("Boss Chen", "boss", Role::Merchant),
    ("Zhang San", "zhangsan", Role::Employee),
    ("Li Mei", "limei", Role::Employee),
    ("Wang Qiang", "wangqiang", Role::Employee),
    ("Zhao Lei", "zhaolei", Role::Employee),
];

const CUSTOMERS: &[&str] = &[
    "Golden Wheat Bakery",
    "Riverside Canteen",
    "Sunrise Noodle House",
    "Old Town Market Stall 12",
    "Jade Garden Restaurant",
    "Harbor Hotel Kitchen",
    "Lucky Star Grocery",
    "Mountain View School",
];

/// (product, unit price in cents)
const PRODUCTS: &[(&str, i64)] = &[
    ("Rice 25kg", 300),
    ("Flour 25kg", 280),
    ("Soybean Oil 20L", 450),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut days: i64 = 60;
    let mut db_path = String::from("./tally_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--days" | "-n" => {
                if i + 1 < args.len() {
                    days = args[i + 1].parse().unwrap_or(60);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Tally Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -n, --days <N>     Days of trading to generate (default: 60)");
                println!("  -d, --db <PATH>    Database file path (default: ./tally_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Tally Seed Data Generator");
    println!("===========================");
    println!("Database: {}", db_path);
    println!("Days:     {}", days);
    println!();

    // Connect to database
    let config = DbConfig::new(&db_path);
    let db = Database::new(config).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    // Check existing staff
    let existing = db.employees().list(&Default::default()).await?;
    if !existing.is_empty() {
        println!("⚠ Database already has {} employees", existing.len());
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let now = Utc::now();
    let start_day = now - Duration::days(days);

    // Staff
    for (name, username, role) in STAFF {
        let employee = Employee {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            username: username.to_string(),
            role: *role,
            status: EmployeeStatus::Active,
            created_at: start_day - Duration::days(1),
        };
        db.employees().insert(&employee).await?;
    }
    println!("✓ Created {} staff accounts", STAFF.len());

    let collectors: Vec<&str> = STAFF
        .iter()
        .filter(|(_, _, role)| *role == Role::Employee)
        .map(|(name, _, _)| *name)
        .collect();
    let merchant = STAFF[0].0;

    // Trading
    println!();
    println!("Generating transactions...");

    let started = std::time::Instant::now();
    let mut generated = 0usize;

    for day in 0..days {
        let day_start = start_day + Duration::days(day);
        let seed = day as usize;

        if day % 10 == 0 {
            for (idx, (product, price)) in PRODUCTS.iter().enumerate() {
                let units = 1500 + ((seed * 37 + idx * 11) % 500) as i64;
                let purchase = transaction(
                    TransactionType::Purchase,
                    "Central Grain Wholesale",
                    product,
                    merchant,
                    units,
                    0,
                    *price * 8 / 10,
                    day_start + Duration::hours(1),
                );
                db.transactions().insert(&purchase).await?;
                generated += 1;
            }
        }

        let sales_today = 2 + seed % 4;
        for n in 0..sales_today {
            let mix = seed * 7 + n * 13;
            let customer = CUSTOMERS[mix % CUSTOMERS.len()];
            let collector = collectors[(seed + n) % collectors.len()];
            let (product, price) = PRODUCTS[mix % PRODUCTS.len()];
            let units = 20 + (mix % 60) as i64;
            let gift_units = if mix % 5 == 0 { 2 } else { 0 };

            let sale = transaction(
                TransactionType::Sale,
                customer,
                product,
                collector,
                units,
                gift_units,
                price,
                day_start + Duration::hours(2 + n as i64),
            );
            db.transactions().insert(&sale).await?;
            generated += 1;

            if mix % 29 == 0 {
                let ret = transaction(
                    TransactionType::Return,
                    customer,
                    product,
                    collector,
                    units / 4,
                    0,
                    price,
                    day_start + Duration::hours(9),
                );
                db.transactions().insert(&ret).await?;
                generated += 1;
            }
        }

        if day % 7 == 6 {
            for (idx, collector) in collectors.iter().enumerate() {
                let transfer = Transfer {
                    id: Uuid::new_v4().to_string(),
                    employee_name: collector.to_string(),
                    amount: Money::from_yuan(800 + (idx as i64) * 150),
                    transfer_date: (day_start + Duration::hours(10)).date_naive(),
                    note: Some("weekly handover".to_string()),
                    created_at: day_start + Duration::hours(10),
                };
                db.payments().insert_transfer(&transfer).await?;
            }
        }
    }

    let elapsed = started.elapsed();
    println!();
    println!("✓ Generated {} transactions in {:?}", generated, elapsed);

    // Verify inventory
    println!();
    println!("Current stock:");
    for item in db.inventory().list().await? {
        println!("  {:<20} {}", item.product_name, item.current_stock);
    }

    println!();
    println!("✓ Seed complete!");

    Ok(())
}

/// Builds one transaction priced at `unit_price_cents` per unit.
#[allow(clippy::too_many_arguments)]
fn transaction(
    kind: TransactionType,
    customer: &str,
    product: &str,
    collector: &str,
    units: i64,
    gift_units: i64,
    unit_price_cents: i64,
    created_at: chrono::DateTime<Utc>,
) -> Transaction {
    Transaction {
        id: Uuid::new_v4().to_string(),
        transaction_type: kind,
        customer_name: customer.to_string(),
        product_name: Some(product.to_string()),
        collector: collector.to_string(),
        quantity: Quantity::from_units(units),
        gift_quantity: Quantity::from_units(gift_units),
        unit_price: Money::from_cents(unit_price_cents),
        total_amount: Money::from_cents(unit_price_cents * units),
        created_at,
    }
}
