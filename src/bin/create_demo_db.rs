use std::error::Error;
use std::path::Path;
use std::process::exit;
use std::sync::{Arc, Mutex};

use clap::Parser;
use rusqlite::Connection;
use rust_decimal::Decimal;
use time::{Duration, OffsetDateTime};
use tracing_subscriber::EnvFilter;

use family_budget::{
    BudgetConfig, BudgetService, UserId, aggregation::display_percentage, category::CategoryName,
    initialize_db,
    ledger::{EntryKind, LedgerEntry},
    rule::{Interval, RecurringRule},
    stores::sqlite::{SQLiteCategoryStore, SQLiteLedgerStore, SQLiteRuleStore},
};

/// A utility for creating a demo database for the family budget ledger core.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,

    /// The monthly spending goal used for the goal progress printout.
    #[arg(long, default_value = "50000")]
    monthly_goal: Decimal,
}

/// Create and populate a database for manual testing, then run one
/// materialization pass and print the aggregate views.
fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let output_path = Path::new(&args.output_path);

    match output_path.extension() {
        None => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        Some(extension) if extension.is_empty() => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        _ => {}
    }

    if output_path.is_file() {
        eprintln!("File already exists at {output_path:#?}!");
        exit(1);
    }

    println!("Creating database at {output_path:#?}");
    let conn = Connection::open(output_path)?;

    initialize_db(&conn)?;

    let conn = Arc::new(Mutex::new(conn));
    let mut service = BudgetService::new(
        SQLiteCategoryStore::new(conn.clone()),
        SQLiteLedgerStore::new(conn.clone()),
        SQLiteRuleStore::new(conn),
        BudgetConfig {
            monthly_spending_goal: Some(args.monthly_goal),
            local_timezone: "UTC".to_string(),
        },
    )?;

    let user_id = UserId::new(1);
    let today = OffsetDateTime::now_utc().date();

    println!("Creating categories...");
    let rent = service.add_category(CategoryName::new("Rent")?)?;
    let groceries = service.add_category(CategoryName::new("Groceries")?)?;
    let transport = service.add_category(CategoryName::new("Transport")?)?;
    let wages = service.add_category(CategoryName::new("Wages")?)?;

    println!("Creating ledger entries...");
    service.add_entry(
        LedgerEntry::build(
            user_id,
            EntryKind::Income,
            "2750".parse()?,
            wages.id,
            today - Duration::days(40),
        )
        .description("October wages"),
    )?;
    service.add_entry(
        LedgerEntry::build(
            user_id,
            EntryKind::Expense,
            "96.40".parse()?,
            groceries.id,
            today - Duration::days(33),
        )
        .description("weekly shop"),
    )?;
    service.add_entry(
        LedgerEntry::build(
            user_id,
            EntryKind::Expense,
            "18.50".parse()?,
            transport.id,
            today - Duration::days(12),
        )
        .description("bus card top up"),
    )?;
    service.add_entry(
        LedgerEntry::build(
            user_id,
            EntryKind::Expense,
            "104.75".parse()?,
            groceries.id,
            today - Duration::days(5),
        )
        .description("weekly shop"),
    )?;

    println!("Creating recurring rules...");
    service.add_rule(
        RecurringRule::build(
            user_id,
            EntryKind::Expense,
            "1200".parse()?,
            rent.id,
            today - Duration::days(90),
        )
        .description("monthly rent")
        .interval(Interval::Monthly),
    )?;
    service.add_rule(
        RecurringRule::build(
            user_id,
            EntryKind::Income,
            "640".parse()?,
            wages.id,
            today - Duration::days(30),
        )
        .description("weekly wages")
        .interval(Interval::Weekly),
    )?;

    println!("Materializing recurring rules for today...");
    let outcome = service.run_materialization(user_id)?;
    println!(
        "Created {} entries ({} skipped, {} failed)",
        outcome.created.len(),
        outcome.skipped,
        outcome.failures.len()
    );

    let summary = service.summary(user_id)?;
    println!(
        "Summary: income {}, expenses {}, balance {}",
        summary.income_total, summary.expense_total, summary.balance
    );

    println!("Expenses by category:");
    for row in service.category_breakdown(user_id)? {
        println!("  {}: {}", row.name, row.total);
    }

    println!("Monthly trend:");
    for totals in service.monthly_trend(user_id)? {
        println!(
            "  {}: income {}, expenses {}",
            totals.label(),
            totals.income,
            totals.expense
        );
    }

    let progress = display_percentage(service.goal_progress(user_id)?);
    println!("{progress}% of the monthly spending goal spent");

    println!("Success!");

    Ok(())
}
