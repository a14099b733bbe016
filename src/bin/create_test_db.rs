use std::error::Error;
use std::path::Path;
use std::process::exit;

use clap::Parser;
use rust_decimal::Decimal;
use rusqlite::Connection;

use ledger_rs::{EntryStatus, EntryType, LedgerEntry, NewUser, PasswordHash, create_app_state};

/// A utility for creating a test database for the REST API server of ledger_rs.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,
}

/// Create and populate a database for manual testing.
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let output_path = Path::new(&args.output_path);

    match output_path.extension() {
        Some(extension) if !extension.is_empty() => {}
        _ => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
    }

    if output_path.is_file() {
        eprintln!("File already exists at {output_path:#?}!");
        exit(1);
    }

    println!("Creating database at {output_path:#?}");
    let conn = Connection::open(output_path)?;
    let mut state = create_app_state(conn, PasswordHash::DEFAULT_COST)?;

    println!("Creating test user...");
    let user = state.user_service.register(NewUser {
        name: "Test User".to_owned(),
        email: "test@example.com".to_owned(),
        password: "test".to_owned(),
    })?;

    println!("Creating test entries...");
    let entries = [
        ("Salary", 1, Decimal::new(500000, 2), EntryType::Income),
        ("Rent", 1, Decimal::new(180000, 2), EntryType::Expense),
        ("Groceries", 1, Decimal::new(42350, 2), EntryType::Expense),
        ("Salary", 2, Decimal::new(500000, 2), EntryType::Income),
        ("Rent", 2, Decimal::new(180000, 2), EntryType::Expense),
    ];

    for (description, month, value, entry_type) in entries {
        let mut entry = state.ledger_service.save(LedgerEntry {
            description: Some(description.to_owned()),
            month: Some(month),
            year: Some(2024),
            value: Some(value),
            entry_type: Some(entry_type),
            user_id: Some(user.id),
            ..Default::default()
        })?;

        if month == 1 {
            state
                .ledger_service
                .set_status(&mut entry, EntryStatus::Settled)?;
        }
    }

    let balance = state.ledger_service.balance_for_user(user.id)?;
    println!("Success! The test user's balance is {balance}.");

    Ok(())
}
