use std::error::Error;

use clap::Parser;
use rusqlite::Connection;

use bookkeeper_rs::{DEMO_PASSWORD, initialize_db, seed_demo_data};

/// A utility for loading the demo user and accounts into a bookkeeper_rs database.
///
/// Safe to rerun: existing demo rows are reset in place rather than duplicated.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to the application SQLite database. Created if it does not exist.
    #[arg(long)]
    db_path: String,
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let connection = Connection::open(&args.db_path)?;
    initialize_db(&connection)?;

    println!("Seeding demo data...");
    let (user, accounts) = seed_demo_data(&connection)?;

    println!(
        "Demo user {} (id {}) can log in with the password {DEMO_PASSWORD:?}.",
        user.email, user.id
    );
    for account in &accounts {
        println!("  {}: balance {:.2}", account.name, account.balance);
    }
    println!("Success!");

    Ok(())
}
