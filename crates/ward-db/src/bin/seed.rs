//! # Seed Data Generator
//!
//! Populates the database with demo patients for development.
//!
//! ## Usage
//! ```bash
//! # Generate 50 patients (default)
//! cargo run -p ward-db --bin ward-seed
//!
//! # Generate custom amount
//! cargo run -p ward-db --bin ward-seed -- --count 500
//!
//! # Specify database path
//! cargo run -p ward-db --bin ward-seed -- --db ./data/ward.db
//! ```
//!
//! Names cycle through fixed first/last name lists; emails and identity
//! cards carry the running index so every row satisfies the unique indexes.

use chrono::{Duration, NaiveDate, Utc};
use std::env;
use uuid::Uuid;
use ward_core::{Patient, UNASSIGNED_ID};
use ward_db::{Database, DbConfig, Repository};

const FIRST_NAMES: &[&str] = &[
    "Ada", "Alan", "Barbara", "Claude", "Donald", "Edsger", "Frances", "Grace", "Herbert",
    "Ivan", "John", "Katherine", "Leslie", "Margaret", "Niklaus", "Radia",
];

const LAST_NAMES: &[&str] = &[
    "Smith", "Jones", "Lovelace", "Turing", "Liskov", "Shannon", "Knuth", "Dijkstra", "Allen",
    "Hopper", "Simon", "Backus", "Johnson", "Lamport", "Hamilton", "Wirth", "Perlman",
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut count: usize = 50;
    let mut db_path = String::from("./ward_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().unwrap_or(50);
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
                println!("Ward Seed Data Generator");
                println!();
                println!("Usage: ward-seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>    Number of patients to generate (default: 50)");
                println!("  -d, --db <PATH>    Database file path (default: ./ward_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("Ward Seed Data Generator");
    println!("========================");
    println!("Database: {}", db_path);
    println!("Patients: {}", count);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let mut uow = db.write_unit_of_work();

    let existing = uow.repository::<Patient>().get_all().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} patients", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let start = std::time::Instant::now();

    for index in 0..count {
        let mut patient = generate_patient(index);
        uow.repository::<Patient>().add(&mut patient).await?;
    }
    uow.commit().await?;

    println!("✓ Generated {} patients in {:?}", count, start.elapsed());

    let mut uow = db.unit_of_work();
    let smiths = uow
        .repository::<Patient>()
        .find_by(ward_db::repository::patient::search_filter("smith"))
        .count()
        .await?;
    println!("  Search 'smith': {} results", smiths);

    println!();
    println!("✓ Seed complete!");

    db.close().await;
    Ok(())
}

/// Generates one patient with deterministic, unique natural keys.
fn generate_patient(index: usize) -> Patient {
    let first = FIRST_NAMES[index % FIRST_NAMES.len()];
    let last = LAST_NAMES[index % LAST_NAMES.len()];

    let base = NaiveDate::from_ymd_opt(1950, 1, 1).unwrap_or_default();
    let days = i64::try_from((index * 977) % 20_000).unwrap_or(0);
    let date_of_birth = base + Duration::days(days);

    Patient {
        id: UNASSIGNED_ID,
        first_name: first.to_string(),
        last_name: last.to_string(),
        email: format!("{}.{}.{}@example.com", first, last, index).to_lowercase(),
        identity_card: format!("WD{:08}", index),
        unique_key: Uuid::new_v4().to_string(),
        date_of_birth,
        mobile: format!("07{:08}", index % 100_000_000),
        registration_date: Utc::now(),
    }
}
