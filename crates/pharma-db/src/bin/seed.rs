//! # Seed Data Loader
//!
//! Populates the database with sample medicines and batches for development.
//!
//! ## Usage
//! ```bash
//! # Seed ./pharma_dev.db
//! cargo run -p pharma-db --bin seed
//!
//! # Specify database path
//! cargo run -p pharma-db --bin seed -- --db ./data/pharma.db
//! ```
//!
//! ## Sample Stock
//! Batch expiry dates are relative to today so a fresh seed always shows a
//! mix of healthy, near-expiry, expired and low stock:
//!
//! | Batch      | Medicine    | Units | Expires      |
//! |------------|-------------|-------|--------------|
//! | PCM-24A01  | Paracetamol | 100   | +400 days    |
//! | PCM-24B07  | Paracetamol | 50    | +20 days     |
//! | IBU-24A15  | Ibuprofen   | 75    | +240 days    |
//! | AMX-24C01  | Amoxicillin | 12    | +5 days      |
//! | CTZ-23K11  | Cetirizine  | 8     | -10 days     |
//! | OMZ-24D03  | Omeprazole  | 3     | +180 days    |

use chrono::{Duration, Local};
use std::env;
use pharma_core::{MedicineInput, NewBatch};
use pharma_db::{Database, DbConfig};

/// (name, composition, uses, dosage, side effects, category)
const MEDICINES: &[(&str, &str, &str, &str, &str, &str)] = &[
    (
        "Paracetamol",
        "Acetaminophen 500mg",
        "Fever, Pain relief",
        "500mg every 6 hours",
        "Nausea, Liver damage",
        "Analgesic",
    ),
    (
        "Ibuprofen",
        "Ibuprofen 400mg",
        "Pain, Inflammation",
        "400mg every 8 hours",
        "Stomach upset, Kidney issues",
        "NSAID",
    ),
    (
        "Amoxicillin",
        "Amoxicillin 250mg",
        "Bacterial infections",
        "250mg three times daily",
        "Diarrhea, Rash",
        "Antibiotic",
    ),
    (
        "Cetirizine",
        "Cetirizine 10mg",
        "Allergies",
        "10mg once daily",
        "Drowsiness, Dry mouth",
        "Antihistamine",
    ),
    (
        "Omeprazole",
        "Omeprazole 20mg",
        "Acidity, GERD",
        "20mg before breakfast",
        "Headache, Nausea",
        "PPI",
    ),
];

/// (medicine, batch_no, units, mrp cents, cost cents, days to expiry, supplier)
const BATCHES: &[(&str, &str, i64, i64, i64, i64, &str)] = &[
    ("Paracetamol", "PCM-24A01", 100, 500, 350, 400, "Sun Pharma"),
    ("Paracetamol", "PCM-24B07", 50, 500, 350, 20, "Cipla"),
    ("Ibuprofen", "IBU-24A15", 75, 800, 500, 240, "Mankind"),
    ("Amoxicillin", "AMX-24C01", 12, 1200, 800, 5, "Glaxo"),
    ("Cetirizine", "CTZ-23K11", 8, 300, 180, -10, "Dr. Reddy's"),
    ("Omeprazole", "OMZ-24D03", 3, 900, 600, 180, "Lupin"),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./pharma_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Pharmacy Seed Data Loader");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./pharma_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Pharmacy Seed Data Loader");
    println!("============================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.medicines().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} medicines", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    println!();
    println!("Loading medicines...");

    let medicines = db.medicines();
    for (name, composition, uses, dosage, side_effects, category) in MEDICINES {
        let input = MedicineInput {
            name: name.to_string(),
            composition: Some(composition.to_string()),
            uses: Some(uses.to_string()),
            dosage: Some(dosage.to_string()),
            side_effects: Some(side_effects.to_string()),
            category: Some(category.to_string()),
        };

        match medicines.create(&input).await {
            Ok(medicine) => println!("  + {} (id {})", medicine.name, medicine.id),
            Err(e) => eprintln!("Failed to insert {}: {}", name, e),
        }
    }

    println!();
    println!("Receiving batches...");

    let today = Local::now().date_naive();
    let mut received = 0;

    for (medicine_name, batch_no, quantity, mrp_cents, cost_cents, days, supplier) in BATCHES {
        let Some(medicine) = medicines.find_by_name_fragment(medicine_name).await? else {
            eprintln!("No medicine named {}, skipping {}", medicine_name, batch_no);
            continue;
        };

        let batch = NewBatch {
            medicine_id: medicine.id,
            batch_no: batch_no.to_string(),
            quantity: *quantity,
            mrp_cents: *mrp_cents,
            cost_price_cents: *cost_cents,
            mfg_date: Some(today - Duration::days(365)),
            expiry_date: today + Duration::days(*days),
            supplier: Some(supplier.to_string()),
        };

        if let Err(e) = db.batches().receive(&batch).await {
            eprintln!("Failed to receive {}: {}", batch_no, e);
            continue;
        }

        received += 1;
        println!("  + {} × {} expiring {}", quantity, batch_no, batch.expiry_date);
    }

    println!();
    println!("✓ Loaded {} medicines and {} batches", MEDICINES.len(), received);
    println!("  Run `pharmacy scan` to raise the first alerts.");

    Ok(())
}
