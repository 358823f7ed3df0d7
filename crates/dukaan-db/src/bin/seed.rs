//! # Seed Data Generator
//!
//! Populates the database with development data: categories, products,
//! accessories and a few buyers with opening udhar balances.
//!
//! ## Usage
//! ```bash
//! # Seed the default database file
//! cargo run -p dukaan-db --bin seed
//!
//! # Specify database path
//! cargo run -p dukaan-db --bin seed -- --db ./data/dukaan.db
//! ```

use std::env;

use dukaan_core::{NewAccessory, NewBuyer, NewProduct};
use dukaan_db::{Database, DbConfig};

/// Phone models per category: (category, [(model, local name)]).
const PHONES: &[(&str, &[(&str, &str)])] = &[
    (
        "Smartphones",
        &[
            ("Galaxy A16", "Samsung A16"),
            ("Galaxy A36", "Samsung A36"),
            ("Redmi Note 14", "Redmi Note"),
            ("Redmi 14C", "Redmi C"),
            ("Vivo Y29", "Vivo Y"),
            ("Infinix Hot 50", "Infinix Hot"),
            ("Tecno Spark 30", "Tecno Spark"),
        ],
    ),
    (
        "Feature Phones",
        &[
            ("Nokia 105", "Nokia Chhota"),
            ("Nokia 110", "Nokia Button"),
            ("Itel Value 100", "Itel Sasta"),
        ],
    ),
];

/// Accessory names per category.
const ACCESSORIES: &[(&str, &[&str])] = &[
    (
        "Chargers",
        &["25W USB-C Charger", "Car Charger", "Wireless Charging Pad"],
    ),
    (
        "Covers",
        &["Silicone Cover", "Flip Cover", "Rugged Case"],
    ),
    (
        "Audio",
        &["Wired Handsfree", "TWS Earbuds", "Neckband"],
    ),
];

const COLORS: &[&str] = &["Black", "Blue", "Silver", "Green"];

const VARIANTS: &[&str] = &["64GB", "128GB", "256GB"];

/// Buyers with opening balances carried over from the paper register.
const BUYERS: &[(&str, &str, i64)] = &[
    ("Ahmed Khan", "03001234501", 250_000),
    ("Bilal Traders", "03211234502", 0),
    ("Saeed Mobile Walk-in", "03331234503", 1_200_00),
    ("Farhan Bhai", "03451234504", 0),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    // Parse command line arguments
    let args: Vec<String> = env::args().collect();
    let mut db_path = String::from("./dukaan_dev.db");

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
                println!("Dukaan Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./dukaan_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("Dukaan Seed Data Generator");
    println!("==========================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected, migrations applied");

    let existing = db.products().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let start = std::time::Instant::now();

    // Products: every model in every color and variant, price varied by a
    // deterministic per-row seed so listings look lived-in
    let mut product_count = 0usize;
    for (category_name, models) in PHONES {
        let category = db
            .categories()
            .create(dukaan_core::CatalogKind::Product, category_name)
            .await?;

        for (model_idx, (name, local_name)) in models.iter().enumerate() {
            for (color_idx, color) in COLORS.iter().enumerate() {
                for (variant_idx, variant) in VARIANTS.iter().enumerate() {
                    let seed = model_idx * 100 + color_idx * 10 + variant_idx;
                    let market = 3_500_000 + (seed as i64 * 75_000);
                    let dealer = market - 400_000;

                    let new = NewProduct {
                        name: (*name).to_string(),
                        local_name: Some((*local_name).to_string()),
                        category_id: category.id.clone(),
                        market_price_cents: market,
                        dealer_price_cents: dealer,
                        image_url: None,
                        available: ((seed * 7) % 25) as i64,
                        color: (*color).to_string(),
                        variant: (*variant).to_string(),
                    };
                    new.validate()?;
                    db.products().insert(&new).await?;
                    product_count += 1;
                }
            }
        }
    }

    println!("✓ Seeded {} products", product_count);

    let mut accessory_count = 0usize;
    for (category_name, names) in ACCESSORIES {
        let category = db
            .categories()
            .create(dukaan_core::CatalogKind::Accessory, category_name)
            .await?;

        for (name_idx, name) in names.iter().enumerate() {
            for (color_idx, color) in COLORS.iter().enumerate() {
                let seed = name_idx * 10 + color_idx;
                let market = 50_000 + (seed as i64 * 15_000);

                let new = NewAccessory {
                    name: (*name).to_string(),
                    local_name: None,
                    category_id: category.id.clone(),
                    market_price_cents: market,
                    dealer_price_cents: market * 7 / 10,
                    image_url: None,
                    available: ((seed * 11) % 60) as i64,
                    color: (*color).to_string(),
                };
                new.validate()?;
                db.accessories().insert(&new).await?;
                accessory_count += 1;
            }
        }
    }

    println!("✓ Seeded {} accessories", accessory_count);

    for (name, phone, opening_udhar_cents) in BUYERS {
        let new = NewBuyer {
            name: (*name).to_string(),
            phone: Some((*phone).to_string()),
            address: None,
            opening_udhar_cents: *opening_udhar_cents,
        };
        new.validate()?;
        db.buyers().create(&new).await?;
    }

    println!("✓ Seeded {} buyers", BUYERS.len());
    println!();
    println!("✓ Seed complete in {:?}", start.elapsed());

    Ok(())
}
