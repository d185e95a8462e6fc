use std::fs::File;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use estimate_core::{DEFAULT_WASTE_PERCENT, ResolveContext};
use estimate_data::SeedItemLoader;
use estimate_db_sqlite::SqliteRepository;
use rust_decimal::Decimal;

/// Import a seed item CSV as a new saved breakdown.
///
/// The CSV file should have the following columns:
/// - item: line description
/// - quantity: amount in `unit` (blank for 0)
/// - unit: unit label, e.g. `sq ft`, `boxes`, `each`
/// - unit_price: optional price per unit
/// - section: optional `materials`, `labor` or `other`
#[derive(Parser, Debug)]
#[command(name = "estimate-import")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the CSV file containing seed items
    #[arg(short, long)]
    file: PathBuf,

    /// Project name stored with the breakdown
    #[arg(short, long)]
    project: String,

    /// SQLite database path or URL
    #[arg(short, long, default_value = "estimates.db")]
    database: String,

    /// Net project area in square feet
    #[arg(short, long)]
    area: Option<Decimal>,

    /// Waste buffer percentage applied to essential materials
    #[arg(short, long, default_value_t = DEFAULT_WASTE_PERCENT)]
    waste: Decimal,

    /// Project address, used to pick the sales tax jurisdiction
    #[arg(long, default_value = "")]
    address: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let repo = SqliteRepository::new(&args.database)
        .await
        .with_context(|| format!("Failed to connect to database: {}", args.database))?;
    repo.run_migrations()
        .await
        .context("Failed to run migrations")?;

    println!("Loading seed items from: {}", args.file.display());

    let file = File::open(&args.file)
        .with_context(|| format!("Failed to open: {}", args.file.display()))?;

    let records = SeedItemLoader::parse(file)
        .with_context(|| format!("Failed to parse CSV: {}", args.file.display()))?;

    println!("Parsed {} records from CSV", records.len());

    let ctx = ResolveContext::new(args.area, args.waste);
    let saved = SeedItemLoader::load_new(&repo, &args.project, ctx, &args.address, records)
        .await
        .context("Failed to save breakdown")?;

    println!(
        "Saved breakdown {} for '{}' with {} lines, grand total {:.2}.",
        saved.id,
        saved.project_name,
        saved.breakdown.len(),
        saved.grand_total
    );

    Ok(())
}
