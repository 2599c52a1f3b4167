//! CSV holdings import tool.
//!
//! Reads a spreadsheet export and upserts books, MARC records, audience
//! targets and curation notes into the catalog database.
//!
//! ```text
//! import_books --file holdings.csv --location "Main stacks" --dry-run
//! ```

use std::path::PathBuf;

use clap::Parser;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use seoga_server::{
    config::AppConfig, repository::Repository, services::import::ImportService,
};

#[derive(Parser, Debug)]
#[command(name = "import_books", about = "Import library holdings from a CSV export")]
struct Args {
    /// Path to the CSV file
    #[arg(short, long)]
    file: PathBuf,

    /// Shelf location assigned to imported books
    #[arg(short, long, default_value = "Main stacks")]
    location: String,

    /// Validate and report without writing anything
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let args = Args::parse();
    let config = AppConfig::load().expect("Failed to load configuration");

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("seoga_server={}", config.logging.level).into());
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .connect(&config.database.url)
        .await
        .expect("Failed to connect to database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run database migrations");

    let import = ImportService::new(Repository::new(pool));

    let report = import
        .import_csv(&args.file, args.dry_run, &args.location)
        .await?;

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
