use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Instant;
use strength_tracker_import::db::AthleteRepository;
use strength_tracker_import::importers::{AthleteRecord, RosterImporter};
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "athlete-import")]
#[command(about = "Import athlete strength records from a spreadsheet into the athletes table", long_about = None)]
struct Cli {
    /// Path to the roster spreadsheet (.xlsx)
    spreadsheet: PathBuf,

    /// Database connection URL (postgres:// or mysql://)
    #[arg(env = "DATABASE_URL")]
    database_url: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if it exists (ignore errors if not found)
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    // Verify file exists before touching the database
    if !cli.spreadsheet.exists() {
        error!("Spreadsheet not found: {:?}", cli.spreadsheet);
        return Err(format!("Spreadsheet not found: {:?}", cli.spreadsheet).into());
    }

    // Parse spreadsheet (blocking operation)
    let start_time = Instant::now();
    println!("Loading spreadsheet: {}", cli.spreadsheet.display());

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap(),
    );
    pb.set_message("Parsing roster workbook...");

    let path = cli.spreadsheet.to_string_lossy().to_string();
    let sheet = tokio::task::spawn_blocking(move || {
        let importer = RosterImporter::new(&path);
        importer.load()
    })
    .await??;

    let candidates = sheet.len();
    pb.finish_with_message(format!("✓ Found {candidates} athletes"));

    info!("Connecting to database...");
    let repo = AthleteRepository::connect(&cli.database_url).await?;

    let mut imported = 0usize;
    let mut failed = 0usize;

    for row in sheet.rows() {
        let record = match AthleteRecord::from_row(sheet.header(), row) {
            Ok(Some(record)) => record,
            // Name column blank after trimming, nothing to import
            Ok(None) => continue,
            Err(e) => {
                let name = sheet.candidate_name(row).unwrap_or_default();
                println!("✗ Failed to import {name}: {e}");
                failed += 1;
                continue;
            }
        };

        match repo.upsert(&record).await {
            Ok(()) => {
                println!("✓ Imported: {}", record.name);
                imported += 1;
            }
            Err(e) if e.is_connection_loss() => {
                error!("Connection lost while importing {}: {}", record.name, e);
                return Err(e.into());
            }
            Err(e) => {
                println!("✗ Failed to import {}: {e}", record.name);
                failed += 1;
            }
        }
    }

    let stored = repo.count().await?;
    repo.close().await;

    let total_duration = start_time.elapsed();
    info!("Import summary: {imported} imported, {failed} failed");

    // Print import summary
    println!("\n{}", "=".repeat(60));
    println!("Import Summary");
    println!("{}", "=".repeat(60));
    println!("Candidate Rows:     {candidates}");
    println!("Imported:           {imported}");
    println!("Failed:             {failed}");
    println!("Athletes Stored:    {stored}");
    println!("{}", "-".repeat(60));
    println!("Total Time:         {:.2}s", total_duration.as_secs_f64());
    println!("{}", "=".repeat(60));
    println!();

    Ok(())
}
