//! Supplychain CLI - shipment ETL and analytics
//!
//! # Main Commands
//!
//! ```bash
//! supplychain run                     # Extracts → enriched CSV report
//! supplychain load                    # Extracts → SQLite
//! supplychain query claims            # Analytics as JSON
//! supplychain serve                   # Start HTTP server (port 8000)
//! ```
//!
//! # Debug Commands
//!
//! ```bash
//! supplychain parse claims.csv        # Just parse CSV to JSON
//! ```
//!
//! Defaults come from `SUPPLY_CHAIN_*` variables (a `.env` file is read
//! first); flags override them.

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::path::{Path, PathBuf};

use supplychain::{
    parse_csv_file_auto, persist_all, query, run_from_paths, run_to_report, ClaimJoin, Config,
    DatasetPaths, PipelineOptions, SqliteStore,
};

#[derive(Parser)]
#[command(name = "supplychain")]
#[command(about = "Clean, join and analyse supply-chain CSV extracts", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the pipeline and write the enriched report
    Run {
        /// Directory holding the five extracts
        #[arg(short, long)]
        data_dir: Option<PathBuf>,

        /// Report path
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Keep deliveries that have no claim
        #[arg(long)]
        keep_unclaimed: bool,

        /// Reference date for aging and restock metrics (YYYY-MM-DD, default today)
        #[arg(long)]
        as_of: Option<chrono::NaiveDate>,
    },

    /// Clean the extracts and load them into the database
    Load {
        /// Directory holding the five extracts
        #[arg(short, long)]
        data_dir: Option<PathBuf>,

        /// SQLite database path
        #[arg(long)]
        db: Option<PathBuf>,
    },

    /// Parse a CSV file and output JSON
    Parse {
        /// Input CSV file
        input: PathBuf,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Run an analytics query against the database
    Query {
        report: QueryKind,

        /// SQLite database path
        #[arg(long)]
        db: Option<PathBuf>,
    },

    /// Start HTTP server
    Serve {
        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,

        /// SQLite database path
        #[arg(long)]
        db: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum QueryKind {
    Claims,
    Inventory,
    Carriers,
    Vendors,
}

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let result = match Config::from_env() {
        Ok(config) => match cli.command {
            Commands::Run {
                data_dir,
                output,
                keep_unclaimed,
                as_of,
            } => cmd_run(
                &data_dir.unwrap_or(config.data_dir),
                &output.unwrap_or(config.output),
                keep_unclaimed,
                as_of,
            ),

            Commands::Load { data_dir, db } => cmd_load(
                &data_dir.unwrap_or(config.data_dir),
                &db.unwrap_or(config.database),
            ),

            Commands::Parse { input, output } => cmd_parse(&input, output.as_deref()),

            Commands::Query { report, db } => cmd_query(report, &db.unwrap_or(config.database)),

            Commands::Serve { port, db } => {
                let config = Config {
                    port: port.unwrap_or(config.port),
                    database: db.unwrap_or(config.database),
                    ..config
                };
                supplychain::server::start_server(config).await
            }
        },
        Err(e) => Err(e.into()),
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

fn cmd_run(
    data_dir: &Path,
    output: &Path,
    keep_unclaimed: bool,
    as_of: Option<chrono::NaiveDate>,
) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📂 Extracts: {}", data_dir.display());

    let mut options = PipelineOptions::default();
    if let Some(date) = as_of {
        options.today = date;
    }
    if keep_unclaimed {
        options.claim_join = ClaimJoin::Left;
    }

    let result = run_to_report(&DatasetPaths::in_dir(data_dir), &options, output)?;

    eprintln!(
        "\n💾 {} enriched records written to: {}",
        result.enriched.len(),
        output.display()
    );
    eprintln!("✨ Done!");
    Ok(())
}

fn cmd_load(data_dir: &Path, db: &Path) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📂 Extracts: {}", data_dir.display());
    eprintln!("🗄️  Database: {}", db.display());

    let result = run_from_paths(&DatasetPaths::in_dir(data_dir), &PipelineOptions::default())?;

    let mut store = SqliteStore::open(db)?;
    let report = persist_all(&mut store, &result.cleaned);

    eprintln!("\n📊 Loaded {} rows", report.rows_loaded());
    let failures: Vec<String> = report
        .failures()
        .map(|(dataset, err)| format!("{}: {}", dataset, err))
        .collect();
    if !failures.is_empty() {
        return Err(format!("{} dataset(s) rejected: {}", failures.len(), failures.join("; ")).into());
    }

    eprintln!("✨ Done!");
    Ok(())
}

fn cmd_parse(input: &Path, output: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Parsing CSV: {}", input.display());

    let result = parse_csv_file_auto(input)?;

    eprintln!("   Encoding: {}", result.encoding);
    eprintln!("   Delimiter: '{}' (auto-detected)", format_delimiter(result.delimiter));
    eprintln!("   Columns: {}", result.headers.join(", "));
    eprintln!("✅ Parsed {} records", result.records.len());

    let json = serde_json::to_string_pretty(&result.records)?;
    write_output(&json, output)?;

    Ok(())
}

fn cmd_query(kind: QueryKind, db: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let store = SqliteStore::open(db)?;
    let snapshot = store.snapshot()?;
    let today = chrono::Local::now().date_naive();

    let json = match kind {
        QueryKind::Claims => serde_json::to_string_pretty(&query::claims_summary(&snapshot))?,
        QueryKind::Inventory => {
            serde_json::to_string_pretty(&query::inventory_health(&snapshot, today))?
        }
        QueryKind::Carriers => serde_json::to_string_pretty(&query::carrier_performance(&snapshot))?,
        QueryKind::Vendors => {
            serde_json::to_string_pretty(&query::vendor_performance(&snapshot, today))?
        }
    };
    println!("{}", json);
    Ok(())
}

fn format_delimiter(d: char) -> String {
    match d {
        '\t' => "\\t".to_string(),
        c => c.to_string(),
    }
}

fn write_output(content: &str, path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    match path {
        Some(p) => {
            fs::write(p, content)?;
            eprintln!("💾 Output written to: {}", p.display());
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
