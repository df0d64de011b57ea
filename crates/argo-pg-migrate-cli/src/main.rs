//! argo-pg-migrate CLI - batched, verified SQLite to PostgreSQL migration.

use argo_pg_migrate::{Config, LoadStrategy, MigrateError, MigrationResult, Migrator};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{info, Level};

#[derive(Parser)]
#[command(name = "argo-pg-migrate")]
#[command(about = "Migrate ARGO float data from SQLite to PostgreSQL")]
#[command(version)]
struct Cli {
    /// Path to YAML configuration file
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// Output JSON result to stdout
    #[arg(long)]
    output_json: bool,

    /// Log format: text or json
    #[arg(long, default_value = "text")]
    log_format: String,

    /// Log verbosity: debug, info, warn, error
    #[arg(long, default_value = "info")]
    verbosity: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Copy, Clone, ValueEnum)]
enum StrategyArg {
    Insert,
    Copy,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full migration: provision, load, verify
    Run {
        /// Override the configured load strategy
        #[arg(long, value_enum)]
        strategy: Option<StrategyArg>,

        /// Skip the count verification phase
        #[arg(long)]
        skip_verify: bool,
    },

    /// Export both source tables to CSV staging files
    ExportCsv,

    /// Provision and bulk-load previously staged CSV files
    ImportCsv,

    /// Compare row counts between source and destination
    Validate,

    /// Test connectivity to both databases
    HealthCheck,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e.format_detailed());
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run() -> Result<(), MigrateError> {
    let cli = Cli::parse();

    setup_logging(&cli.verbosity, &cli.log_format)
        .map_err(|e| MigrateError::Config(e.to_string()))?;

    let mut config = Config::load(&cli.config)?;
    info!("Loaded configuration from {:?}", cli.config);

    match cli.command {
        Commands::Run {
            strategy,
            skip_verify,
        } => {
            if let Some(s) = strategy {
                config.migration.strategy = match s {
                    StrategyArg::Insert => LoadStrategy::Insert,
                    StrategyArg::Copy => LoadStrategy::Copy,
                };
            }
            if skip_verify {
                config.migration.skip_verify = true;
            }
            config.validate()?;

            let migrator = Migrator::connect(config).await?;
            let result = migrator.run().await?;
            print_result(&result, cli.output_json)?;
        }

        Commands::ExportCsv => {
            // Source-only: no destination connection needed.
            let source = argo_pg_migrate::SqliteSource::open(&config.source.path)?;
            for (table, path, rows) in
                argo_pg_migrate::stage::export_all(&source, &config.migration)?
            {
                println!("{}: {} rows -> {}", table, rows, path.display());
            }
        }

        Commands::ImportCsv => {
            config.validate()?;
            let migrator = Migrator::connect(config).await?;
            let result = migrator.import_csv().await?;
            print_result(&result, cli.output_json)?;
        }

        Commands::Validate => {
            let migrator = Migrator::connect(config).await?;
            let report = migrator.validate().await?;

            if cli.output_json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                for t in &report.tables {
                    println!(
                        "  {} {}: source={} target={}",
                        if t.matched { "✓" } else { "✗" },
                        t.table,
                        t.source_rows,
                        t.target_rows
                    );
                }
            }

            if !report.all_match() {
                return Err(MigrateError::Validation(
                    "row counts do not match".to_string(),
                ));
            }
            println!("Validation completed successfully");
        }

        Commands::HealthCheck => {
            let result = Migrator::health_check(&config).await;

            if cli.output_json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                println!("Health Check Results:");
                println!(
                    "  Source (SQLite): {} ({}ms)",
                    if result.source_connected { "OK" } else { "FAILED" },
                    result.source_latency_ms
                );
                if let Some(ref err) = result.source_error {
                    println!("    Error: {}", err);
                }
                println!(
                    "  Target (PostgreSQL): {} ({}ms)",
                    if result.target_connected { "OK" } else { "FAILED" },
                    result.target_latency_ms
                );
                if let Some(ref err) = result.target_error {
                    println!("    Error: {}", err);
                }
                println!(
                    "\n  Overall: {}",
                    if result.healthy { "HEALTHY" } else { "UNHEALTHY" }
                );
            }

            if !result.healthy {
                return Err(MigrateError::Validation("health check failed".to_string()));
            }
        }
    }

    Ok(())
}

fn print_result(result: &MigrationResult, as_json: bool) -> Result<(), MigrateError> {
    if as_json {
        println!("{}", result.to_json()?);
        return Ok(());
    }

    println!("\nMigration {}", result.status);
    println!("  Run ID: {}", result.run_id);
    println!("  Strategy: {}", result.strategy);
    println!("  Duration: {:.2}s", result.duration_seconds);
    for t in &result.tables {
        println!("  {}: {} rows ({:.1}s)", t.table, t.rows, t.seconds);
    }
    println!("  Total rows: {}", result.rows_loaded);
    if let Some(ref report) = result.verify {
        for t in &report.tables {
            println!(
                "  {} {}: source={} target={}",
                if t.matched { "✓" } else { "✗" },
                t.table,
                t.source_rows,
                t.target_rows
            );
        }
    }
    Ok(())
}

fn setup_logging(verbosity: &str, format: &str) -> Result<(), String> {
    let level = match verbosity.to_lowercase().as_str() {
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false);

    if format == "json" {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    Ok(())
}
