//! Catalog CLI - Harvests standards committee catalogues into JSON snapshots

use catalog_lib::HarvestSettings;
use catalog_lib::config::{
    self, CatalogSource, default_output_dir, default_sources, load_sources, select_sources,
};
use catalog_lib::fetch::HttpPageSource;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::{filter::EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "catalog")]
#[command(about = "Harvests standards committee catalogues into JSON snapshots", long_about = None)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short = 'v', action = clap::ArgAction::Count, global = true)]
    log_verbosity: u8,

    /// Output logs as JSON
    #[arg(long, global = true)]
    json: bool,

    /// YAML file listing the catalogues to harvest [default: built-in list]
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Harvest catalogues and write one snapshot per catalogue
    Harvest {
        /// Catalogue names to harvest (all configured catalogues when omitted)
        #[arg(value_name = "NAME")]
        names: Vec<String>,

        /// Output directory [default: $CATALOG_OUTPUT_DIR or ./data]
        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,

        /// Maximum detail pages fetched at once
        #[arg(long, value_name = "N", default_value_t = config::DEFAULT_CONCURRENCY)]
        concurrency: usize,
    },

    /// List the configured catalogues
    List,
}

/// Default log filter for a `-v` count when `RUST_LOG` is unset
fn log_filter(verbose: u8) -> &'static str {
    match verbose {
        // Retries and aborted catalogues still show at WARN
        0 => "warn",
        1 => "warn,catalog_lib=info",
        2 => "info,catalog_lib=debug",
        _ => "debug,catalog_lib=trace",
    }
}

fn init_tracing(verbose: u8, json: bool) {
    let base_filter =
        std::env::var("RUST_LOG").unwrap_or_else(|_| log_filter(verbose).to_string());

    let filter = EnvFilter::try_new(&base_filter).unwrap_or_else(|_| EnvFilter::new("warn"));

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_file(verbose >= 3)
                    .with_line_number(verbose >= 3)
                    .with_writer(std::io::stderr)
                    .compact(),
            )
            .init();
    }
}

fn configured_sources(path: Option<&Path>) -> Result<Vec<CatalogSource>, catalog_lib::CatalogError> {
    match path {
        Some(path) => load_sources(path),
        None => Ok(default_sources()),
    }
}

#[tokio::main]
async fn main() {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.log_verbosity, cli.json);

    let sources = match configured_sources(cli.config.as_deref()) {
        Ok(sources) => sources,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    match cli.command {
        Commands::Harvest {
            names,
            output,
            concurrency,
        } => {
            let sources = match select_sources(sources, &names) {
                Ok(sources) => sources,
                Err(e) => {
                    eprintln!("Error: {}", e);
                    std::process::exit(1);
                }
            };

            let settings = HarvestSettings {
                concurrency,
                ..HarvestSettings::default()
            };
            let pages = match HttpPageSource::new(&settings) {
                Ok(pages) => pages,
                Err(e) => {
                    eprintln!("Error: {}", e);
                    std::process::exit(1);
                }
            };
            let output_dir = output.unwrap_or_else(default_output_dir);

            tracing::info!(catalogues = sources.len(), output = %output_dir.display(), "Harvest starting");

            let reports = catalog_lib::harvest(&sources, &pages, &settings, &output_dir).await;

            let mut failed = 0;
            for report in &reports {
                match &report.result {
                    Ok(summary) => println!(
                        "{}: {} documents in {:.1}s -> {}",
                        report.source.name,
                        summary.documents,
                        summary.elapsed_secs,
                        summary.path.display()
                    ),
                    Err(e) => {
                        failed += 1;
                        eprintln!("{}: harvest failed: {}", report.source.name, e);
                    }
                }
            }

            if failed > 0 {
                eprintln!("{} of {} catalogues failed", failed, reports.len());
                std::process::exit(1);
            }
        }

        Commands::List => {
            for source in &sources {
                println!("{}\t{}", source.name, source.url);
            }
        }
    }
}
