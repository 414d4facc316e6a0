//! Database Sizing Advisor CLI
//!
//! Sizes database workloads per environment, runs bulk sizing over CSV/JSON
//! fleets, browses the pricing catalog and annotates workload narratives.
//! Everything runs locally unless an API URL is configured.

mod client;
mod commands;
mod config;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{bulk, catalog, insights, size};
use sizer_lib::Engine;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Database Sizing Advisor CLI
#[derive(Parser)]
#[command(name = "dbsz")]
#[command(author, version, about = "Database instance sizing and cost estimator", long_about = None)]
pub struct Cli {
    /// Sizing API URL; sizing runs locally when unset (can also be set via DBSZ_API_URL)
    #[arg(long, env = "DBSZ_API_URL")]
    pub api_url: Option<String>,

    /// Output format [default: table]
    #[arg(long, short)]
    pub format: Option<output::OutputFormat>,

    /// Enable verbose output
    #[arg(long, short)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Size one workload for every environment
    Size(size::SizeArgs),

    /// Size a fleet of databases from a CSV or JSON file
    Bulk {
        /// Input file (.csv or .json)
        file: PathBuf,

        /// Export the report instead of printing a summary
        #[arg(long)]
        export: Option<output::ExportFormat>,

        /// Write the export to this file instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Browse the pricing catalog
    #[command(subcommand)]
    Catalog(CatalogCommands),

    /// Extract structured fields from a workload narrative
    Insights {
        /// Text file with the narrative
        file: PathBuf,
    },
}

#[derive(Subcommand)]
pub enum CatalogCommands {
    /// List candidate instance shapes for a region and engine
    Shapes {
        /// Region code, e.g. us-east-1
        #[arg(long)]
        region: Option<String>,

        /// Database engine, e.g. postgres
        #[arg(long)]
        engine: Option<Engine>,
    },

    /// List regions and their price multipliers
    Regions,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.verbose {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::new("debug"))
            .with_writer(std::io::stderr)
            .init();
    }

    let config = config::Config::load()?;
    let format = cli.format.or(config.default_format).unwrap_or_default();
    let client = cli
        .api_url
        .as_deref()
        .or(config.api_url.as_deref())
        .map(client::ApiClient::new)
        .transpose()?;

    match cli.command {
        Commands::Size(args) => {
            size::run(args, client.as_ref(), &config, format).await?;
        }
        Commands::Bulk {
            file,
            export,
            output,
        } => {
            bulk::run(&file, export, output.as_deref(), client.as_ref(), format).await?;
        }
        Commands::Catalog(catalog_cmd) => match catalog_cmd {
            CatalogCommands::Shapes { region, engine } => {
                catalog::show_shapes(client.as_ref(), &config, region, engine, format).await?;
            }
            CatalogCommands::Regions => {
                catalog::show_regions(client.as_ref(), format).await?;
            }
        },
        Commands::Insights { file } => {
            insights::run(&file, format)?;
        }
    }

    Ok(())
}
