mod commands;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use spley_lib::ScraperConfig;
use tracing_subscriber::EnvFilter;

use crate::output::OutputFormat;

#[derive(Parser)]
#[command(name = "spley")]
#[command(about = "Scrape, clean and summarize bills from the Peruvian Congress SPLEY portal")]
struct Cli {
    /// Output format for tables: table, json, csv or markdown
    #[arg(long, default_value = "table", global = true)]
    format: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search the portal for bills presented in a date range
    Scrape(commands::scrape::ScrapeArgs),
    /// Normalize a raw CSV export without dropping rows
    Clean(commands::clean::CleanArgs),
    /// Validate a raw CSV export and report per-field problems
    Validate(commands::validate::ValidateArgs),
    /// Summarize an export by party, category, region and state
    Summarize(commands::summarize::SummarizeArgs),
    /// Print the effective configuration
    Config,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("spley=info".parse()?))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let format = OutputFormat::parse(&cli.format);

    match &cli.command {
        Commands::Scrape(args) => {
            commands::scrape::run(args, ScraperConfig::from_env()?, &format).await?
        }
        Commands::Clean(args) => commands::clean::run(args, &format)?,
        Commands::Validate(args) => commands::validate::run(args)?,
        Commands::Summarize(args) => commands::summarize::run(args, &format)?,
        Commands::Config => commands::config::run(&ScraperConfig::from_env()?),
    }

    Ok(())
}
