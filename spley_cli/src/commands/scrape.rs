use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use chrono::{Local, NaiveDate};
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use spley_lib::{
    default_output_path, launch, run_scrape, sink_for, summarize, Channel, DateRange, DateWindow,
    LogNotifier, ResourceSampler, SamplerSummary, ScraperConfig,
};

use crate::output::{print_resource_summary, print_run_stats, print_summary, OutputFormat};

const SAMPLE_INTERVAL: Duration = Duration::from_secs(5);
const SAMPLER_JOIN_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Args)]
pub struct ScrapeArgs {
    /// First presentation date (DD/MM/YYYY or YYYY-MM-DD)
    #[arg(long, value_parser = parse_date_arg)]
    pub from: Option<NaiveDate>,

    /// Last presentation date (DD/MM/YYYY or YYYY-MM-DD)
    #[arg(long, value_parser = parse_date_arg)]
    pub to: Option<NaiveDate>,

    /// Search the last N days up to today when --from is not given
    #[arg(long)]
    pub last_days: Option<u32>,

    /// Output file (.csv or .json); defaults to proyectos_ley_<timestamp>.csv
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Maximum number of result pages to visit
    #[arg(long)]
    pub max_pages: Option<u32>,

    /// Attempts per browser step
    #[arg(long)]
    pub retries: Option<u32>,

    /// Run Chrome without a window
    #[arg(long, conflicts_with = "headed")]
    pub headless: bool,

    /// Run Chrome with a visible window
    #[arg(long)]
    pub headed: bool,

    /// WebDriver server address (e.g. http://localhost:9515)
    #[arg(long)]
    pub webdriver_url: Option<String>,

    /// Sample CPU and memory use while scraping
    #[arg(long)]
    pub monitor: bool,

    /// Print the dataset summary after saving
    #[arg(long)]
    pub summary: bool,
}

fn parse_date_arg(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%d/%m/%Y")
        .or_else(|_| NaiveDate::parse_from_str(s, "%Y-%m-%d"))
        .map_err(|_| format!("invalid date '{}', expected DD/MM/YYYY or YYYY-MM-DD", s))
}

impl ScrapeArgs {
    /// Flags override the environment layer.
    fn apply(&self, config: &mut ScraperConfig) -> Result<()> {
        if let Some(n) = self.max_pages {
            config.max_pages = n;
        }
        if let Some(n) = self.retries {
            config.max_retries = n;
        }
        if self.headless {
            config.browser.headless = true;
        }
        if self.headed {
            config.browser.headless = false;
        }
        if let Some(ref url) = self.webdriver_url {
            config.browser.webdriver_url = url.clone();
        }
        if let Some(days) = self.last_days {
            config.date_window = DateWindow::LastDays(days);
        }
        config.check()?;
        Ok(())
    }

    fn date_range(&self, window: DateWindow) -> Result<DateRange> {
        Ok(DateRange::resolve(self.from, self.to, window)?)
    }
}

pub async fn run(args: &ScrapeArgs, mut config: ScraperConfig, format: &OutputFormat) -> Result<()> {
    args.apply(&mut config)?;
    let range = args.date_range(config.date_window)?;
    let output = match args.output {
        Some(ref path) => path.clone(),
        None => default_output_path(
            Path::new(config.output_dir.as_deref().unwrap_or(".")),
            Local::now(),
        ),
    };
    let config = Arc::new(config);

    let sampler = if args.monitor {
        Some(ResourceSampler::start(SAMPLE_INTERVAL)?)
    } else {
        None
    };

    let scraper = launch(Arc::clone(&config))
        .await?
        .with_notifier(Arc::new(LogNotifier), Channel::All);

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::with_template("[{elapsed_precise}] {spinner} {msg}")?);
    pb.set_message(format!(
        "searching bills {} - {}",
        range.from_text(),
        range.to_text()
    ));
    pb.enable_steady_tick(Duration::from_millis(120));

    let outcome = run_scrape(scraper, range).await;
    pb.finish_and_clear();

    print_run_stats(&outcome.stats, outcome.report.as_ref(), format)?;
    if let Some(sampler) = sampler {
        let snapshots = sampler.stop(SAMPLER_JOIN_TIMEOUT);
        if let Some(summary) = SamplerSummary::from_snapshots(&snapshots) {
            print_resource_summary(&summary, format)?;
        }
    }

    if outcome.records.is_empty() {
        if outcome.stats.errors_encountered > 0 {
            bail!("scrape failed before any bill was collected; see the log for details");
        }
        eprintln!(
            "No bills presented between {} and {}.",
            range.from_text(),
            range.to_text()
        );
        return Ok(());
    }

    let written = sink_for(&output).write(&outcome.records, &output)?;
    eprintln!(
        "Saved {} bills to {}",
        outcome.records.len(),
        written.display()
    );

    if args.summary {
        print_summary(&summarize(&outcome.records), format)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        args: ScrapeArgs,
    }

    fn parse(argv: &[&str]) -> ScrapeArgs {
        let mut full = vec!["spley"];
        full.extend_from_slice(argv);
        TestCli::try_parse_from(full).unwrap().args
    }

    #[test]
    fn date_args_accept_both_formats() {
        let d = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
        assert_eq!(parse_date_arg("15/06/2024").unwrap(), d);
        assert_eq!(parse_date_arg("2024-06-15").unwrap(), d);
        assert!(parse_date_arg("06-15-2024").is_err());
    }

    #[test]
    fn flags_override_config() {
        let args = parse(&[
            "--max-pages",
            "5",
            "--retries",
            "2",
            "--headed",
            "--webdriver-url",
            "http://grid:4444",
            "--last-days",
            "7",
        ]);
        let mut config = ScraperConfig::default();
        args.apply(&mut config).unwrap();
        assert_eq!(config.max_pages, 5);
        assert_eq!(config.max_retries, 2);
        assert!(!config.browser.headless);
        assert_eq!(config.browser.webdriver_url, "http://grid:4444");
        assert_eq!(config.date_window, DateWindow::LastDays(7));
    }

    #[test]
    fn zero_pages_rejected() {
        let args = parse(&["--max-pages", "0"]);
        assert!(args.apply(&mut ScraperConfig::default()).is_err());
    }

    #[test]
    fn headless_and_headed_conflict() {
        assert!(TestCli::try_parse_from(["spley", "--headless", "--headed"]).is_err());
    }

    #[test]
    fn inverted_range_rejected() {
        let args = parse(&["--from", "20/06/2024", "--to", "10/06/2024"]);
        assert!(args.date_range(DateWindow::Today).is_err());
    }

    #[test]
    fn explicit_range_kept() {
        let args = parse(&["--from", "01/06/2024", "--to", "2024-06-10"]);
        let range = args.date_range(DateWindow::Today).unwrap();
        assert_eq!(range.from_text(), "01/06/2024");
        assert_eq!(range.to_text(), "10/06/2024");
    }
}
