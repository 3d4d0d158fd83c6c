use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use colored::Colorize;
use dd_driver::{DiffDriver, DiffReport, PreviousRelease};
use dd_fetch::{ArchiveFetcher, FileVersionSource, HttpVersionSource, VersionSource};
use dd_types::Version;
use serde::Serialize;
use tracing::warn;

use crate::cli::*;
use crate::config::DiffDragonConfig;
use crate::orchestrator::{Orchestrator, RunSummary};

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = resolve_config(&cli)?;
    let format = cli.format;
    match cli.command {
        Command::Run(args) => cmd_run(config, args, format).await,
        Command::Diff(args) => cmd_diff(config, args, format).await,
        Command::Versions(args) => cmd_versions(config, args, format).await,
    }
}

fn resolve_config(cli: &Cli) -> anyhow::Result<DiffDragonConfig> {
    let mut config = match &cli.config {
        Some(path) => DiffDragonConfig::load(path)?,
        None => DiffDragonConfig::default(),
    };
    if let Some(root) = &cli.output_root {
        config.output_root = root.clone();
    }
    if let Some(root) = &cli.download_root {
        config.download_root = root.clone();
    }
    Ok(config)
}

async fn load_history(config: &DiffDragonConfig, history: &HistoryArgs) -> anyhow::Result<Vec<Version>> {
    let floor = match history.from {
        Some(from) if from.is_older_than(&config.min_version) => {
            warn!(%from, min = %config.min_version, "--from is below the supported minimum; using the minimum");
            config.min_version
        }
        Some(from) => from,
        None => config.min_version,
    };

    let source: Box<dyn VersionSource> = match &history.versions_file {
        Some(path) => Box::new(FileVersionSource::new(path)),
        None => Box::new(HttpVersionSource::new(
            config.versions_url.clone(),
            Duration::from_secs(config.request_timeout_secs),
        )?),
    };
    source.versions(&floor).await.context("fetching version log")
}

async fn cmd_run(mut config: DiffDragonConfig, args: RunArgs, format: OutputFormat) -> anyhow::Result<()> {
    if let Some(batch_size) = args.batch_size {
        config.download_batch_size = batch_size;
    }
    config.validate()?;

    let versions = load_history(&config, &args.history).await?;
    let fetcher = ArchiveFetcher::new(config.fetch_config()).context("building HTTP client")?;
    let orchestrator = Orchestrator::new(
        DiffDriver::new(config.driver_config()),
        Arc::new(fetcher),
        config.download_batch_size,
        config.folder_wait_timeout(),
    );

    let summary = orchestrator.run(versions).await?;
    match format {
        OutputFormat::Json => print_json(&summary),
        OutputFormat::Text => {
            print_run_summary(&summary);
            Ok(())
        }
    }
}

async fn cmd_diff(config: DiffDragonConfig, args: DiffArgs, format: OutputFormat) -> anyhow::Result<()> {
    let previous = match (args.prev_version, args.prev_folder) {
        (Some(version), Some(folder)) => Some(PreviousRelease::new(version, folder)),
        _ => None,
    };
    let driver = DiffDriver::new(config.driver_config());
    let report = driver.run(previous, args.next_version, args.next_folder).await?;

    match format {
        OutputFormat::Json => print_json(&report),
        OutputFormat::Text => {
            print_report(&report);
            println!("  Output: {}", driver.output_dir(&report.next).display().to_string().bold());
            Ok(())
        }
    }
}

async fn cmd_versions(config: DiffDragonConfig, args: VersionsArgs, format: OutputFormat) -> anyhow::Result<()> {
    let versions = load_history(&config, &args.history).await?;
    match format {
        OutputFormat::Json => print_json(&versions),
        OutputFormat::Text => {
            for version in &versions {
                println!("{version}");
            }
            println!("{} releases since {}", versions.len().to_string().bold(), config.min_version);
            Ok(())
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_report(report: &DiffReport) {
    let mark = if report.is_clean() { "✓".green().bold() } else { "!".yellow().bold() };
    let against = match report.previous {
        Some(previous) => format!("against {previous}"),
        None => "base release".to_string(),
    };
    println!(
        "{} {} ({}): {} written, {} unchanged, {} ignored",
        mark,
        report.next.to_string().yellow(),
        against,
        report.files_written().to_string().bold(),
        report.structured_unchanged + report.assets_skipped,
        report.ignored,
    );
    for path in &report.unrecognized {
        println!("  {} {}", "unrecognized:".dimmed(), path.display());
    }
    for failure in &report.failures {
        println!("  {} {}: {}", "failed:".red(), failure.path.display(), failure.error);
    }
}

fn print_run_summary(summary: &RunSummary) {
    for report in &summary.reports {
        print_report(report);
    }
    for failure in &summary.failed_pairs {
        println!("{} {}: {}", "✗".red().bold(), failure.version.to_string().yellow(), failure.error);
    }
    println!(
        "\nFetched {} releases ({} failed), wrote {} bundles.",
        summary.fetched.to_string().bold(),
        summary.fetch_failures,
        summary.reports.len().to_string().green(),
    );
}
