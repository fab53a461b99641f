use std::collections::BTreeMap;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use pipeline::drivers::BrowserlessDriver;
use pipeline::model::OpenRouter;
use pipeline::stores::{PostgresStore, SkillField};
use pipeline::{crawl, enrich, AnalysisStore, Config, EnrichmentClient};

#[derive(Parser)]
#[command(name = "insights", about = "Job listing ingestion and enrichment pipeline")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Crawl a search-results URL and persist the raw listings
    Crawl {
        /// Search-results URL to paginate through
        search_url: String,
    },
    /// Analyze unenriched listings with the configured model
    Enrich {
        /// Override the configured fetch limit
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Print aggregate statistics from persisted analyses
    Stats {
        /// Entries per skill ranking
        #[arg(long, default_value_t = 10)]
        top: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::from_env().context("loading configuration from environment")?;

    let store = PostgresStore::connect(&config.database)
        .await
        .context("connecting to the database")?;

    match cli.command {
        Command::Crawl { search_url } => {
            let mut driver = BrowserlessDriver::new(
                &config.browser.base_url,
                config.browser.token.as_deref(),
                search_url,
            )
            .context("building the page driver")?;

            let report = crawl(&mut driver, &store).await?;
            println!(
                "Crawled {} page(s): {} inserted, {} skipped of {} attempted.",
                report.pages, report.inserted, report.skipped, report.attempted
            );
        }
        Command::Enrich { limit } => {
            let model = OpenRouter::new(&config.api_key, &config.model);
            let client = EnrichmentClient::new(model);
            let limit = limit.unwrap_or(config.fetch_limit);

            let report = enrich(&store, &client, limit).await?;
            if report.store_unavailable {
                println!("Store unavailable; nothing was processed.");
            } else {
                println!(
                    "Enriched {} of {} fetched listing(s), {} failed.",
                    report.saved, report.fetched, report.failed
                );
            }
        }
        Command::Stats { top } => {
            print_stats(&store, top).await?;
        }
    }

    Ok(())
}

async fn print_stats(store: &PostgresStore, top: usize) -> Result<()> {
    let total = store.analysis_count().await?;
    println!("Analyses persisted: {total}");

    let months = store.distinct_months().await?;
    if months.is_empty() {
        println!("No analyses yet; run `insights enrich` first.");
        return Ok(());
    }

    for month in months {
        println!("\n== {} ==", month.format("%Y-%m"));

        let analyses = store.analyses_for_month(month).await?;
        println!("Analyses: {}", analyses.len());

        let mut work_types = BTreeMap::new();
        for analysis in &analyses {
            let label = analysis.work_type.as_deref().unwrap_or("unknown");
            *work_types.entry(label.to_string()).or_insert(0usize) += 1;
        }
        println!("Work types:");
        for (label, count) in work_types {
            println!("  {count:>5}  {label}");
        }

        let sectors = store.top_sectors(month, top).await?;
        println!("Top sectors:");
        for (sector, count) in sectors {
            println!("  {count:>5}  {sector}");
        }

        for (label, field) in [
            ("Hard skills", SkillField::Hard),
            ("Soft skills", SkillField::Soft),
            ("Responsibilities", SkillField::Responsibilities),
            ("Title skills", SkillField::Title),
        ] {
            let ranking = store.skill_distribution(field, month, top).await?;
            println!("{label}:");
            for (skill, count) in ranking {
                println!("  {count:>5}  {skill}");
            }
        }
    }

    Ok(())
}
