use anyhow::Result;
use chrono::Utc;

use jobfeed_core::{pipeline::ingest_all_sources, AppConfig, JobStore};

pub async fn run(config: &AppConfig, store: &JobStore) -> Result<()> {
    println!("Fetching jobs from {} sources...\n", config.sources.len());

    let report = ingest_all_sources(config, store, Utc::now()).await?;

    for source in &report.sources {
        match &source.error {
            None => println!("  {} - {} jobs", source.name, source.fetched),
            Some(err) => println!("  {} - skipped [ERROR: {}]", source.name, err),
        }
    }

    println!(
        "\nIngest complete. {} new jobs, {} total.",
        report.added, report.total
    );
    if report.saved {
        println!("Saved to: {}", store.path().display());
    }

    Ok(())
}
