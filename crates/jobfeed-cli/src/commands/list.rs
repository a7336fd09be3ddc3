use anyhow::Result;
use chrono::Utc;

use jobfeed_core::JobStore;

pub fn run(store: &JobStore) -> Result<()> {
    let jobs = store.load();

    if jobs.is_empty() {
        println!("No jobs stored yet.");
        println!("\nTo fetch jobs, run:");
        println!("  jobfeed ingest");
        return Ok(());
    }

    println!("Jobs ({}):\n", jobs.len());

    let now = Utc::now();
    for job in &jobs {
        let expiry = match job.days_left(now) {
            Some(days) if days > 0 => format!("{} days left", days),
            Some(_) => "expired".to_string(),
            None => "no expiry".to_string(),
        };

        println!("  {} - {} ({})", job.title, job.company, expiry);
        println!("    {} | {}", job.source, job.url);
    }

    Ok(())
}
