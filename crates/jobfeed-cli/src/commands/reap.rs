use anyhow::Result;
use chrono::Utc;

use jobfeed_core::{pipeline::reap_expired_jobs, JobStore};

pub fn run(store: &JobStore) -> Result<()> {
    println!("Cleaning up expired jobs in {}...", store.path().display());

    let report = reap_expired_jobs(store, Utc::now())?;

    if report.removed > 0 {
        println!("Removed {} expired jobs.", report.removed);
    } else {
        println!("No expired jobs found.");
    }
    println!("Active jobs remaining: {}", report.remaining);

    Ok(())
}
