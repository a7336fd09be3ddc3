use chrono::{DateTime, Utc};

use super::ingest::{IngestPipeline, IngestReport};
use crate::config::AppConfig;
use crate::store::{reap, JobStore};
use crate::Result;

/// Summary of a reap run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReapReport {
    pub removed: usize,
    pub remaining: usize,
}

/// Fetch every configured source and merge new jobs into the store
pub async fn ingest_all_sources(
    config: &AppConfig,
    store: &JobStore,
    now: DateTime<Utc>,
) -> Result<IngestReport> {
    let pipeline = IngestPipeline::new(config)?;
    let report = pipeline.run(store, now).await?;

    tracing::info!(
        "Ingest complete: {} new jobs, {} stored, {}/{} sources failed",
        report.added,
        report.total,
        report.failed_sources(),
        report.sources.len()
    );

    Ok(report)
}

/// Remove expired jobs from the store.
///
/// The file is only rewritten when at least one job was removed.
pub fn reap_expired_jobs(store: &JobStore, now: DateTime<Utc>) -> Result<ReapReport> {
    let jobs = store.load();
    let before = jobs.len();
    let live = reap(jobs, now);
    let removed = before - live.len();

    if removed > 0 {
        store.save(&live)?;
        tracing::info!("Removed {} expired jobs", removed);
    }

    Ok(ReapReport {
        removed,
        remaining: live.len(),
    })
}
