use std::collections::HashSet;

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};

use crate::config::AppConfig;
use crate::feed::{try_parse_items, FeedFetcher, Source};
use crate::job::{Job, JobNormalizer};
use crate::store::{merge, JobStore};
use crate::Result;

/// What happened to one source during an ingestion run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceOutcome {
    pub name: String,
    /// Jobs normalized from this source (before deduplication)
    pub fetched: usize,
    /// Fetch or parse failure; the source contributed nothing when set
    pub error: Option<String>,
}

impl SourceOutcome {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Summary of an ingestion run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestReport {
    pub sources: Vec<SourceOutcome>,
    /// Jobs whose id was not in the store before this run
    pub added: usize,
    /// Size of the stored list after the run
    pub total: usize,
    /// Whether the store file was rewritten
    pub saved: bool,
}

impl IngestReport {
    pub fn failed_sources(&self) -> usize {
        self.sources.iter().filter(|s| !s.is_success()).count()
    }
}

/// Fetch -> parse -> normalize for every source, then merge into the store
pub struct IngestPipeline {
    fetcher: FeedFetcher,
    normalizer: JobNormalizer,
    sources: Vec<Source>,
    concurrency: usize,
}

impl IngestPipeline {
    /// Build a pipeline from configuration, validating the source list
    pub fn new(config: &AppConfig) -> Result<Self> {
        Ok(Self::from_parts(
            FeedFetcher::new(&config.fetch)?,
            JobNormalizer::new(&config.normalize),
            config.sources()?,
            config.fetch.concurrency,
        ))
    }

    pub fn from_parts(
        fetcher: FeedFetcher,
        normalizer: JobNormalizer,
        sources: Vec<Source>,
        concurrency: usize,
    ) -> Self {
        Self {
            fetcher,
            normalizer,
            sources,
            concurrency: concurrency.max(1),
        }
    }

    pub fn sources(&self) -> &[Source] {
        &self.sources
    }

    /// Fetch and normalize every source.
    ///
    /// Up to `concurrency` feeds are in flight at once. Results come back in
    /// source order whatever order the fetches finish in, and a failing
    /// source yields no jobs without affecting the others.
    pub async fn collect(&self, now: DateTime<Utc>) -> (Vec<Job>, Vec<SourceOutcome>) {
        let results: Vec<(Vec<Job>, SourceOutcome)> = stream::iter(&self.sources)
            .map(|source| self.process_source(source, now))
            .buffered(self.concurrency)
            .collect()
            .await;

        let mut jobs = Vec::new();
        let mut outcomes = Vec::with_capacity(results.len());
        for (source_jobs, outcome) in results {
            jobs.extend(source_jobs);
            outcomes.push(outcome);
        }

        (jobs, outcomes)
    }

    async fn process_source(&self, source: &Source, now: DateTime<Utc>) -> (Vec<Job>, SourceOutcome) {
        tracing::info!("Fetching jobs from: {}", source.name);

        let failed = |error: String| -> (Vec<Job>, SourceOutcome) {
            (Vec::new(), SourceOutcome {
                name: source.name.clone(),
                fetched: 0,
                error: Some(error),
            })
        };

        let content = match self.fetcher.fetch(&source.url).await {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!(source = %source.name, "Skipping source, fetch failed: {}", e);
                return failed(e.to_string());
            }
        };

        let mut items = match try_parse_items(&content) {
            Ok(items) => items,
            Err(e) => {
                tracing::warn!(source = %source.name, "Skipping source, {}", e);
                return failed(e.to_string());
            }
        };

        if let Some(max) = source.max_items {
            items.truncate(max);
        }

        let jobs = self.normalizer.normalize_all(items, source, now);
        tracing::info!(source = %source.name, count = jobs.len(), "Normalized jobs");

        let outcome = SourceOutcome {
            name: source.name.clone(),
            fetched: jobs.len(),
            error: None,
        };
        (jobs, outcome)
    }

    /// Run a full ingestion: collect from all sources, merge with the stored
    /// list and persist the result.
    ///
    /// Source failures are reported in the returned [`IngestReport`]. A store
    /// that exists but cannot be read or parsed aborts the run with
    /// `StoreRead` before anything is written, so its content is never
    /// replaced by a list built from nothing. Nothing is written when the run
    /// found no new jobs.
    pub async fn run(&self, store: &JobStore, now: DateTime<Utc>) -> Result<IngestReport> {
        let (incoming, outcomes) = self.collect(now).await;

        if !outcomes.is_empty() && outcomes.iter().all(|o| !o.is_success()) {
            tracing::warn!("Every source failed; the stored job list is left as it was");
        }

        let existing = store.try_load()?;
        let known: HashSet<String> = existing.iter().map(|job| job.id.clone()).collect();
        let merged = merge(existing, incoming);
        let added = merged.iter().filter(|job| !known.contains(&job.id)).count();

        let saved = if added > 0 {
            store.save(&merged)?;
            true
        } else {
            tracing::info!("No new jobs found");
            false
        };

        Ok(IngestReport {
            sources: outcomes,
            added,
            total: merged.len(),
            saved,
        })
    }
}
