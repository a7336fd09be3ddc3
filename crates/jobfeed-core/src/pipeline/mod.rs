mod ingest;
pub mod tasks;

pub use ingest::{IngestPipeline, IngestReport, SourceOutcome};
pub use tasks::{ingest_all_sources, reap_expired_jobs, ReapReport};
