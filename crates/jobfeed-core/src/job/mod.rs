mod model;
mod normalizer;

pub use model::{Job, Timestamp};
pub use normalizer::{fallback_url, job_id, JobNormalizer};
