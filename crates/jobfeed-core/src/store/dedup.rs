use std::collections::HashSet;

use crate::job::Job;

/// Merge freshly normalized jobs into the stored list.
///
/// The first job seen for each id wins, scanning `existing` then `incoming`.
/// Stored jobs keep their position and content; new ids are appended in the
/// order they arrived.
pub fn merge(existing: Vec<Job>, incoming: Vec<Job>) -> Vec<Job> {
    let mut seen: HashSet<String> = HashSet::with_capacity(existing.len() + incoming.len());
    let mut merged = Vec::with_capacity(existing.len() + incoming.len());

    for job in existing.into_iter().chain(incoming) {
        if seen.insert(job.id.clone()) {
            merged.push(job);
        } else {
            tracing::debug!(id = %job.id, "Dropping duplicate job");
        }
    }

    merged
}
