mod dedup;
mod job_store;
mod reaper;

pub use dedup::merge;
pub use job_store::JobStore;
pub use reaper::reap;
