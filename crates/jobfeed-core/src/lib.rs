pub mod config;
pub mod error;
pub mod feed;
pub mod job;
pub mod pipeline;
pub mod store;

pub use config::AppConfig;
pub use error::{Error, Result};
pub use job::Job;
pub use store::JobStore;
