pub mod ingest;
pub mod init;
pub mod list;
pub mod reap;
pub mod sources;
