//! Service loops: ingestion from the bridge and expiration sweeps

mod ingest;
mod sweeper;

pub use ingest::Ingestor;
pub use sweeper::ExpirationSweeper;
