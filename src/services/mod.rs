//! Caller-side orchestration above the store.

pub mod ingest;

pub use ingest::{IngestReport, IngestService};
