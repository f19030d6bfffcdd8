//! rfmforge: customer segmentation by RFM (Recency, Frequency, Monetary) scoring
//!
//! Transactions are aggregated per customer, each customer is given a 1-4
//! quartile score on every axis, and the combined scores map to a named
//! segment such as "Champions" or "At Risk".

pub mod cli;
pub mod data;
pub mod error;
pub mod ingest;
pub mod logging;
pub mod model;
pub mod segment;
pub mod store;
pub mod viz;

// Re-export public items for easier access
pub use cli::Args;
pub use data::{load_transactions, write_scores_csv, Transaction};
pub use error::RfmError;
pub use ingest::{ingest_upload, IngestReport};
pub use model::{aggregate_transactions, compute_rfm_scores, CustomerAggregate, RfmScore};
pub use segment::{classify, Segment};
pub use store::{JsonFileStore, MemoryStore, TransactionStore};
pub use viz::{create_segment_chart, summarize_segments, SegmentSummary};

/// Common result type used throughout the application
pub type Result<T> = anyhow::Result<T>;
