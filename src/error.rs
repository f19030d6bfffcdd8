//! Error types for RFM scoring and transaction loading

use thiserror::Error;

/// Errors raised while preparing or scoring transactions
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RfmError {
    /// Quantiles are undefined over an empty cohort
    #[error("cannot compute RFM scores: no transactions supplied")]
    EmptyInput,

    #[error("required column `{0}` is missing from the input")]
    MissingColumn(String),

    #[error("row {row}: customer_id is empty")]
    MissingCustomerId { row: usize },

    #[error("row {row}: unparseable transaction_date `{value}`")]
    InvalidDate { row: usize, value: String },

    #[error("invalid reference date `{0}` (expected YYYY-MM-DD or RFC 3339)")]
    InvalidReferenceDate(String),
}
