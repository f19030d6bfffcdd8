//! Transaction loading and score export using Polars

use anyhow::Context;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;
use tracing::{debug, warn};

use crate::error::RfmError;
use crate::model::RfmScore;

/// Columns every transaction upload must carry
pub const REQUIRED_COLUMNS: [&str; 3] = ["customer_id", "transaction_date", "transaction_amount"];

/// Accepted calendar date layouts, tried in order
const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%Y/%m/%d"];

/// Accepted naive timestamp layouts, tried in order
const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"];

/// A single customer transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub customer_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
    pub transaction_date: NaiveDate,
    pub transaction_amount: f64,
}

impl Transaction {
    pub fn new(
        customer_id: impl Into<String>,
        transaction_date: NaiveDate,
        transaction_amount: f64,
    ) -> Self {
        Self {
            customer_id: customer_id.into(),
            customer_name: None,
            transaction_date,
            transaction_amount,
        }
    }

    pub fn with_name(mut self, customer_name: impl Into<String>) -> Self {
        self.customer_name = Some(customer_name.into());
        self
    }
}

/// Parse a transaction amount. Unparseable, non-finite and negative
/// values are malformed and yield `None`.
pub fn try_parse_amount(raw: &str) -> Option<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite() && *value >= 0.0)
}

/// Parse a transaction amount, degrading anything malformed to zero
pub fn parse_amount(raw: &str) -> f64 {
    try_parse_amount(raw).unwrap_or(0.0)
}

/// Parse a transaction date. Timestamps keep only their calendar date.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            DateTime::parse_from_rfc3339(raw)
                .ok()
                .map(|dt| dt.with_timezone(&Utc).date_naive())
        })
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
                .map(|dt| dt.date())
        })
}

/// Parse the "now" reference instant used for recency.
/// A bare date means midnight UTC of that day.
pub fn parse_reference_time(raw: &str) -> Result<DateTime<Utc>, RfmError> {
    let trimmed = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.with_timezone(&Utc));
    }

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
        .map(|date| date.and_time(NaiveTime::MIN).and_utc())
        .ok_or_else(|| RfmError::InvalidReferenceDate(raw.to_string()))
}

/// Load transactions from a CSV file
///
/// # Arguments
/// * `file_path` - Path to a CSV with `customer_id`, `transaction_date`,
///   `transaction_amount` and optionally `customer_name` columns
///
/// # Returns
/// * Transactions in file order
pub fn load_transactions(file_path: &str) -> crate::Result<Vec<Transaction>> {
    // Read every column as a string so amounts can be parsed leniently
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .try_into_reader_with_file_path(Some(file_path.into()))?
        .finish()
        .with_context(|| format!("failed to read transactions from {}", file_path))?;

    debug!(rows = df.height(), path = file_path, "loaded transaction CSV");
    transactions_from_frame(&df)
}

/// Convert a string-typed DataFrame into transactions
pub fn transactions_from_frame(df: &DataFrame) -> crate::Result<Vec<Transaction>> {
    for column in REQUIRED_COLUMNS {
        if df.column(column).is_err() {
            return Err(RfmError::MissingColumn(column.to_string()).into());
        }
    }

    let ids = df.column("customer_id")?.str()?;
    let dates = df.column("transaction_date")?.str()?;
    let amounts = df.column("transaction_amount")?.str()?;
    let names = match df.column("customer_name") {
        Ok(series) => Some(series.str()?),
        Err(_) => None,
    };

    let mut transactions = Vec::with_capacity(df.height());
    let mut malformed_amounts = 0usize;

    for idx in 0..df.height() {
        let row = idx + 1;

        let customer_id = ids.get(idx).map(str::trim).unwrap_or_default();
        if customer_id.is_empty() {
            return Err(RfmError::MissingCustomerId { row }.into());
        }

        let raw_date = dates.get(idx).unwrap_or_default();
        let transaction_date = parse_date(raw_date).ok_or_else(|| RfmError::InvalidDate {
            row,
            value: raw_date.to_string(),
        })?;

        let raw_amount = amounts.get(idx).unwrap_or_default();
        let transaction_amount = match try_parse_amount(raw_amount) {
            Some(amount) => amount,
            None => {
                malformed_amounts += 1;
                debug!(row, value = raw_amount, "malformed amount treated as 0");
                0.0
            }
        };

        let customer_name = names
            .and_then(|col| col.get(idx))
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string);

        transactions.push(Transaction {
            customer_id: customer_id.to_string(),
            customer_name,
            transaction_date,
            transaction_amount,
        });
    }

    if malformed_amounts > 0 {
        warn!(count = malformed_amounts, "malformed transaction amounts treated as 0");
    }

    Ok(transactions)
}

/// Write scores to a CSV file, one row per customer
pub fn write_scores_csv(scores: &[RfmScore], output_path: &Path) -> crate::Result<()> {
    let mut df = df!(
        "customer_id" => scores.iter().map(|s| s.customer_id.as_str()).collect::<Vec<_>>(),
        "customer_name" => scores.iter().map(|s| s.customer_name.as_deref()).collect::<Vec<_>>(),
        "recency_days" => scores.iter().map(|s| s.recency_days).collect::<Vec<_>>(),
        "recency_score" => scores.iter().map(|s| u32::from(s.recency_score)).collect::<Vec<_>>(),
        "frequency_score" => scores
            .iter()
            .map(|s| u32::from(s.frequency_score))
            .collect::<Vec<_>>(),
        "monetary_score" => scores.iter().map(|s| u32::from(s.monetary_score)).collect::<Vec<_>>(),
        "total_transactions" => scores
            .iter()
            .map(|s| s.total_transactions as u64)
            .collect::<Vec<_>>(),
        "total_spend" => scores.iter().map(|s| s.total_spend).collect::<Vec<_>>(),
        "avg_spend" => scores.iter().map(|s| s.avg_spend).collect::<Vec<_>>(),
        "last_transaction_date" => scores
            .iter()
            .map(|s| s.last_transaction_date.format("%Y-%m-%d").to_string())
            .collect::<Vec<_>>(),
        "segment_name" => scores.iter().map(|s| s.segment_name.label()).collect::<Vec<_>>()
    )?;

    let mut file = File::create(output_path)
        .with_context(|| format!("failed to create {}", output_path.display()))?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(&mut df)?;

    debug!(rows = scores.len(), path = %output_path.display(), "wrote score CSV");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_test_csv() -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "customer_id,customer_name,transaction_date,transaction_amount").unwrap();
        writeln!(file, "C001,Ada Lovelace,2024-01-01,100.50").unwrap();
        writeln!(file, "C001,Ada Lovelace,2024-02-01T10:15:00Z,200").unwrap();
        writeln!(file, "C002,,2024/06/01,not-a-number").unwrap();
        file
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_load_transactions() {
        let test_file = create_test_csv();
        let file_path = test_file.path().to_str().unwrap();

        let transactions = load_transactions(file_path).unwrap();
        assert_eq!(transactions.len(), 3);

        assert_eq!(transactions[0].customer_id, "C001");
        assert_eq!(transactions[0].customer_name.as_deref(), Some("Ada Lovelace"));
        assert_eq!(transactions[0].transaction_amount, 100.50);
        assert_eq!(transactions[1].transaction_date, date(2024, 2, 1));

        assert_eq!(transactions[2].customer_name, None);
        assert_eq!(transactions[2].transaction_date, date(2024, 6, 1));
        assert_eq!(transactions[2].transaction_amount, 0.0);
    }

    #[test]
    fn test_missing_column() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "customer_id,transaction_date").unwrap();
        writeln!(file, "C001,2024-01-01").unwrap();

        let err = load_transactions(file.path().to_str().unwrap()).unwrap_err();
        assert_eq!(
            err.downcast_ref::<RfmError>(),
            Some(&RfmError::MissingColumn("transaction_amount".to_string()))
        );
    }

    #[test]
    fn test_invalid_date_reports_row() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "customer_id,transaction_date,transaction_amount").unwrap();
        writeln!(file, "C001,2024-01-01,10").unwrap();
        writeln!(file, "C002,yesterday,10").unwrap();

        let err = load_transactions(file.path().to_str().unwrap()).unwrap_err();
        assert_eq!(
            err.downcast_ref::<RfmError>(),
            Some(&RfmError::InvalidDate {
                row: 2,
                value: "yesterday".to_string()
            })
        );
    }

    #[test]
    fn test_empty_customer_id_reports_row() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "customer_id,transaction_date,transaction_amount").unwrap();
        writeln!(file, "C001,2024-01-01,10").unwrap();
        writeln!(file, "C002,2024-01-02,10").unwrap();
        writeln!(file, ",2024-01-03,10").unwrap();

        let err = load_transactions(file.path().to_str().unwrap()).unwrap_err();
        assert_eq!(
            err.downcast_ref::<RfmError>(),
            Some(&RfmError::MissingCustomerId { row: 3 })
        );
    }

    #[test]
    fn test_parse_amount_is_lenient() {
        assert_eq!(parse_amount(" 42.5 "), 42.5);
        assert_eq!(parse_amount("abc"), 0.0);
        assert_eq!(parse_amount(""), 0.0);
        assert_eq!(parse_amount("NaN"), 0.0);
        assert_eq!(parse_amount("inf"), 0.0);
        assert_eq!(parse_amount("-50"), 0.0);
        assert_eq!(parse_amount("0"), 0.0);
    }

    #[test]
    fn test_try_parse_amount_flags_malformed() {
        assert_eq!(try_parse_amount("12.25"), Some(12.25));
        assert_eq!(try_parse_amount("0"), Some(0.0));
        assert_eq!(try_parse_amount("n/a"), None);
        assert_eq!(try_parse_amount("NaN"), None);
        assert_eq!(try_parse_amount("-50"), None);
    }

    #[test]
    fn test_negative_amounts_count_as_zero() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "customer_id,transaction_date,transaction_amount").unwrap();
        writeln!(file, "A,2024-01-01,-50").unwrap();
        writeln!(file, "A,2024-01-02,20").unwrap();

        let transactions = load_transactions(file.path().to_str().unwrap()).unwrap();
        let amounts: Vec<f64> = transactions.iter().map(|t| t.transaction_amount).collect();
        assert_eq!(amounts, vec![0.0, 20.0]);
    }

    #[test]
    fn test_parse_date_formats() {
        assert_eq!(parse_date("2024-03-05"), Some(date(2024, 3, 5)));
        assert_eq!(parse_date("2024/03/05"), Some(date(2024, 3, 5)));
        assert_eq!(parse_date("2024-03-05T23:59:00Z"), Some(date(2024, 3, 5)));
        assert_eq!(parse_date("2024-03-05 08:00:00"), Some(date(2024, 3, 5)));
        assert_eq!(parse_date("05.03.2024"), None);
    }

    #[test]
    fn test_parse_reference_time() {
        let now = parse_reference_time("2024-06-02").unwrap();
        assert_eq!(now.to_rfc3339(), "2024-06-02T00:00:00+00:00");

        let now = parse_reference_time("2024-06-02T12:30:00+02:00").unwrap();
        assert_eq!(now.to_rfc3339(), "2024-06-02T10:30:00+00:00");

        assert!(parse_reference_time("soon").is_err());
    }
}
