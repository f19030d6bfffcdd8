//! Command-line interface definitions and argument parsing

use chrono::{DateTime, Utc};
use clap::Parser;
use std::path::PathBuf;

use crate::data::parse_reference_time;

/// Score customers by recency, frequency and monetary value
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the transaction CSV to upload
    #[arg(short, long, default_value = "transactions.csv")]
    pub input: String,

    /// JSON file holding previously uploaded transactions and scores.
    /// Without it only the uploaded file is scored.
    #[arg(short, long, env = "RFM_STORE")]
    pub store: Option<PathBuf>,

    /// Owner scope the upload belongs to
    #[arg(long, env = "RFM_OWNER", default_value = "default")]
    pub owner: String,

    /// Reference time for recency (YYYY-MM-DD or RFC 3339); defaults to now
    #[arg(short, long)]
    pub now: Option<String>,

    /// Output path for the scores CSV
    #[arg(short, long, default_value = "rfm_scores.csv")]
    pub output: PathBuf,

    /// Output path for the segment bar chart (PNG)
    #[arg(short, long)]
    pub chart: Option<PathBuf>,

    /// Number of top customers to list
    #[arg(long, default_value = "10")]
    pub top: usize,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Resolve the recency reference time
    pub fn reference_time(&self) -> crate::Result<DateTime<Utc>> {
        match self.now.as_deref() {
            Some(raw) => Ok(parse_reference_time(raw)?),
            None => Ok(Utc::now()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["rfmforge"]).unwrap();
        assert_eq!(args.input, "transactions.csv");
        assert_eq!(args.output, PathBuf::from("rfm_scores.csv"));
        assert_eq!(args.top, 10);
        assert!(args.chart.is_none());
        assert!(!args.verbose);
    }

    #[test]
    fn test_reference_time() {
        let mut args =
            Args::try_parse_from(["rfmforge", "--now", "2024-06-02", "--owner", "shop-7"]).unwrap();
        assert_eq!(args.owner, "shop-7");
        assert_eq!(
            args.reference_time().unwrap().to_rfc3339(),
            "2024-06-02T00:00:00+00:00"
        );

        args.now = Some("invalid".to_string());
        assert!(args.reference_time().is_err());

        args.now = None;
        assert!(args.reference_time().is_ok());
    }
}
