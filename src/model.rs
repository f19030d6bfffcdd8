//! RFM scoring model: per-customer aggregation, quartile scores and segments

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

use crate::data::Transaction;
use crate::error::RfmError;
use crate::segment::{classify, Segment};

const SECONDS_PER_DAY: i64 = 86_400;

/// Running totals for one customer
#[derive(Debug, Clone, PartialEq)]
pub struct CustomerAggregate {
    pub customer_id: String,
    /// First non-empty display name seen for the customer
    pub customer_name: Option<String>,
    pub transaction_count: usize,
    pub total_spend: f64,
    pub last_transaction_date: NaiveDate,
}

/// Scored customer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RfmScore {
    pub customer_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
    /// Whole days between the last transaction and the reference time
    pub recency_days: i64,
    pub recency_score: u8,
    pub frequency_score: u8,
    pub monetary_score: u8,
    pub total_transactions: usize,
    pub total_spend: f64,
    pub avg_spend: f64,
    pub last_transaction_date: NaiveDate,
    pub segment_name: Segment,
}

impl RfmScore {
    /// Concatenated R/F/M digits, e.g. "431"
    pub fn rfm_code(&self) -> String {
        format!(
            "{}{}{}",
            self.recency_score, self.frequency_score, self.monetary_score
        )
    }
}

/// Group transactions by customer in a single pass.
///
/// Aggregates come back in the order each customer id was first seen.
pub fn aggregate_transactions(transactions: &[Transaction]) -> Vec<CustomerAggregate> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut aggregates: Vec<CustomerAggregate> = Vec::new();

    for tx in transactions {
        match index.get(tx.customer_id.as_str()) {
            Some(&slot) => {
                let agg = &mut aggregates[slot];
                agg.transaction_count += 1;
                agg.total_spend += tx.transaction_amount;
                agg.last_transaction_date = agg.last_transaction_date.max(tx.transaction_date);
                if agg.customer_name.is_none() {
                    agg.customer_name = tx.customer_name.clone();
                }
            }
            None => {
                index.insert(tx.customer_id.as_str(), aggregates.len());
                aggregates.push(CustomerAggregate {
                    customer_id: tx.customer_id.clone(),
                    customer_name: tx.customer_name.clone(),
                    transaction_count: 1,
                    total_spend: tx.transaction_amount,
                    last_transaction_date: tx.transaction_date,
                });
            }
        }
    }

    aggregates
}

/// Whole days from the start of `last_date` (UTC) to `now`, floored
pub fn recency_days(now: DateTime<Utc>, last_date: NaiveDate) -> i64 {
    let start_of_day = last_date.and_time(NaiveTime::MIN).and_utc();
    (now - start_of_day).num_seconds().div_euclid(SECONDS_PER_DAY)
}

/// Quartile (1-4) of `value` within the ascending `sorted` cohort.
///
/// Rank is the first index holding an equal value, so tied customers all
/// share the percentile of the first occurrence.
pub fn quartile_score(sorted: &[f64], value: f64) -> u8 {
    if sorted.is_empty() {
        return 1;
    }

    let index = sorted.iter().position(|&v| v == value).unwrap_or(0);
    let percentile = index as f64 / sorted.len() as f64;

    if percentile <= 0.25 {
        1
    } else if percentile <= 0.50 {
        2
    } else if percentile <= 0.75 {
        3
    } else {
        4
    }
}

fn sorted_ascending(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    sorted
}

/// Compute RFM scores for every customer in `transactions`
///
/// # Arguments
/// * `transactions` - Full transaction history (existing and new)
/// * `now` - Reference time for recency
///
/// # Returns
/// * One `RfmScore` per distinct customer id, in first-seen order
pub fn compute_rfm_scores(
    transactions: &[Transaction],
    now: DateTime<Utc>,
) -> Result<Vec<RfmScore>, RfmError> {
    if transactions.is_empty() {
        return Err(RfmError::EmptyInput);
    }

    let aggregates = aggregate_transactions(transactions);

    let recency: Vec<f64> = aggregates
        .iter()
        .map(|agg| recency_days(now, agg.last_transaction_date) as f64)
        .collect();
    let frequency: Vec<f64> = aggregates
        .iter()
        .map(|agg| agg.transaction_count as f64)
        .collect();
    let monetary: Vec<f64> = aggregates.iter().map(|agg| agg.total_spend).collect();

    let sorted_recency = sorted_ascending(&recency);
    let sorted_frequency = sorted_ascending(&frequency);
    let sorted_monetary = sorted_ascending(&monetary);

    let scores: Vec<RfmScore> = aggregates
        .into_iter()
        .enumerate()
        .map(|(i, agg)| {
            // Fewer days since the last purchase is better
            let recency_score = 5 - quartile_score(&sorted_recency, recency[i]);
            let frequency_score = quartile_score(&sorted_frequency, frequency[i]);
            let monetary_score = quartile_score(&sorted_monetary, monetary[i]);

            RfmScore {
                recency_days: recency[i] as i64,
                recency_score,
                frequency_score,
                monetary_score,
                total_transactions: agg.transaction_count,
                avg_spend: agg.total_spend / agg.transaction_count as f64,
                total_spend: agg.total_spend,
                last_transaction_date: agg.last_transaction_date,
                segment_name: classify(recency_score, frequency_score, monetary_score),
                customer_id: agg.customer_id,
                customer_name: agg.customer_name,
            }
        })
        .collect();

    debug!(
        transactions = transactions.len(),
        customers = scores.len(),
        "computed RFM scores"
    );

    Ok(scores)
}
