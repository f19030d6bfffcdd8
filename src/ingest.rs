//! Upload workflow: merge an upload into stored history and rescore

use chrono::{DateTime, Utc};
use tracing::info;

use crate::data::Transaction;
use crate::error::RfmError;
use crate::model::{compute_rfm_scores, RfmScore};
use crate::store::TransactionStore;

/// Outcome of a single upload
#[derive(Debug, Clone)]
pub struct IngestReport {
    pub owner: String,
    pub transactions_added: usize,
    /// History plus upload
    pub total_transactions: usize,
    pub scores: Vec<RfmScore>,
}

/// Score `upload` together with everything already stored for `owner`,
/// then persist the upload and replace the owner's scores in one commit.
///
/// Nothing is written if scoring or the commit fails.
pub fn ingest_upload<S>(
    store: &mut S,
    owner: &str,
    upload: Vec<Transaction>,
    now: DateTime<Utc>,
) -> crate::Result<IngestReport>
where
    S: TransactionStore + ?Sized,
{
    if upload.is_empty() {
        return Err(RfmError::EmptyInput.into());
    }

    let mut history = store.load_transactions(owner)?;
    let previous = history.len();
    history.extend(upload.iter().cloned());

    let scores = compute_rfm_scores(&history, now)?;

    store.commit_upload(owner, &upload, &scores)?;

    info!(
        owner,
        previous,
        added = upload.len(),
        customers = scores.len(),
        "upload scored"
    );

    Ok(IngestReport {
        owner: owner.to_string(),
        transactions_added: upload.len(),
        total_transactions: history.len(),
        scores,
    })
}
