//! Per-owner transaction history and score persistence

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::data::Transaction;
use crate::model::RfmScore;

/// Storage for transactions and their latest scores, isolated per owner
pub trait TransactionStore {
    /// All stored transactions for `owner`, in insertion order
    fn load_transactions(&self, owner: &str) -> crate::Result<Vec<Transaction>>;

    fn load_scores(&self, owner: &str) -> crate::Result<Vec<RfmScore>>;

    /// Append `transactions` to the owner's history and replace every stored
    /// score for `owner`, as one unit. On error the store is unchanged.
    fn commit_upload(
        &mut self,
        owner: &str,
        transactions: &[Transaction],
        scores: &[RfmScore],
    ) -> crate::Result<()>;
}

/// In-process store
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryStore {
    #[serde(default)]
    transactions: BTreeMap<String, Vec<Transaction>>,
    #[serde(default)]
    scores: BTreeMap<String, Vec<RfmScore>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Owners with any stored transactions
    pub fn owners(&self) -> impl Iterator<Item = &str> {
        self.transactions.keys().map(String::as_str)
    }

    fn apply_upload(&mut self, owner: &str, transactions: &[Transaction], scores: &[RfmScore]) {
        self.transactions
            .entry(owner.to_string())
            .or_default()
            .extend_from_slice(transactions);
        self.scores.insert(owner.to_string(), scores.to_vec());
    }
}

impl TransactionStore for MemoryStore {
    fn load_transactions(&self, owner: &str) -> crate::Result<Vec<Transaction>> {
        Ok(self.transactions.get(owner).cloned().unwrap_or_default())
    }

    fn load_scores(&self, owner: &str) -> crate::Result<Vec<RfmScore>> {
        Ok(self.scores.get(owner).cloned().unwrap_or_default())
    }

    fn commit_upload(
        &mut self,
        owner: &str,
        transactions: &[Transaction],
        scores: &[RfmScore],
    ) -> crate::Result<()> {
        self.apply_upload(owner, transactions, scores);
        Ok(())
    }
}

/// JSON file store. Every commit rewrites the file once.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    state: MemoryStore,
}

impl JsonFileStore {
    /// Open the store at `path`, starting empty if the file does not exist
    pub fn open(path: impl AsRef<Path>) -> crate::Result<Self> {
        let path = path.as_ref().to_path_buf();

        let state = if path.exists() {
            let raw = fs::read_to_string(&path)
                .with_context(|| format!("failed to read store {}", path.display()))?;
            serde_json::from_str(&raw)
                .with_context(|| format!("corrupt store file {}", path.display()))?
        } else {
            MemoryStore::default()
        };

        debug!(path = %path.display(), "opened JSON store");
        Ok(Self { path, state })
    }

    fn persist(&self, state: &MemoryStore) -> crate::Result<()> {
        let json = serde_json::to_string_pretty(state)?;

        // Write beside the target then rename so a crash never truncates it
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).with_context(|| format!("failed to write {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("failed to replace {}", self.path.display()))?;
        Ok(())
    }
}

impl TransactionStore for JsonFileStore {
    fn load_transactions(&self, owner: &str) -> crate::Result<Vec<Transaction>> {
        self.state.load_transactions(owner)
    }

    fn load_scores(&self, owner: &str) -> crate::Result<Vec<RfmScore>> {
        self.state.load_scores(owner)
    }

    fn commit_upload(
        &mut self,
        owner: &str,
        transactions: &[Transaction],
        scores: &[RfmScore],
    ) -> crate::Result<()> {
        let mut next = self.state.clone();
        next.apply_upload(owner, transactions, scores);

        // Memory only moves forward once the file holds the new state
        self.persist(&next)?;
        self.state = next;
        Ok(())
    }
}
