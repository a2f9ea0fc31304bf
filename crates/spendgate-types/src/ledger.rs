use crate::provider::{ProviderChain, ProviderDescriptor};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// One recorded turn of spend. Append-only within a day.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub provider: String,
    /// Provider-prefixed model id, e.g. `anthropic/claude-sonnet-4-20250514`.
    pub model: String,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub cost_usd: f64,
    /// ISO-8601 timestamp.
    pub timestamp: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderSpend {
    pub spent_usd: f64,
    pub exhausted: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwitchRecord {
    pub from: String,
    pub to: String,
    pub at: String,
    pub reason: String,
}

/// Daily ledger document, persisted as `chain-budget.json`.
///
/// Invariant: for each provider p, `providers[p].spent_usd` equals the sum
/// of `transactions` recorded against p that day.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerDoc {
    /// YYYY-MM-DD, UTC.
    pub date: String,
    #[serde(default)]
    pub providers: BTreeMap<String, ProviderSpend>,
    #[serde(default)]
    pub transactions: Vec<Transaction>,
    pub active_provider: String,
    #[serde(default)]
    pub switch_history: Vec<SwitchRecord>,
}

impl LedgerDoc {
    pub fn fresh(date: impl Into<String>, active_provider: impl Into<String>) -> Self {
        Self {
            date: date.into(),
            providers: BTreeMap::new(),
            transactions: Vec::new(),
            active_provider: active_provider.into(),
            switch_history: Vec::new(),
        }
    }

    /// Record one turn of spend against a provider and refresh its
    /// exhaustion flag. Free providers (cap 0) never flip to exhausted.
    pub fn record_transaction(&mut self, descriptor: &ProviderDescriptor, tx: Transaction) {
        let row = self.providers.entry(tx.provider.clone()).or_default();
        row.spent_usd += tx.cost_usd;
        if !descriptor.is_free() && row.spent_usd >= descriptor.max_daily_usd {
            row.exhausted = true;
        }
        self.transactions.push(tx);
    }

    pub fn record_switch(&mut self, record: SwitchRecord) {
        self.active_provider = record.to.clone();
        self.switch_history.push(record);
    }

    pub fn spent(&self, provider_id: &str) -> f64 {
        self.providers
            .get(provider_id)
            .map(|row| row.spent_usd)
            .unwrap_or(0.0)
    }

    /// Remaining budget, clamped to zero. A free provider always reports
    /// zero remaining while staying available.
    pub fn remaining(&self, descriptor: &ProviderDescriptor) -> f64 {
        (descriptor.max_daily_usd - self.spent(&descriptor.id)).max(0.0)
    }

    /// Spending the cap exactly counts as exhausted for metered providers.
    pub fn is_exhausted(&self, descriptor: &ProviderDescriptor) -> bool {
        if descriptor.is_free() {
            return false;
        }
        match self.providers.get(&descriptor.id) {
            Some(row) => row.exhausted || row.spent_usd >= descriptor.max_daily_usd,
            None => false,
        }
    }

    /// Ids of all exhausted providers declared in the chain.
    pub fn exhausted_set(&self, chain: &ProviderChain) -> HashSet<String> {
        chain
            .providers
            .iter()
            .filter(|p| self.is_exhausted(p))
            .map(|p| p.id.clone())
            .collect()
    }

    pub fn total_spent(&self) -> f64 {
        self.providers.values().map(|row| row.spent_usd).sum()
    }

    /// Timestamp of the most recent transaction, used as the `since` cutoff
    /// for the next turn's aggregation.
    pub fn last_transaction_timestamp(&self) -> Option<&str> {
        self.transactions.last().map(|tx| tx.timestamp.as_str())
    }
}
