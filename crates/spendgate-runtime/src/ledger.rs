use crate::store;
use anyhow::Result;
use spendgate_types::{
    utc_today, LedgerDoc, ProviderDescriptor, SwitchRecord, Transaction,
};
use std::path::PathBuf;
use tracing::info;

/// Owner of `chain-budget.json`. Every operation is load-mutate-save;
/// day rollover is detected on load, before anything else reads the doc.
#[derive(Debug, Clone)]
pub struct BudgetLedger {
    path: PathBuf,
    /// Active provider for freshly created ledgers: the chain's first
    /// enabled provider.
    first_provider: String,
}

impl BudgetLedger {
    pub fn new(path: impl Into<PathBuf>, first_provider: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            first_provider: first_provider.into(),
        }
    }

    pub fn load(&self) -> Result<LedgerDoc> {
        Ok(self.load_with_status()?.0)
    }

    /// Load today's ledger. The boolean reports whether a previous day's
    /// document was just reset, the one signal that drives the
    /// restore-original-model path.
    pub fn load_with_status(&self) -> Result<(LedgerDoc, bool)> {
        let today = utc_today();
        match store::read_json::<LedgerDoc>(&self.path) {
            Some(doc) if doc.date == today => Ok((doc, false)),
            Some(stale) => {
                info!(
                    stale_date = %stale.date,
                    spent = stale.total_spent(),
                    "ledger rolled over to a new day"
                );
                let fresh = LedgerDoc::fresh(today, &self.first_provider);
                store::write_json(&self.path, &fresh)?;
                Ok((fresh, true))
            }
            None => {
                let fresh = LedgerDoc::fresh(today, &self.first_provider);
                store::write_json(&self.path, &fresh)?;
                Ok((fresh, false))
            }
        }
    }

    /// Append a transaction and persist. Returns the updated document.
    pub fn record_transaction(
        &self,
        descriptor: &ProviderDescriptor,
        tx: Transaction,
    ) -> Result<LedgerDoc> {
        let mut doc = self.load()?;
        doc.record_transaction(descriptor, tx);
        store::write_json(&self.path, &doc)?;
        Ok(doc)
    }

    pub fn set_active(&self, provider_id: &str) -> Result<()> {
        let mut doc = self.load()?;
        doc.active_provider = provider_id.to_string();
        store::write_json(&self.path, &doc)
    }

    pub fn record_switch(&self, record: SwitchRecord) -> Result<LedgerDoc> {
        let mut doc = self.load()?;
        doc.record_switch(record);
        store::write_json(&self.path, &doc)?;
        Ok(doc)
    }

    pub fn remaining(&self, descriptor: &ProviderDescriptor) -> Result<f64> {
        Ok(self.load()?.remaining(descriptor))
    }

    pub fn exhausted(&self, descriptor: &ProviderDescriptor) -> Result<bool> {
        Ok(self.load()?.is_exhausted(descriptor))
    }

    pub fn total_spent(&self) -> Result<f64> {
        Ok(self.load()?.total_spent())
    }

    pub fn last_transaction_timestamp(&self) -> Result<Option<String>> {
        Ok(self
            .load()?
            .last_transaction_timestamp()
            .map(str::to_string))
    }
}
