use crate::store;
use anyhow::Result;
use spendgate_types::{now_iso, utc_today, FailureDoc};
use std::path::PathBuf;

/// Owner of `failure-tracker.json`: per-provider consecutive-failure
/// counters with daily reset.
#[derive(Debug, Clone)]
pub struct FailureTracker {
    path: PathBuf,
}

impl FailureTracker {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn load(&self) -> FailureDoc {
        let today = utc_today();
        match store::read_json::<FailureDoc>(&self.path) {
            Some(doc) if doc.date == today => doc,
            _ => FailureDoc::fresh(today),
        }
    }

    /// Increment and persist. Returns the new consecutive count.
    pub fn record_failure(&self, provider_id: &str) -> Result<u32> {
        let mut doc = self.load();
        let count = doc.record_failure(provider_id, now_iso());
        store::write_json(&self.path, &doc)?;
        Ok(count)
    }

    pub fn record_success(&self, provider_id: &str) -> Result<()> {
        let mut doc = self.load();
        doc.record_success(provider_id);
        store::write_json(&self.path, &doc)
    }

    pub fn count(&self, provider_id: &str) -> u32 {
        self.load().count(provider_id)
    }

    pub fn should_switch(&self, provider_id: &str, threshold: u32) -> bool {
        self.load().should_switch(provider_id, threshold)
    }
}
