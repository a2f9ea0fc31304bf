use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailureEntry {
    pub consecutive_failures: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_failure_at: Option<String>,
}

/// Daily per-provider consecutive-failure counters, persisted as
/// `failure-tracker.json`. A recorded success resets the counter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailureDoc {
    /// YYYY-MM-DD, UTC.
    pub date: String,
    #[serde(default)]
    pub providers: BTreeMap<String, FailureEntry>,
}

impl FailureDoc {
    pub fn fresh(date: impl Into<String>) -> Self {
        Self {
            date: date.into(),
            providers: BTreeMap::new(),
        }
    }

    /// Increment and return the provider's consecutive-failure count.
    pub fn record_failure(&mut self, provider_id: &str, at: impl Into<String>) -> u32 {
        let entry = self.providers.entry(provider_id.to_string()).or_default();
        entry.consecutive_failures += 1;
        entry.last_failure_at = Some(at.into());
        entry.consecutive_failures
    }

    pub fn record_success(&mut self, provider_id: &str) {
        if let Some(entry) = self.providers.get_mut(provider_id) {
            entry.consecutive_failures = 0;
        }
    }

    pub fn count(&self, provider_id: &str) -> u32 {
        self.providers
            .get(provider_id)
            .map(|e| e.consecutive_failures)
            .unwrap_or(0)
    }

    pub fn should_switch(&self, provider_id: &str, threshold: u32) -> bool {
        self.count(provider_id) >= threshold
    }
}
