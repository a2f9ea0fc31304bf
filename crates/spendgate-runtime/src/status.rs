use serde::Serialize;
use spendgate_types::{LedgerDoc, ProviderChain};
use std::fmt;

/// One row of the hook-time status summary.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderStatus {
    pub id: String,
    pub spent_usd: f64,
    pub max_daily_usd: f64,
    pub remaining_usd: f64,
    pub exhausted: bool,
    pub active: bool,
}

/// Snapshot of the whole chain for logging and inspection.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainStatus {
    pub date: String,
    pub active_provider: String,
    pub total_spent_usd: f64,
    pub providers: Vec<ProviderStatus>,
}

pub fn chain_status(chain: &ProviderChain, ledger: &LedgerDoc) -> ChainStatus {
    let providers = chain
        .enabled()
        .into_iter()
        .map(|p| ProviderStatus {
            id: p.id.clone(),
            spent_usd: ledger.spent(&p.id),
            max_daily_usd: p.max_daily_usd,
            remaining_usd: ledger.remaining(p),
            exhausted: ledger.is_exhausted(p),
            active: p.id == ledger.active_provider,
        })
        .collect();

    ChainStatus {
        date: ledger.date.clone(),
        active_provider: ledger.active_provider.clone(),
        total_spent_usd: ledger.total_spent(),
        providers,
    }
}

impl fmt::Display for ChainStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} total ${:.2} active {}",
            self.date, self.total_spent_usd, self.active_provider
        )?;
        for p in &self.providers {
            let marker = if p.exhausted {
                "!"
            } else if p.active {
                "*"
            } else {
                " "
            };
            write!(
                f,
                " | {}{} ${:.2}/${:.2}",
                marker, p.id, p.spent_usd, p.max_daily_usd
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spendgate_types::{ProviderDescriptor, TaskModels, Transaction};

    fn chain() -> ProviderChain {
        ProviderChain {
            providers: vec![
                ProviderDescriptor {
                    id: "anthropic".to_string(),
                    priority: 1,
                    enabled: true,
                    max_daily_usd: 5.0,
                    models: TaskModels::single("claude-sonnet-4-20250514"),
                },
                ProviderDescriptor {
                    id: "ollama".to_string(),
                    priority: 100,
                    enabled: true,
                    max_daily_usd: 0.0,
                    models: TaskModels::single("qwen3:8b"),
                },
            ],
        }
    }

    #[test]
    fn test_status_rows() {
        let chain = chain();
        let mut ledger = LedgerDoc::fresh("2026-08-02", "anthropic");
        ledger.record_transaction(
            chain.get("anthropic").unwrap(),
            Transaction {
                provider: "anthropic".to_string(),
                model: "anthropic/claude-sonnet-4-20250514".to_string(),
                input_tokens: 1000,
                output_tokens: 1000,
                cost_usd: 1.5,
                timestamp: "2026-08-02T10:00:00Z".to_string(),
            },
        );

        let status = chain_status(&chain, &ledger);
        assert_eq!(status.total_spent_usd, 1.5);
        assert_eq!(status.providers.len(), 2);

        let anthropic = &status.providers[0];
        assert!(anthropic.active);
        assert!(!anthropic.exhausted);
        assert_eq!(anthropic.remaining_usd, 3.5);

        let line = status.to_string();
        assert!(line.contains("*anthropic"));
        assert!(line.contains("$1.50/$5.00"));
    }
}
