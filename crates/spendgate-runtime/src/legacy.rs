use crate::store;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use spendgate_engine::{check_budget, BudgetCheck};
use spendgate_types::{utc_today, TaskModels, Transaction};
use std::path::PathBuf;
use tracing::info;

/// Single-budget document for legacy mode (`USE_CHAIN_MODE=false`),
/// persisted as `budget.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyBudgetDoc {
    /// YYYY-MM-DD, UTC.
    pub date: String,
    pub spent_usd: f64,
    #[serde(default)]
    pub transactions: Vec<Transaction>,
}

impl LegacyBudgetDoc {
    fn fresh(date: impl Into<String>) -> Self {
        Self {
            date: date.into(),
            spent_usd: 0.0,
            transactions: Vec::new(),
        }
    }
}

/// Legacy mode: one daily budget for the whole host, local fallback when
/// it runs out. Owner of `budget.json`.
#[derive(Debug, Clone)]
pub struct LegacyBudget {
    path: PathBuf,
    daily_budget_usd: f64,
}

impl LegacyBudget {
    pub fn new(path: impl Into<PathBuf>, daily_budget_usd: f64) -> Self {
        Self {
            path: path.into(),
            daily_budget_usd,
        }
    }

    pub fn load(&self) -> Result<LegacyBudgetDoc> {
        Ok(self.load_with_status()?.0)
    }

    pub fn load_with_status(&self) -> Result<(LegacyBudgetDoc, bool)> {
        let today = utc_today();
        match store::read_json::<LegacyBudgetDoc>(&self.path) {
            Some(doc) if doc.date == today => Ok((doc, false)),
            Some(stale) => {
                info!(stale_date = %stale.date, spent = stale.spent_usd, "budget rolled over to a new day");
                let fresh = LegacyBudgetDoc::fresh(today);
                store::write_json(&self.path, &fresh)?;
                Ok((fresh, true))
            }
            None => {
                let fresh = LegacyBudgetDoc::fresh(today);
                store::write_json(&self.path, &fresh)?;
                Ok((fresh, false))
            }
        }
    }

    pub fn record_usage(&self, tx: Transaction) -> Result<LegacyBudgetDoc> {
        let mut doc = self.load()?;
        doc.spent_usd += tx.cost_usd;
        doc.transactions.push(tx);
        store::write_json(&self.path, &doc)?;
        Ok(doc)
    }

    pub fn spent(&self) -> Result<f64> {
        Ok(self.load()?.spent_usd)
    }

    pub fn remaining(&self) -> Result<f64> {
        Ok(self.daily_budget_usd - self.spent()?)
    }

    pub fn is_healthy(&self) -> Result<bool> {
        Ok(self.spent()? < self.daily_budget_usd)
    }

    pub fn last_transaction_timestamp(&self) -> Result<Option<String>> {
        Ok(self
            .load()?
            .transactions
            .last()
            .map(|tx| tx.timestamp.clone()))
    }

    /// The legacy decision: allow, or force the task-appropriate local
    /// model once the day's budget is gone.
    pub fn check(
        &self,
        local_models: &TaskModels,
        prompt: &str,
        messages: &[Value],
    ) -> Result<BudgetCheck> {
        Ok(check_budget(
            self.spent()?,
            self.daily_budget_usd,
            local_models,
            prompt,
            messages,
        ))
    }
}
