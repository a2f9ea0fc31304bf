use crate::classify::classify_task;
use serde_json::Value;
use spendgate_types::{FailureDoc, LedgerDoc, ProviderChain, TaskKind, TaskModels};

/// What the router wants the host to do for the next turn.
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    /// Keep the active provider.
    Allow {
        provider: String,
        model: String,
        remaining_usd: f64,
        percent_used: f64,
    },
    /// Move to the next provider in the chain.
    SwitchProvider {
        from: Option<String>,
        next: String,
        model: String,
        reason: String,
    },
    /// Every metered provider is exhausted and no free fallback exists.
    AllExhausted,
}

fn percent_used(spent: f64, max: f64) -> f64 {
    if max <= 0.0 {
        // A free provider is always fully available.
        return 0.0;
    }
    (spent / max * 100.0).min(100.0)
}

/// Combine ledger, chain and failure counters into one decision for the
/// coming turn. Pure: all state is read from the snapshots passed in.
pub fn decide(
    chain: &ProviderChain,
    ledger: &LedgerDoc,
    failures: &FailureDoc,
    threshold: u32,
    prompt: &str,
    messages: &[Value],
) -> Decision {
    let task = classify_task(prompt, messages);
    let exhausted = ledger.exhausted_set(chain);

    let active = chain.get(&ledger.active_provider);
    let Some(provider) = active.filter(|p| p.enabled) else {
        return match chain.first_available(&exhausted) {
            Some(next) => Decision::SwitchProvider {
                from: Some(ledger.active_provider.clone()),
                next: next.id.clone(),
                model: next.model_for_task(task).to_string(),
                reason: "active provider disabled or missing".to_string(),
            },
            None => Decision::AllExhausted,
        };
    };

    let budget_out = ledger.is_exhausted(provider);
    let failing = failures.should_switch(&provider.id, threshold);
    if budget_out || failing {
        let Some(next) = chain.next_after(&provider.id, &exhausted) else {
            return Decision::AllExhausted;
        };
        let reason = if budget_out {
            format!(
                "daily budget exhausted ({:.2}/{:.2} USD)",
                ledger.spent(&provider.id),
                provider.max_daily_usd
            )
        } else {
            format!(
                "{} consecutive failures (threshold {})",
                failures.count(&provider.id),
                threshold
            )
        };
        return Decision::SwitchProvider {
            from: Some(provider.id.clone()),
            next: next.id.clone(),
            model: next.model_for_task(task).to_string(),
            reason,
        };
    }

    Decision::Allow {
        provider: provider.id.clone(),
        model: provider.model_for_task(task).to_string(),
        remaining_usd: ledger.remaining(provider),
        percent_used: percent_used(ledger.spent(&provider.id), provider.max_daily_usd),
    }
}

/// Legacy single-budget verdict (`USE_CHAIN_MODE=false`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BudgetAction {
    Allow,
    ForceLocal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BudgetCheck {
    pub action: BudgetAction,
    pub task: TaskKind,
    /// Task-appropriate local model, set when the action is `ForceLocal`.
    pub forced_model: Option<String>,
    /// Unclamped, so callers can log how far over budget the day went.
    pub remaining_usd: f64,
}

/// Legacy mode: one daily budget, one decision. Over budget means the
/// local fallback model for whatever task the prompt looks like.
pub fn check_budget(
    spent_usd: f64,
    daily_budget_usd: f64,
    local_models: &TaskModels,
    prompt: &str,
    messages: &[Value],
) -> BudgetCheck {
    let task = classify_task(prompt, messages);
    let remaining_usd = daily_budget_usd - spent_usd;

    if spent_usd >= daily_budget_usd {
        return BudgetCheck {
            action: BudgetAction::ForceLocal,
            task,
            forced_model: Some(local_models.for_task(task).to_string()),
            remaining_usd,
        };
    }

    BudgetCheck {
        action: BudgetAction::Allow,
        task,
        forced_model: None,
        remaining_usd,
    }
}
