//! Hook adapters binding the router to the host's two events.
//!
//! `before_agent_start` may inject a system preface; `agent_end` records
//! usage, tracks failures, and performs any decided switch. Both handlers
//! swallow every internal error: the host must never see an exception
//! from this plugin, only an absent injection.

use crate::host_config::HostConfigPatcher;
use crate::ledger::BudgetLedger;
use crate::legacy::LegacyBudget;
use crate::registry::ProviderRegistry;
use crate::session_log::SessionTruncator;
use crate::settings::Settings;
use crate::status::chain_status;
use crate::switcher::ModelSwitcher;
use crate::tracker::FailureTracker;
use anyhow::Result;
use serde_json::Value;
use spendgate_engine::{
    aggregate_turn_usage, build_injection, classify_task, classify_turn, decide, resolve_cost,
    BudgetAction, Decision, TurnOutcome,
};
use spendgate_types::{now_iso, parse_iso, SwitchRecord, Transaction};
use tracing::{error, info, warn};

/// Subscription priority for both hooks; low enough that user plugins
/// observing the raw prompt run first.
pub const HOOK_PRIORITY: i32 = 50;

pub const PRE_TURN_HOOK: &str = "before_agent_start";
pub const POST_TURN_HOOK: &str = "agent_end";

/// Event payload shared by both hooks.
#[derive(Debug, Clone, Default)]
pub struct HookEvent {
    pub prompt: String,
    pub messages: Vec<Value>,
    pub model: Option<String>,
    /// Set by the host when the turn died inside the host itself.
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct HookOutput {
    /// System preface for the host to prepend, when there is one.
    pub prepend_context: Option<String>,
}

/// The plugin. One instance per host session; all state lives in files,
/// so handlers rebuild their view of the world on every invocation.
pub struct BudgetRouter {
    settings: Settings,
}

impl BudgetRouter {
    /// Entry point called once at plugin load: resolve settings, run the
    /// startup pass (chain bootstrap, restore-on-new-day), and hand back
    /// the handler object. Startup failures are logged, never raised.
    pub fn register() -> Self {
        let router = Self::with_settings(Settings::load());
        if let Err(err) = router.startup() {
            error!(%err, "startup pass failed, continuing without interference");
        }
        router
    }

    pub fn with_settings(settings: Settings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    fn patcher(&self) -> HostConfigPatcher {
        HostConfigPatcher::new(&self.settings.host_config_path)
    }

    fn switcher(&self) -> ModelSwitcher {
        ModelSwitcher::new(
            self.settings.switcher_path(),
            self.patcher(),
            self.settings.restart_command.clone(),
            &self.settings.ollama_url,
        )
    }

    fn registry(&self) -> Result<ProviderRegistry> {
        ProviderRegistry::load(self.settings.chain_path())
    }

    fn ledger(&self, registry: &ProviderRegistry) -> BudgetLedger {
        let first = registry
            .chain()
            .first_enabled()
            .map(|p| p.id.clone())
            .unwrap_or_default();
        BudgetLedger::new(self.settings.ledger_path(), first)
    }

    fn tracker(&self) -> FailureTracker {
        FailureTracker::new(self.settings.failure_path())
    }

    fn legacy(&self) -> LegacyBudget {
        LegacyBudget::new(
            self.settings.legacy_budget_path(),
            self.settings.daily_budget_usd,
        )
    }

    fn truncator(&self) -> SessionTruncator {
        SessionTruncator::new(
            &self.settings.sessions_dir,
            &self.settings.session_key,
            self.settings.context_max_tokens,
            self.settings.context_keep_recent,
            self.settings.restart_command.clone(),
        )
    }

    /// Plugin-load pass: make sure the chain file exists, bootstrap the
    /// host config once, and restore the original model if we are sitting
    /// on the local fallback with a healthy budget (a new day).
    pub fn startup(&self) -> Result<()> {
        let budget_healthy = if self.settings.chain_mode {
            let registry = self.registry()?;
            let (doc, was_reset) = self.ledger(&registry).load_with_status()?;
            if was_reset {
                info!("new day detected at load");
            }
            let first = registry.chain().first_enabled();
            if let Some(premium) = first {
                if let Err(err) = self.patcher().bootstrap(&premium.models.default) {
                    warn!(%err, "host config bootstrap skipped");
                }
            }
            first.map(|p| !doc.is_exhausted(p)).unwrap_or(false)
        } else {
            self.legacy().is_healthy()?
        };

        self.switcher().maybe_restore_cloud(budget_healthy)?;
        Ok(())
    }

    /// `before_agent_start`: advisory only. Never errors toward the host.
    pub fn on_before_agent_start(&self, event: &HookEvent) -> HookOutput {
        match self.pre_turn(event) {
            Ok(prepend_context) => HookOutput { prepend_context },
            Err(err) => {
                error!(%err, "pre-turn handler failed, injecting nothing");
                HookOutput::default()
            }
        }
    }

    /// `agent_end`: tracking and switching. Never errors toward the host.
    pub fn on_agent_end(&self, event: &HookEvent) {
        if let Err(err) = self.post_turn(event) {
            error!(%err, "post-turn handler failed");
        }
    }

    fn pre_turn(&self, event: &HookEvent) -> Result<Option<String>> {
        if !self.settings.chain_mode {
            return self.pre_turn_legacy(event);
        }

        let registry = self.registry()?;
        let chain = registry.chain();
        let ledger_doc = self.ledger(&registry).load()?;
        let failure_doc = self.tracker().load();

        info!(status = %chain_status(chain, &ledger_doc), "pre-turn");

        let decision = decide(
            chain,
            &ledger_doc,
            &failure_doc,
            self.settings.failure_threshold,
            &event.prompt,
            &event.messages,
        );

        let (provider_id, model) = match &decision {
            Decision::Allow {
                provider, model, ..
            } => (provider.clone(), model.clone()),
            Decision::SwitchProvider { next, model, .. } => (next.clone(), model.clone()),
            Decision::AllExhausted => {
                warn!("every provider is exhausted, no injection");
                return Ok(None);
            }
        };

        let task = classify_task(&event.prompt, &event.messages);
        Ok(build_injection(
            chain,
            &provider_id,
            &model,
            task,
            self.settings.routing,
            self.settings.disable_prompt_optimization,
            &event.prompt,
            &event.messages,
        ))
    }

    fn pre_turn_legacy(&self, event: &HookEvent) -> Result<Option<String>> {
        let legacy = self.legacy();
        let check = legacy.check(&self.settings.local_models, &event.prompt, &event.messages)?;
        info!(
            remaining = check.remaining_usd,
            task = check.task.as_str(),
            forced = check.forced_model.as_deref().unwrap_or("-"),
            "pre-turn (legacy)"
        );
        // Legacy mode has no chain to phrase recommendations against; the
        // optimization preface still applies while money is being spent.
        if self.settings.disable_prompt_optimization || check.action == BudgetAction::ForceLocal {
            return Ok(None);
        }
        Ok(Some(
            "[COST OPTIMIZATION] Be concise. Avoid redundant tool calls and repeated file reads."
                .to_string(),
        ))
    }

    fn post_turn(&self, event: &HookEvent) -> Result<()> {
        if self.settings.chain_mode {
            self.post_turn_chain(event)?;
        } else {
            self.post_turn_legacy(event)?;
        }

        if self.settings.truncation_enabled {
            self.truncator().evaluate()?;
        }
        Ok(())
    }

    fn post_turn_chain(&self, event: &HookEvent) -> Result<()> {
        let registry = self.registry()?;
        let chain = registry.chain();
        let ledger = self.ledger(&registry);
        let tracker = self.tracker();

        let mut ledger_doc = ledger.load()?;
        let Some(active) = chain
            .get(&ledger_doc.active_provider)
            .or_else(|| chain.first_enabled())
        else {
            warn!("no enabled providers declared, nothing to track");
            return Ok(());
        };

        // Usage first: the switch decision below must see this turn's
        // spend.
        let since = ledger_doc
            .last_transaction_timestamp()
            .and_then(parse_iso);
        let fallback_model = event
            .model
            .clone()
            .unwrap_or_else(|| format!("{}/{}", active.id, active.models.default));
        let fallback_rate = resolve_cost(&fallback_model);
        if let Some(usage) =
            aggregate_turn_usage(&event.messages, &fallback_model, fallback_rate, since)
        {
            info!(
                model = %usage.model,
                input = usage.input_tokens,
                output = usage.output_tokens,
                cost = usage.cost,
                "recording turn usage"
            );
            ledger_doc = ledger.record_transaction(
                active,
                Transaction {
                    provider: active.id.clone(),
                    model: usage.model,
                    input_tokens: usage.input_tokens,
                    output_tokens: usage.output_tokens,
                    cost_usd: usage.cost,
                    timestamp: now_iso(),
                },
            )?;
        }

        let outcome = classify_turn(event.error.as_deref(), &event.messages);
        match &outcome {
            TurnOutcome::Failure(reason) => {
                let count = tracker.record_failure(&active.id)?;
                warn!(provider = %active.id, count, %reason, "turn failed");
            }
            TurnOutcome::Success => tracker.record_success(&active.id)?,
        }

        let failure_doc = tracker.load();
        let decision = decide(
            chain,
            &ledger_doc,
            &failure_doc,
            self.settings.failure_threshold,
            &event.prompt,
            &event.messages,
        );

        match decision {
            Decision::Allow { .. } => Ok(()),
            Decision::SwitchProvider {
                from,
                next,
                model,
                reason,
            } => {
                info!(from = from.as_deref().unwrap_or("-"), to = %next, %reason, "switching provider");
                if self.switcher().apply_switch(&next, &model)? {
                    ledger.record_switch(SwitchRecord {
                        from: from.unwrap_or_default(),
                        to: next,
                        at: now_iso(),
                        reason,
                    })?;
                }
                Ok(())
            }
            Decision::AllExhausted => {
                warn!("all providers exhausted, leaving host as-is");
                Ok(())
            }
        }
    }

    fn post_turn_legacy(&self, event: &HookEvent) -> Result<()> {
        let legacy = self.legacy();

        let since = legacy.last_transaction_timestamp()?.and_then(|s| parse_iso(&s));
        let fallback_model = event.model.clone().unwrap_or_else(|| "unknown".to_string());
        let fallback_rate = resolve_cost(&fallback_model);
        if let Some(usage) =
            aggregate_turn_usage(&event.messages, &fallback_model, fallback_rate, since)
        {
            info!(model = %usage.model, cost = usage.cost, "recording turn usage (legacy)");
            legacy.record_usage(Transaction {
                provider: "default".to_string(),
                model: usage.model,
                input_tokens: usage.input_tokens,
                output_tokens: usage.output_tokens,
                cost_usd: usage.cost,
                timestamp: now_iso(),
            })?;
        }

        if let TurnOutcome::Failure(reason) = classify_turn(event.error.as_deref(), &event.messages)
        {
            warn!(%reason, "turn failed");
        }

        let check = legacy.check(&self.settings.local_models, &event.prompt, &event.messages)?;
        if check.action == BudgetAction::ForceLocal {
            let model = check
                .forced_model
                .unwrap_or_else(|| self.settings.local_models.default.clone());
            info!(remaining = check.remaining_usd, %model, "budget exhausted, forcing local model");
            self.switcher().switch_to_local(&model)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hook_names() {
        assert_eq!(PRE_TURN_HOOK, "before_agent_start");
        assert_eq!(POST_TURN_HOOK, "agent_end");
    }

    #[test]
    fn test_handlers_swallow_internal_errors() {
        // Point everything at an unwritable location; handlers must not
        // panic or propagate.
        let mut settings = Settings::from_env();
        settings.chain_mode = true;
        settings.data_dir = std::path::PathBuf::from("/dev/null/nope");
        settings.sessions_dir = std::path::PathBuf::from("/dev/null/nope");
        let router = BudgetRouter::with_settings(settings);

        let event = HookEvent {
            prompt: "hello".to_string(),
            ..Default::default()
        };
        let out = router.on_before_agent_start(&event);
        assert!(out.prepend_context.is_none());
        router.on_agent_end(&event);
    }
}
