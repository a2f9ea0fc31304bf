use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Task role a turn is classified into. Vision dominates coding when both
/// signals are present; everything else is general.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskKind {
    General,
    Coding,
    Vision,
}

impl TaskKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskKind::General => "general",
            TaskKind::Coding => "coding",
            TaskKind::Vision => "vision",
        }
    }
}

/// Per-task model slots. `default` is required in the chain declaration;
/// the optional slots fall back to it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskModels {
    pub default: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coding: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vision: Option<String>,
}

impl TaskModels {
    pub fn single(model: impl Into<String>) -> Self {
        Self {
            default: model.into(),
            coding: None,
            vision: None,
        }
    }

    pub fn for_task(&self, task: TaskKind) -> &str {
        match task {
            TaskKind::General => &self.default,
            TaskKind::Coding => self.coding.as_deref().unwrap_or(&self.default),
            TaskKind::Vision => self.vision.as_deref().unwrap_or(&self.default),
        }
    }
}

/// One provider in the chain. Immutable at runtime once environment
/// overrides have been applied.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderDescriptor {
    pub id: String,
    /// Lower priority is tried first.
    pub priority: i32,
    pub enabled: bool,
    /// Daily cap in USD. Zero means free: the provider never exhausts.
    pub max_daily_usd: f64,
    pub models: TaskModels,
}

impl ProviderDescriptor {
    pub fn is_free(&self) -> bool {
        self.max_daily_usd == 0.0
    }

    pub fn model_for_task(&self, task: TaskKind) -> &str {
        self.models.for_task(task)
    }
}

/// Ordered provider chain, as declared in `provider-chain.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderChain {
    pub providers: Vec<ProviderDescriptor>,
}

impl ProviderChain {
    /// Minimal built-in chain written on first run: one metered cloud
    /// provider followed by a free local fallback.
    pub fn builtin_default() -> Self {
        Self {
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
                    models: TaskModels {
                        default: "qwen3:8b".to_string(),
                        coding: Some("qwen3-coder:30b".to_string()),
                        vision: Some("qwen3-vl:8b".to_string()),
                    },
                },
            ],
        }
    }

    pub fn get(&self, id: &str) -> Option<&ProviderDescriptor> {
        self.providers.iter().find(|p| p.id == id)
    }

    /// Enabled providers ordered by priority ascending, id ascending on ties.
    pub fn enabled(&self) -> Vec<&ProviderDescriptor> {
        let mut out: Vec<&ProviderDescriptor> =
            self.providers.iter().filter(|p| p.enabled).collect();
        out.sort_by(|a, b| a.priority.cmp(&b.priority).then(a.id.cmp(&b.id)));
        out
    }

    /// First enabled provider after `current_id` (by priority) that is not
    /// exhausted. Free providers cannot be exhausted and are always
    /// candidates.
    pub fn next_after(
        &self,
        current_id: &str,
        exhausted: &HashSet<String>,
    ) -> Option<&ProviderDescriptor> {
        let current_priority = self.get(current_id)?.priority;
        self.enabled()
            .into_iter()
            .find(|p| {
                p.priority > current_priority && (p.is_free() || !exhausted.contains(&p.id))
            })
    }

    /// First enabled, non-exhausted provider in chain order.
    pub fn first_available(&self, exhausted: &HashSet<String>) -> Option<&ProviderDescriptor> {
        self.enabled()
            .into_iter()
            .find(|p| p.is_free() || !exhausted.contains(&p.id))
    }

    /// First enabled provider regardless of exhaustion. Used as the active
    /// provider of a fresh ledger.
    pub fn first_enabled(&self) -> Option<&ProviderDescriptor> {
        self.enabled().into_iter().next()
    }
}
