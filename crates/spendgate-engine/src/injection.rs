use crate::classify::{classify_complexity, estimate_content_chars, Complexity};
use crate::cost::{is_local_model, resolve_cost};
use serde_json::Value;
use spendgate_types::{estimate_tokens, ProviderChain, TaskKind};
use tracing::warn;

/// Injection is dropped entirely past this estimated context size; adding
/// a preface to an already-bursting context helps nobody.
const MAX_INJECTABLE_CONTEXT_TOKENS: usize = 150_000;

/// Advisory routing mode (`AUTO_MODEL_ROUTING`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RoutingMode {
    Off,
    #[default]
    Advisory,
}

/// Rough price class of a model, derived from its input rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelTier {
    Premium,
    Standard,
    Economy,
}

pub fn model_tier(model_id: &str) -> ModelTier {
    if is_local_model(model_id) {
        return ModelTier::Economy;
    }
    let rate = resolve_cost(model_id);
    if rate.input_per_1k >= 0.002 {
        ModelTier::Premium
    } else if rate.input_per_1k > 0.0 {
        ModelTier::Standard
    } else {
        ModelTier::Economy
    }
}

const PREMIUM_PREFACE: &str = "[COST OPTIMIZATION] You are running on a metered premium model. \
Be concise: do not re-read files already in context, batch related edits, and avoid restating \
unchanged code. Prefer targeted diffs over full rewrites.";

const STANDARD_PREFACE: &str =
    "[COST OPTIMIZATION] Be concise. Avoid redundant tool calls and repeated file reads.";

fn recommendation(
    chain: &ProviderChain,
    task: TaskKind,
    complexity: Complexity,
    tier: ModelTier,
) -> Option<String> {
    let enabled = chain.enabled();
    match (complexity, tier) {
        (Complexity::Simple, ModelTier::Premium) => {
            let cheap = enabled.iter().rev().find(|p| {
                model_tier(p.model_for_task(task)) != ModelTier::Premium
            })?;
            Some(format!(
                "[MODEL RECOMMENDATION] This looks like a simple task; {} would handle it at a fraction of the cost.",
                cheap.model_for_task(task)
            ))
        }
        (Complexity::Complex, ModelTier::Economy) => {
            let premium = enabled.first()?;
            Some(format!(
                "[MODEL RECOMMENDATION] This looks like a complex task; consider {} for better results.",
                premium.model_for_task(task)
            ))
        }
        _ => None,
    }
}

/// Build the pre-turn context injection: an optimization preface plus an
/// optional advisory model recommendation. Returns `None` when there is
/// nothing worth injecting.
#[allow(clippy::too_many_arguments)]
pub fn build_injection(
    chain: &ProviderChain,
    active_provider: &str,
    active_model: &str,
    task: TaskKind,
    routing: RoutingMode,
    optimization_disabled: bool,
    prompt: &str,
    messages: &[Value],
) -> Option<String> {
    let context_tokens = estimate_tokens(estimate_content_chars(prompt, messages));
    if context_tokens > MAX_INJECTABLE_CONTEXT_TOKENS {
        warn!(
            context_tokens,
            "estimated context too large, skipping injection"
        );
        return None;
    }

    let mut parts: Vec<&str> = Vec::new();
    let is_premium_provider = chain
        .first_enabled()
        .is_some_and(|first| first.id == active_provider);
    if !optimization_disabled {
        parts.push(if is_premium_provider {
            PREMIUM_PREFACE
        } else {
            STANDARD_PREFACE
        });
    }

    let advice = if routing == RoutingMode::Advisory {
        let complexity = classify_complexity(prompt, messages);
        recommendation(chain, task, complexity, model_tier(active_model))
    } else {
        None
    };

    let mut out = parts.join("\n");
    if let Some(advice) = advice {
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str(&advice);
    }

    if out.is_empty() {
        None
    } else {
        Some(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use spendgate_types::{ProviderDescriptor, TaskModels};

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
    fn test_model_tiers() {
        assert_eq!(model_tier("claude-sonnet-4-20250514"), ModelTier::Premium);
        assert_eq!(model_tier("gpt-4o-mini"), ModelTier::Standard);
        assert_eq!(model_tier("qwen3:8b"), ModelTier::Economy);
        assert_eq!(model_tier("unknown-model"), ModelTier::Economy);
    }

    #[test]
    fn test_premium_provider_gets_long_preface() {
        let chain = chain();
        let out = build_injection(
            &chain,
            "anthropic",
            "claude-sonnet-4-20250514",
            TaskKind::General,
            RoutingMode::Off,
            false,
            "write a poem about spring and explain the imagery choices in depth",
            &[],
        )
        .unwrap();
        assert!(out.contains("metered premium model"));
    }

    #[test]
    fn test_non_premium_provider_gets_short_preface() {
        let chain = chain();
        let out = build_injection(
            &chain,
            "ollama",
            "qwen3:8b",
            TaskKind::General,
            RoutingMode::Off,
            false,
            "hello there",
            &[],
        )
        .unwrap();
        assert!(!out.contains("metered premium model"));
        assert!(out.contains("[COST OPTIMIZATION]"));
    }

    #[test]
    fn test_simple_task_on_premium_recommends_cheaper() {
        let chain = chain();
        let out = build_injection(
            &chain,
            "anthropic",
            "claude-sonnet-4-20250514",
            TaskKind::General,
            RoutingMode::Advisory,
            true,
            "hi",
            &[],
        )
        .unwrap();
        assert!(out.contains("[MODEL RECOMMENDATION]"));
        assert!(out.contains("qwen3:8b"));
    }

    #[test]
    fn test_complex_task_on_economy_recommends_premium() {
        let chain = chain();
        let out = build_injection(
            &chain,
            "ollama",
            "qwen3:8b",
            TaskKind::General,
            RoutingMode::Advisory,
            true,
            "audit the security architecture of the payment flow",
            &[],
        )
        .unwrap();
        assert!(out.contains("claude-sonnet-4-20250514"));
    }

    #[test]
    fn test_no_recommendation_when_routing_off() {
        let chain = chain();
        let out = build_injection(
            &chain,
            "anthropic",
            "claude-sonnet-4-20250514",
            TaskKind::General,
            RoutingMode::Off,
            true,
            "hi",
            &[],
        );
        assert!(out.is_none());
    }

    #[test]
    fn test_oversized_context_suppresses_everything() {
        let chain = chain();
        let messages = vec![json!({
            "role": "user",
            "content": "x".repeat(700_000),
        })];
        let out = build_injection(
            &chain,
            "anthropic",
            "claude-sonnet-4-20250514",
            TaskKind::General,
            RoutingMode::Advisory,
            false,
            "hi",
            &messages,
        );
        assert!(out.is_none());
    }
}
