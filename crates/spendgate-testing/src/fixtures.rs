//! Builders for host-shaped message traces and session-log entries.

use serde_json::{json, Map, Value};
use spendgate_types::{ProviderChain, ProviderDescriptor, SessionEntry, SessionMessage, TaskModels};

/// An assistant message with usage, the way the host reports a completed
/// call.
pub fn assistant_message(
    provider: &str,
    model: &str,
    input_tokens: u64,
    output_tokens: u64,
    timestamp: &str,
) -> Value {
    json!({
        "role": "assistant",
        "provider": provider,
        "model": model,
        "timestamp": timestamp,
        "content": "Here is a perfectly reasonable answer to the question.",
        "usage": {"input_tokens": input_tokens, "output_tokens": output_tokens},
    })
}

/// An assistant message whose text carries a provider error fingerprint.
pub fn failing_assistant_message(text: &str, timestamp: &str) -> Value {
    json!({
        "role": "assistant",
        "timestamp": timestamp,
        "content": text,
        "usage": {"input_tokens": 10, "output_tokens": 10},
    })
}

pub fn user_message(text: &str) -> Value {
    json!({"role": "user", "content": text})
}

/// A two-provider chain: one metered cloud provider and free ollama.
pub fn small_chain(cloud_id: &str, cloud_budget: f64) -> ProviderChain {
    ProviderChain {
        providers: vec![
            ProviderDescriptor {
                id: cloud_id.to_string(),
                priority: 1,
                enabled: true,
                max_daily_usd: cloud_budget,
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

pub fn structural_entry(entry_type: &str, id: &str, parent: Option<&str>) -> SessionEntry {
    SessionEntry {
        entry_type: entry_type.to_string(),
        id: id.to_string(),
        parent_id: parent.map(str::to_string),
        timestamp: Some("2026-08-02T09:00:00Z".to_string()),
        message: None,
        extra: Map::new(),
    }
}

pub fn content_entry(id: &str, parent: Option<&str>, chars: usize) -> SessionEntry {
    SessionEntry {
        entry_type: "message".to_string(),
        id: id.to_string(),
        parent_id: parent.map(str::to_string),
        timestamp: Some("2026-08-02T09:00:00Z".to_string()),
        message: Some(SessionMessage {
            role: "assistant".to_string(),
            content: Value::String("x".repeat(chars)),
        }),
        extra: Map::new(),
    }
}

/// A linear session log: structural header entries followed by `count`
/// content entries of `chars` characters each, properly parent-linked.
pub fn linear_session_log(count: usize, chars: usize) -> Vec<SessionEntry> {
    let mut entries = vec![
        structural_entry("session", "s0", None),
        structural_entry("model_change", "s1", Some("s0")),
    ];
    let mut parent = "s1".to_string();
    for i in 0..count {
        let id = format!("c{}", i);
        entries.push(content_entry(&id, Some(&parent), chars));
        parent = id;
    }
    entries
}
