use crate::cost::{is_local_model, resolve_cost, CostRate};
use chrono::{DateTime, Utc};
use serde_json::Value;
use spendgate_types::parse_timestamp;

/// Aggregated usage for one completed turn.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnUsage {
    /// Provider-prefixed model id when the trace carries one.
    pub model: String,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub cost: f64,
}

/// Token field names vary by provider SDK; try each pair in order and
/// take the first that yields numbers.
const TOKEN_FIELD_PAIRS: &[(&str, &str)] = &[
    ("input_tokens", "output_tokens"),
    ("prompt_tokens", "completion_tokens"),
    ("input", "output"),
];

fn extract_tokens(usage: &Value) -> Option<(u64, u64)> {
    for (input_key, output_key) in TOKEN_FIELD_PAIRS {
        let input = usage.get(*input_key).and_then(Value::as_u64);
        let output = usage.get(*output_key).and_then(Value::as_u64);
        if let (Some(input), Some(output)) = (input, output) {
            return Some((input, output));
        }
    }
    None
}

fn message_model(message: &Value) -> Option<String> {
    let model = message.get("model").and_then(Value::as_str)?;
    match message.get("provider").and_then(Value::as_str) {
        Some(provider) => Some(format!("{}/{}", provider, model)),
        None => Some(model.to_string()),
    }
}

fn message_is_local(message: &Value) -> bool {
    if message.get("provider").and_then(Value::as_str) == Some("ollama") {
        return true;
    }
    message
        .get("model")
        .and_then(Value::as_str)
        .is_some_and(is_local_model)
}

fn message_cost(message: &Value, usage: &Value, tokens: (u64, u64), fallback: CostRate) -> f64 {
    if message_is_local(message) {
        return 0.0;
    }
    // A host-reported total wins over anything we would compute.
    if let Some(total) = usage
        .get("cost")
        .and_then(|c| c.get("total"))
        .and_then(Value::as_f64)
    {
        if total > 0.0 {
            return total;
        }
    }
    let rate = match message.get("model").and_then(Value::as_str) {
        Some(model) => resolve_cost(model),
        None => fallback,
    };
    rate.cost_for(tokens.0, tokens.1)
}

/// Sum tokens and cost across assistant messages newer than `since`.
///
/// Messages older than the cutoff (or with no parseable timestamp while a
/// cutoff is in force) are excluded, so replayed history is never counted
/// twice. Returns `None` when nothing new qualifies.
pub fn aggregate_turn_usage(
    messages: &[Value],
    fallback_model: &str,
    fallback_rate: CostRate,
    since: Option<DateTime<Utc>>,
) -> Option<TurnUsage> {
    let mut input_tokens: u64 = 0;
    let mut output_tokens: u64 = 0;
    let mut cost: f64 = 0.0;
    let mut model: Option<String> = None;
    let mut any = false;

    for message in messages {
        if message.get("role").and_then(Value::as_str) != Some("assistant") {
            continue;
        }
        let Some(usage) = message.get("usage") else {
            continue;
        };
        let Some(tokens) = extract_tokens(usage) else {
            continue;
        };
        if let Some(cutoff) = since {
            match message.get("timestamp").and_then(parse_timestamp) {
                Some(ts) if ts > cutoff => {}
                _ => continue,
            }
        }

        input_tokens += tokens.0;
        output_tokens += tokens.1;
        cost += message_cost(message, usage, tokens, fallback_rate);
        if model.is_none() {
            model = message_model(message);
        }
        any = true;
    }

    if !any {
        return None;
    }

    Some(TurnUsage {
        model: model.unwrap_or_else(|| fallback_model.to_string()),
        input_tokens,
        output_tokens,
        cost,
    })
}
