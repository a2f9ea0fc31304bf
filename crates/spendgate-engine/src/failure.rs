use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

/// Provider-failure fingerprints seen in assistant text when a call dies
/// inside the provider rather than in the host.
static ERROR_PATTERNS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?ix)
        rate\s?limit | too\s+many\s+requests |
        \b(429|502|503|401|403)\b |
        timed?\s?out | timeout | gateway\s+time-?out |
        internal\s+server\s+error | connection\s+refused |
        ECONNREFUSED | ETIMEDOUT |
        billing\s+error | insufficient\s+(balance|credits|funds) |
        quota\s+exceeded | payment\s+required |
        unauthorized | invalid\s+api\s+key | authentication\s+failed",
    )
    .unwrap()
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    Success,
    Failure(String),
}

impl TurnOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, TurnOutcome::Failure(_))
    }
}

fn text_content(message: &Value) -> String {
    match message.get("content") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Array(blocks)) => blocks
            .iter()
            .filter_map(|b| b.get("text").and_then(Value::as_str))
            .collect::<Vec<_>>()
            .join(""),
        _ => String::new(),
    }
}

fn content_is_empty(message: &Value) -> bool {
    match message.get("content") {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(Value::Array(blocks)) => blocks.is_empty(),
        _ => false,
    }
}

/// Classify a completed turn from its message trace.
///
/// The bar for "failure" is deliberately low: a missing assistant reply,
/// an empty one, a provider error string, or a suspiciously short reply
/// with no usage attached all count. Consecutive failures drive provider
/// switching, so false negatives are worse than false positives here.
pub fn classify_turn(error: Option<&str>, messages: &[Value]) -> TurnOutcome {
    if let Some(err) = error {
        return TurnOutcome::Failure(format!("host reported error: {}", err));
    }

    let last_assistant = messages
        .iter()
        .rev()
        .find(|m| m.get("role").and_then(Value::as_str) == Some("assistant"));
    let Some(last) = last_assistant else {
        return TurnOutcome::Failure("no assistant message in turn".to_string());
    };

    if content_is_empty(last) {
        return TurnOutcome::Failure("assistant returned empty content".to_string());
    }

    let text = text_content(last);
    if let Some(m) = ERROR_PATTERNS.find(&text) {
        return TurnOutcome::Failure(format!("assistant text matches error pattern: {}", m.as_str()));
    }

    if last.get("usage").is_none() && text.len() < 20 {
        return TurnOutcome::Failure("short reply with no usage".to_string());
    }

    TurnOutcome::Success
}
