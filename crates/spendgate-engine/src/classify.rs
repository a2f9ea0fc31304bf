use regex::Regex;
use serde_json::Value;
use spendgate_types::TaskKind;
use std::sync::LazyLock;

static CODING_KEYWORDS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(code|coding|function|class|method|bug|fix|implement|refactor|debug|compile|unit test|script|endpoint|regex|algorithm|stack trace|type error)\b",
    )
    .unwrap()
});

static CODE_FILE_EXTENSIONS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\.(ts|tsx|js|jsx|py|go|rs|java|rb|php|c|cc|cpp|h|hpp|cs|swift|kt|sh|sql|toml|yaml|yml)\b")
        .unwrap()
});

static COMPLEX_KEYWORDS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(architect|security|audit|deep analysis|refactor entire|distributed|production)")
        .unwrap()
});

static MEDIUM_KEYWORDS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(implement|fix bug|update|integrate|write tests|explain)").unwrap()
});

/// Advisory difficulty estimate. Only ever used to phrase a model
/// recommendation, never to force a switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Complexity {
    Simple,
    Medium,
    Complex,
}

fn has_image_block(message: &Value) -> bool {
    let Some(blocks) = message.get("content").and_then(Value::as_array) else {
        return false;
    };
    blocks
        .iter()
        .any(|b| b.get("type").and_then(Value::as_str) == Some("image"))
}

fn message_text_len(message: &Value) -> usize {
    match message.get("content") {
        Some(Value::String(s)) => s.len(),
        Some(Value::Array(blocks)) => blocks
            .iter()
            .filter_map(|b| b.get("text").and_then(Value::as_str))
            .map(str::len)
            .sum(),
        _ => 0,
    }
}

/// Total conversational characters across the prompt and all messages.
pub fn estimate_content_chars(prompt: &str, messages: &[Value]) -> usize {
    prompt.len() + messages.iter().map(message_text_len).sum::<usize>()
}

/// Vision beats coding when both signals appear; plain prose is general.
pub fn classify_task(prompt: &str, messages: &[Value]) -> TaskKind {
    if messages.iter().any(has_image_block) {
        return TaskKind::Vision;
    }
    if CODING_KEYWORDS.is_match(prompt) || CODE_FILE_EXTENSIONS.is_match(prompt) {
        return TaskKind::Coding;
    }
    TaskKind::General
}

pub fn classify_complexity(prompt: &str, messages: &[Value]) -> Complexity {
    let content_chars = estimate_content_chars(prompt, messages);
    if COMPLEX_KEYWORDS.is_match(prompt) || content_chars > 50_000 || messages.len() > 10 {
        return Complexity::Complex;
    }
    if MEDIUM_KEYWORDS.is_match(prompt) || prompt.len() > 200 || messages.len() > 3 {
        return Complexity::Medium;
    }
    Complexity::Simple
}
