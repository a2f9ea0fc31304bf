use tracing::warn;

/// Per-1K-token rates in USD.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CostRate {
    pub input_per_1k: f64,
    pub output_per_1k: f64,
}

impl CostRate {
    pub const fn new(input_per_1k: f64, output_per_1k: f64) -> Self {
        Self {
            input_per_1k,
            output_per_1k,
        }
    }

    pub const ZERO: CostRate = CostRate::new(0.0, 0.0);

    pub fn is_zero(&self) -> bool {
        self.input_per_1k == 0.0 && self.output_per_1k == 0.0
    }

    pub fn cost_for(&self, input_tokens: u64, output_tokens: u64) -> f64 {
        (input_tokens as f64 / 1000.0) * self.input_per_1k
            + (output_tokens as f64 / 1000.0) * self.output_per_1k
    }
}

#[derive(Debug, Clone, Copy)]
struct ModelRate {
    name: &'static str,
    rate: CostRate,
}

impl ModelRate {
    const fn new(name: &'static str, input_per_1k: f64, output_per_1k: f64) -> Self {
        Self {
            name,
            rate: CostRate::new(input_per_1k, output_per_1k),
        }
    }
}

/// Built-in fallback rate table, keyed on bare model names. This is a
/// safety net, not a pricing catalog: hosts that know better report cost
/// directly on the usage object and that value wins.
const FALLBACK_RATES: &[ModelRate] = &[
    ModelRate::new("claude-opus-4-20250514", 0.015, 0.075),
    ModelRate::new("claude-sonnet-4-20250514", 0.003, 0.015),
    ModelRate::new("claude-3-5-haiku-20241022", 0.0008, 0.004),
    ModelRate::new("gpt-4o", 0.0025, 0.01),
    ModelRate::new("gpt-4o-mini", 0.00015, 0.0006),
    ModelRate::new("kimi-k2.5", 0.0006, 0.0025),
    ModelRate::new("glm-4.6", 0.0006, 0.0022),
    ModelRate::new("deepseek-chat", 0.00027, 0.0011),
];

/// Model name families that run locally. These are free even when the host
/// reports a price for them.
const LOCAL_FAMILIES: &[&str] = &[
    "qwen",
    "llama",
    "mistral",
    "phi",
    "gemma",
    "vicuna",
    "orca",
    "neural-chat",
    "starling",
    "openchat",
    "zephyr",
    "dolphin",
    "nous-hermes",
    "yi",
];

fn bare_name(model_id: &str) -> &str {
    model_id.rsplit('/').next().unwrap_or(model_id)
}

/// Whether a model id names a local, free model: an `ollama/` prefix or a
/// recognised local family name followed by a version or tag.
pub fn is_local_model(model_id: &str) -> bool {
    if model_id.starts_with("ollama/") {
        return true;
    }
    let bare = bare_name(model_id).to_ascii_lowercase();
    LOCAL_FAMILIES.iter().any(|family| {
        if bare == *family {
            return true;
        }
        bare.strip_prefix(family)
            .and_then(|rest| rest.chars().next())
            .is_some_and(|c| c.is_ascii_digit() || matches!(c, '-' | ':' | '.' | '_'))
    })
}

/// Resolve a model id to its rate. Lookup is exact on both the bare name
/// and the provider-prefixed form. Unknown models resolve to zero, which
/// undercounts rather than overcounts spend.
pub fn resolve_cost(model_id: &str) -> CostRate {
    if is_local_model(model_id) {
        return CostRate::ZERO;
    }
    let bare = bare_name(model_id);
    if let Some(entry) = FALLBACK_RATES
        .iter()
        .find(|m| m.name == model_id || m.name == bare)
    {
        return entry.rate;
    }
    warn!(model = model_id, "unknown model, counting cost as zero");
    CostRate::ZERO
}
