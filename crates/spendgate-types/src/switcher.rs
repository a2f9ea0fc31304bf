use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SwitchMode {
    Cloud,
    Local,
}

/// Persistent marker that the host has been switched to the local fallback.
///
/// The file exists only while `mode == local`; restoring cloud deletes it
/// rather than rewriting it, so a plain restart never loops back into a
/// second switch.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwitcherState {
    pub mode: SwitchMode,
    /// Host model pointer captured before the fallback write.
    pub original_model: String,
    pub switched_at: String,
    pub switched_model_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let state = SwitcherState {
            mode: SwitchMode::Local,
            original_model: "anthropic/claude-sonnet-4".to_string(),
            switched_at: "2026-08-02T10:00:00Z".to_string(),
            switched_model_id: "ollama/qwen3:8b".to_string(),
        };

        let json = serde_json::to_string(&state).unwrap();
        assert!(json.contains("\"mode\":\"local\""));
        assert!(json.contains("originalModel"));

        let parsed: SwitcherState = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.mode, SwitchMode::Local);
        assert_eq!(parsed.original_model, "anthropic/claude-sonnet-4");
    }
}
