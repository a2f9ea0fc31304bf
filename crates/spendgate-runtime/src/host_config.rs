use crate::store;
use anyhow::{Context, Result};
use serde_json::{json, Map, Value};
use spendgate_types::Error;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Short aliases installed into the host config on first run so users can
/// refer to models without full ids.
const MODEL_ALIASES: &[(&str, &str)] = &[
    ("claude-opus-4-20250514", "opus"),
    ("claude-sonnet-4-20250514", "sonnet"),
    ("claude-3-5-haiku-20241022", "haiku"),
    ("gpt-4o", "4o"),
    ("gpt-4o-mini", "4o-mini"),
    ("qwen3:8b", "qwen"),
    ("qwen3-coder:30b", "qwen-coder"),
];

/// Sole writer of the host configuration file. Only two paths inside it
/// are ever touched: `agents.defaults.model.primary` and
/// `agents.defaults.models.<id>`; every sibling key is preserved, and key
/// order survives the rewrite.
#[derive(Debug, Clone)]
pub struct HostConfigPatcher {
    path: PathBuf,
}

/// Walk to a nested object, creating missing levels. Fails if an existing
/// level is not an object: that is schema drift and we must not write.
fn descend<'a>(root: &'a mut Map<String, Value>, keys: &[&str]) -> Result<&'a mut Map<String, Value>> {
    let mut current = root;
    for key in keys {
        let entry = current
            .entry(key.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        match entry.as_object_mut() {
            Some(next) => current = next,
            None => {
                return Err(
                    Error::HostConfigShape(format!("field `{}` is not an object", key)).into(),
                )
            }
        }
    }
    Ok(current)
}

impl HostConfigPatcher {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn read(&self) -> Result<Value> {
        let content = std::fs::read_to_string(&self.path)
            .map_err(|_| Error::HostConfigNotFound(self.path.clone()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("host config at {} is not valid JSON", self.path.display()))
    }

    /// The currently configured default model, if any.
    pub fn primary_model(&self) -> Option<String> {
        let config = self.read().ok()?;
        config
            .get("agents")?
            .get("defaults")?
            .get("model")?
            .get("primary")?
            .as_str()
            .map(str::to_string)
    }

    /// Point the host at a new default model, creating its entry in the
    /// model table when missing. Aborts without writing when the config is
    /// missing or structurally unexpected.
    pub fn set_primary_model(&self, model_id: &str) -> Result<()> {
        let mut config = self.read()?;
        let Some(root) = config.as_object_mut() else {
            return Err(Error::HostConfigShape("root is not an object".to_string()).into());
        };

        descend(root, &["agents", "defaults", "model"])?
            .insert("primary".to_string(), Value::String(model_id.to_string()));

        let models = descend(root, &["agents", "defaults", "models"])?;
        models
            .entry(model_id.to_string())
            .or_insert_with(|| Value::Object(Map::new()));

        self.write(&config)?;
        info!(model = model_id, "host config primary model updated");
        Ok(())
    }

    /// First-run bootstrap: install the model-alias table and a default
    /// primary model. A config that already has a model table is left
    /// alone.
    pub fn bootstrap(&self, premium_model: &str) -> Result<()> {
        let mut config = self.read()?;
        let Some(root) = config.as_object_mut() else {
            return Err(Error::HostConfigShape("root is not an object".to_string()).into());
        };

        let defaults = descend(root, &["agents", "defaults"])?;
        if defaults.contains_key("models") {
            return Ok(());
        }

        let mut models = Map::new();
        for (id, alias) in MODEL_ALIASES {
            models.insert(id.to_string(), json!({ "alias": alias }));
        }
        models
            .entry(premium_model.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        defaults.insert("models".to_string(), Value::Object(models));

        descend(root, &["agents", "defaults", "model"])?
            .entry("primary".to_string())
            .or_insert_with(|| Value::String(premium_model.to_string()));

        self.write(&config)?;
        info!(model = premium_model, "host config bootstrapped with model aliases");
        Ok(())
    }

    fn write(&self, config: &Value) -> Result<()> {
        let mut content = serde_json::to_string_pretty(config)?;
        content.push('\n');
        if let Err(err) = store::write_text(&self.path, &content) {
            warn!(%err, "failed to write host config");
            return Err(err);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_config(dir: &TempDir, content: &str) -> PathBuf {
        let path = dir.path().join("openclaw.json");
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_set_primary_preserves_siblings_and_order() {
        let dir = TempDir::new().unwrap();
        let path = write_config(
            &dir,
            r#"{
  "gateway": {"port": 4100},
  "agents": {
    "defaults": {
      "model": {"primary": "old-model", "fallback": "other"},
      "models": {"old-model": {}}
    }
  },
  "zebra": true
}"#,
        );

        let patcher = HostConfigPatcher::new(&path);
        patcher.set_primary_model("ollama/qwen3:8b").unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.ends_with('\n'));
        // Unrelated keys survive, in their original order.
        assert!(raw.find("gateway").unwrap() < raw.find("agents").unwrap());
        assert!(raw.contains("zebra"));

        let config: Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(
            config["agents"]["defaults"]["model"]["primary"],
            "ollama/qwen3:8b"
        );
        assert_eq!(config["agents"]["defaults"]["model"]["fallback"], "other");
        assert!(config["agents"]["defaults"]["models"]
            .get("ollama/qwen3:8b")
            .is_some());
        assert!(config["agents"]["defaults"]["models"].get("old-model").is_some());
    }

    #[test]
    fn test_missing_config_aborts_without_creating() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("openclaw.json");

        let patcher = HostConfigPatcher::new(&path);
        assert!(patcher.set_primary_model("m").is_err());
        assert!(!path.exists());
    }

    #[test]
    fn test_schema_drift_aborts_without_writing() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, r#"{"agents": "not an object"}"#);

        let patcher = HostConfigPatcher::new(&path);
        assert!(patcher.set_primary_model("m").is_err());

        let raw = std::fs::read_to_string(&path).unwrap();
        assert_eq!(raw, r#"{"agents": "not an object"}"#);
    }

    #[test]
    fn test_bootstrap_installs_aliases_once() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "{}");

        let patcher = HostConfigPatcher::new(&path);
        patcher.bootstrap("claude-sonnet-4-20250514").unwrap();

        let config = patcher.read().unwrap();
        assert_eq!(
            config["agents"]["defaults"]["model"]["primary"],
            "claude-sonnet-4-20250514"
        );
        assert_eq!(
            config["agents"]["defaults"]["models"]["claude-sonnet-4-20250514"]["alias"],
            "sonnet"
        );

        // Second bootstrap is a no-op even with a different model.
        patcher.bootstrap("gpt-4o").unwrap();
        let config = patcher.read().unwrap();
        assert_eq!(
            config["agents"]["defaults"]["model"]["primary"],
            "claude-sonnet-4-20250514"
        );
    }

    #[test]
    fn test_primary_model_reads_pointer() {
        let dir = TempDir::new().unwrap();
        let path = write_config(
            &dir,
            r#"{"agents": {"defaults": {"model": {"primary": "anthropic/claude-sonnet-4"}}}}"#,
        );
        let patcher = HostConfigPatcher::new(&path);
        assert_eq!(
            patcher.primary_model().as_deref(),
            Some("anthropic/claude-sonnet-4")
        );
    }
}
