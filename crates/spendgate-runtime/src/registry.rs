use crate::settings::{env_bool, env_f64};
use crate::store;
use anyhow::Result;
use spendgate_types::ProviderChain;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Loads the provider-chain declaration and applies environment
/// overrides. Overrides live only in memory; the on-disk file is never
/// rewritten with them.
#[derive(Debug, Clone)]
pub struct ProviderRegistry {
    path: PathBuf,
    chain: ProviderChain,
}

/// `my-provider` -> `MY_PROVIDER`.
fn env_prefix(provider_id: &str) -> String {
    provider_id.to_ascii_uppercase().replace('-', "_")
}

fn apply_env_overrides(chain: &mut ProviderChain) {
    for provider in &mut chain.providers {
        let prefix = env_prefix(&provider.id);
        if let Some(budget) = env_f64(&format!("{}_DAILY_BUDGET_USD", prefix)) {
            debug!(provider = %provider.id, budget, "daily budget overridden from env");
            provider.max_daily_usd = budget;
        }
        if let Some(enabled) = env_bool(&format!("{}_ENABLED", prefix)) {
            debug!(provider = %provider.id, enabled, "enabled flag overridden from env");
            provider.enabled = enabled;
        }
    }
}

impl ProviderRegistry {
    /// Load the chain from `provider-chain.json`, writing the built-in
    /// default first if the file is absent or unreadable.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let mut chain = match store::read_json::<ProviderChain>(&path) {
            Some(chain) => chain,
            None => {
                let chain = ProviderChain::builtin_default();
                store::write_json(&path, &chain)?;
                info!(path = %path.display(), "wrote built-in default provider chain");
                chain
            }
        };
        apply_env_overrides(&mut chain);
        Ok(Self { path, chain })
    }

    pub fn chain(&self) -> &ProviderChain {
        &self.chain
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spendgate_types::{ProviderDescriptor, TaskModels};
    use tempfile::TempDir;

    #[test]
    fn test_writes_default_when_absent() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("provider-chain.json");

        let registry = ProviderRegistry::load(&path).unwrap();
        assert!(path.exists());
        assert!(registry.chain().get("ollama").is_some());

        // A second load reads the file rather than rewriting it.
        let again = ProviderRegistry::load(&path).unwrap();
        assert_eq!(
            again.chain().providers.len(),
            registry.chain().providers.len()
        );
    }

    #[test]
    fn test_env_overrides_do_not_touch_disk() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("provider-chain.json");
        let chain = ProviderChain {
            providers: vec![ProviderDescriptor {
                id: "test-vendor".to_string(),
                priority: 1,
                enabled: true,
                max_daily_usd: 5.0,
                models: TaskModels::single("m"),
            }],
        };
        store::write_json(&path, &chain).unwrap();

        std::env::set_var("TEST_VENDOR_DAILY_BUDGET_USD", "9.5");
        std::env::set_var("TEST_VENDOR_ENABLED", "FALSE");
        let registry = ProviderRegistry::load(&path).unwrap();
        std::env::remove_var("TEST_VENDOR_DAILY_BUDGET_USD");
        std::env::remove_var("TEST_VENDOR_ENABLED");

        let provider = registry.chain().get("test-vendor").unwrap();
        assert_eq!(provider.max_daily_usd, 9.5);
        assert!(!provider.enabled);

        // On-disk declaration is untouched.
        let on_disk: ProviderChain = store::read_json(&path).unwrap();
        assert_eq!(on_disk.get("test-vendor").unwrap().max_daily_usd, 5.0);
        assert!(on_disk.get("test-vendor").unwrap().enabled);
    }

    #[test]
    fn test_invalid_override_values_ignored() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("provider-chain.json");
        let chain = ProviderChain {
            providers: vec![ProviderDescriptor {
                id: "other-vendor".to_string(),
                priority: 1,
                enabled: true,
                max_daily_usd: 5.0,
                models: TaskModels::single("m"),
            }],
        };
        store::write_json(&path, &chain).unwrap();

        std::env::set_var("OTHER_VENDOR_DAILY_BUDGET_USD", "plenty");
        std::env::set_var("OTHER_VENDOR_ENABLED", "sure");
        let registry = ProviderRegistry::load(&path).unwrap();
        std::env::remove_var("OTHER_VENDOR_DAILY_BUDGET_USD");
        std::env::remove_var("OTHER_VENDOR_ENABLED");

        let provider = registry.chain().get("other-vendor").unwrap();
        assert_eq!(provider.max_daily_usd, 5.0);
        assert!(provider.enabled);
    }

    #[test]
    fn test_env_prefix_mapping() {
        assert_eq!(env_prefix("z-ai"), "Z_AI");
        assert_eq!(env_prefix("ollama"), "OLLAMA");
    }
}
