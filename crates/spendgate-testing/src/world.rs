//! TestWorld pattern for declarative integration test setup.
//!
//! Creates an isolated data directory, sessions directory and host config
//! file under one temp root, with helpers to seed and inspect state
//! documents.

use anyhow::Result;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use spendgate_types::{ProviderChain, SessionEntry};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub struct TestWorld {
    root: TempDir,
}

impl Default for TestWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl TestWorld {
    pub fn new() -> Self {
        let root = TempDir::new().expect("create test world");
        let world = Self { root };
        fs::create_dir_all(world.data_dir()).unwrap();
        fs::create_dir_all(world.sessions_dir()).unwrap();
        world
    }

    pub fn root(&self) -> &Path {
        self.root.path()
    }

    pub fn data_dir(&self) -> PathBuf {
        self.root.path().join("data")
    }

    pub fn sessions_dir(&self) -> PathBuf {
        self.root.path().join("sessions")
    }

    pub fn host_config_path(&self) -> PathBuf {
        self.root.path().join("openclaw.json")
    }

    /// Write a minimal but realistic host config with the given primary
    /// model pointer.
    pub fn write_host_config(&self, primary: &str) -> Result<()> {
        let config = json!({
            "gateway": {"port": 4100},
            "agents": {
                "defaults": {
                    "model": {"primary": primary},
                    "models": {primary: {}}
                }
            }
        });
        fs::write(
            self.host_config_path(),
            serde_json::to_string_pretty(&config)?,
        )?;
        Ok(())
    }

    pub fn write_chain(&self, chain: &ProviderChain) -> Result<()> {
        self.write_state("provider-chain.json", chain)
    }

    /// Seed any state document under the data directory.
    pub fn write_state<T: Serialize>(&self, name: &str, value: &T) -> Result<()> {
        let path = self.data_dir().join(name);
        fs::write(&path, serde_json::to_string_pretty(value)?)?;
        Ok(())
    }

    pub fn read_state<T: DeserializeOwned>(&self, name: &str) -> Option<T> {
        let content = fs::read_to_string(self.data_dir().join(name)).ok()?;
        serde_json::from_str(&content).ok()
    }

    pub fn state_exists(&self, name: &str) -> bool {
        self.data_dir().join(name).exists()
    }

    /// Register a session log under a key and write its entries as JSONL.
    pub fn write_session_log(
        &self,
        key: &str,
        file: &str,
        entries: &[SessionEntry],
    ) -> Result<()> {
        let mut index: BTreeMap<String, String> = fs::read_to_string(
            self.sessions_dir().join("sessions.json"),
        )
        .ok()
        .and_then(|c| serde_json::from_str(&c).ok())
        .unwrap_or_default();
        index.insert(key.to_string(), file.to_string());
        fs::write(
            self.sessions_dir().join("sessions.json"),
            serde_json::to_string_pretty(&index)?,
        )?;

        let mut content = String::new();
        for entry in entries {
            content.push_str(&serde_json::to_string(entry)?);
            content.push('\n');
        }
        fs::write(self.sessions_dir().join(file), content)?;
        Ok(())
    }

    pub fn read_session_log(&self, file: &str) -> Result<Vec<SessionEntry>> {
        let content = fs::read_to_string(self.sessions_dir().join(file))?;
        content
            .lines()
            .filter(|l| !l.trim().is_empty())
            .map(|l| serde_json::from_str(l).map_err(Into::into))
            .collect()
    }

    pub fn host_primary_model(&self) -> Option<String> {
        let content = fs::read_to_string(self.host_config_path()).ok()?;
        let config: serde_json::Value = serde_json::from_str(&content).ok()?;
        config["agents"]["defaults"]["model"]["primary"]
            .as_str()
            .map(str::to_string)
    }
}
