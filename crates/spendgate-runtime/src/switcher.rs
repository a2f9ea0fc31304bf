use crate::host_config::HostConfigPatcher;
use crate::probe;
use crate::restart::request_host_restart;
use crate::store;
use anyhow::Result;
use spendgate_types::{now_iso, SwitchMode, SwitcherState};
use std::path::PathBuf;
use tracing::{info, warn};

/// Owner of `switcher-state.json` and the only component that changes the
/// host's model pointer. The state file doubles as the in-flight lock: as
/// long as it says `local`, another switch to local is a no-op, so a
/// restart can never cascade into a switching loop.
pub struct ModelSwitcher {
    state_path: PathBuf,
    patcher: HostConfigPatcher,
    restart_command: Vec<String>,
    ollama_url: String,
}

impl ModelSwitcher {
    pub fn new(
        state_path: impl Into<PathBuf>,
        patcher: HostConfigPatcher,
        restart_command: Vec<String>,
        ollama_url: impl Into<String>,
    ) -> Self {
        Self {
            state_path: state_path.into(),
            patcher,
            restart_command,
            ollama_url: ollama_url.into(),
        }
    }

    pub fn state(&self) -> Option<SwitcherState> {
        store::read_json(&self.state_path)
    }

    pub fn is_on_fallback(&self) -> bool {
        self.state().is_some_and(|s| s.mode == SwitchMode::Local)
    }

    /// Route a decided switch to the right mechanics. The local provider
    /// is the one special case: it is probed first and leaves a state file
    /// behind so the original model can be restored later.
    pub fn apply_switch(&self, provider_id: &str, model: &str) -> Result<bool> {
        if provider_id == "ollama" {
            return self.switch_to_local(model);
        }
        let model_id = format!("{}/{}", provider_id, model);
        self.patcher.set_primary_model(&model_id)?;
        request_host_restart(&self.restart_command);
        Ok(true)
    }

    /// Switch the host onto a local model. Idempotent while the state file
    /// says we are already local; aborted when the local provider does not
    /// answer or does not serve the model.
    pub fn switch_to_local(&self, model: &str) -> Result<bool> {
        if self.is_on_fallback() {
            info!("already on local fallback, skipping switch");
            return Ok(false);
        }
        if !probe::local_model_available(&self.ollama_url, model) {
            warn!(model, "local provider unavailable, aborting switch");
            return Ok(false);
        }

        // Capture the original pointer before we overwrite it.
        let original_model = self.patcher.primary_model().unwrap_or_default();
        let model_id = format!("ollama/{}", model);
        self.patcher.set_primary_model(&model_id)?;

        let state = SwitcherState {
            mode: SwitchMode::Local,
            original_model,
            switched_at: now_iso(),
            switched_model_id: model_id.clone(),
        };
        store::write_json(&self.state_path, &state)?;
        info!(model = %model_id, "switched host to local fallback");

        request_host_restart(&self.restart_command);
        Ok(true)
    }

    /// Restore the original cloud model once the budget is healthy again
    /// (a fresh day). While the budget stays exhausted this is a no-op:
    /// we are already on fallback and restarting would only loop.
    pub fn maybe_restore_cloud(&self, budget_healthy: bool) -> Result<bool> {
        let Some(state) = self.state() else {
            return Ok(false);
        };
        if state.mode != SwitchMode::Local || !budget_healthy {
            return Ok(false);
        }
        if state.original_model.is_empty() {
            warn!("no original model recorded, deleting stale switcher state");
            std::fs::remove_file(&self.state_path)?;
            return Ok(false);
        }

        self.patcher.set_primary_model(&state.original_model)?;
        std::fs::remove_file(&self.state_path)?;
        info!(model = %state.original_model, "restored original cloud model");

        request_host_restart(&self.restart_command);
        Ok(true)
    }
}
