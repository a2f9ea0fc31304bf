use spendgate_engine::RoutingMode;
use spendgate_types::TaskModels;
use std::path::PathBuf;
use tracing::debug;

pub const DEFAULT_FAILURE_THRESHOLD: u32 = 3;
pub const DEFAULT_CONTEXT_MAX_TOKENS: usize = 120_000;
pub const DEFAULT_CONTEXT_KEEP_RECENT: usize = 20;
pub const DEFAULT_SESSION_KEY: &str = "agent:main:main";
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
pub const DEFAULT_DAILY_BUDGET_USD: f64 = 5.0;

/// Everything the plugin reads from the environment, resolved once at
/// load. The shell environment always wins over `.env` files.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Chain mode routes across a provider chain; legacy mode keeps a
    /// single daily budget and falls back to local models.
    pub chain_mode: bool,
    pub data_dir: PathBuf,
    pub host_config_path: PathBuf,
    pub sessions_dir: PathBuf,
    pub ollama_url: String,
    /// Legacy-mode daily budget.
    pub daily_budget_usd: f64,
    pub failure_threshold: u32,
    pub routing: RoutingMode,
    pub disable_prompt_optimization: bool,
    pub truncation_enabled: bool,
    pub context_max_tokens: usize,
    pub context_keep_recent: usize,
    pub session_key: String,
    pub local_models: TaskModels,
    pub restart_command: Vec<String>,
}

fn env_str(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

pub(crate) fn env_bool(key: &str) -> Option<bool> {
    let value = env_str(key)?;
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

pub(crate) fn env_f64(key: &str) -> Option<f64> {
    env_str(key)?.trim().parse().ok()
}

fn env_usize(key: &str) -> Option<usize> {
    env_str(key)?.trim().parse().ok()
}

fn home_dir() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("."))
}

fn default_host_root() -> PathBuf {
    home_dir().join(".openclaw")
}

impl Settings {
    /// Read `.env` files, then resolve settings from the environment.
    /// dotenv never overrides variables the shell already set.
    pub fn load() -> Self {
        if let Err(err) = dotenvy::from_path(default_host_root().join(".env")) {
            debug!(%err, "no host .env file loaded");
        }
        if let Err(err) = dotenvy::dotenv() {
            debug!(%err, "no local .env file loaded");
        }
        Self::from_env()
    }

    pub fn from_env() -> Self {
        let host_root = default_host_root();
        let local_default = env_str("LOCAL_MODEL");
        let local_models = TaskModels {
            default: env_str("LOCAL_MODEL_GENERAL")
                .or_else(|| local_default.clone())
                .unwrap_or_else(|| "qwen3:8b".to_string()),
            coding: env_str("LOCAL_MODEL_CODING")
                .or_else(|| local_default.clone())
                .or_else(|| Some("qwen3-coder:30b".to_string())),
            vision: env_str("LOCAL_MODEL_VISION")
                .or_else(|| local_default.clone())
                .or_else(|| Some("qwen3-vl:8b".to_string())),
        };

        let routing = match env_str("AUTO_MODEL_ROUTING").as_deref() {
            Some("off") => RoutingMode::Off,
            _ => RoutingMode::Advisory,
        };

        let restart_command = env_str("HOST_RESTART_COMMAND")
            .map(|raw| raw.split_whitespace().map(str::to_string).collect())
            .unwrap_or_else(|| {
                vec![
                    "openclaw".to_string(),
                    "gateway".to_string(),
                    "restart".to_string(),
                ]
            });

        Self {
            chain_mode: env_bool("USE_CHAIN_MODE").unwrap_or(false),
            data_dir: env_str("BUDGET_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| host_root.join("budget-router")),
            host_config_path: env_str("OPENCLAW_CONFIG")
                .map(PathBuf::from)
                .unwrap_or_else(|| host_root.join("openclaw.json")),
            sessions_dir: host_root.join("sessions"),
            ollama_url: env_str("OLLAMA_URL").unwrap_or_else(|| DEFAULT_OLLAMA_URL.to_string()),
            daily_budget_usd: env_f64("DAILY_BUDGET_USD").unwrap_or(DEFAULT_DAILY_BUDGET_USD),
            failure_threshold: env_usize("FAILURE_THRESHOLD")
                .map(|v| v as u32)
                .unwrap_or(DEFAULT_FAILURE_THRESHOLD),
            routing,
            disable_prompt_optimization: env_bool("DISABLE_PROMPT_OPTIMIZATION").unwrap_or(false),
            truncation_enabled: env_bool("CONTEXT_TRUNCATION_ENABLED").unwrap_or(true),
            context_max_tokens: env_usize("CONTEXT_MAX_TOKENS")
                .unwrap_or(DEFAULT_CONTEXT_MAX_TOKENS),
            context_keep_recent: env_usize("CONTEXT_KEEP_RECENT")
                .unwrap_or(DEFAULT_CONTEXT_KEEP_RECENT),
            session_key: env_str("SESSION_KEY").unwrap_or_else(|| DEFAULT_SESSION_KEY.to_string()),
            local_models,
            restart_command,
        }
    }

    pub fn chain_path(&self) -> PathBuf {
        self.data_dir.join("provider-chain.json")
    }

    pub fn ledger_path(&self) -> PathBuf {
        self.data_dir.join("chain-budget.json")
    }

    pub fn legacy_budget_path(&self) -> PathBuf {
        self.data_dir.join("budget.json")
    }

    pub fn failure_path(&self) -> PathBuf {
        self.data_dir.join("failure-tracker.json")
    }

    pub fn switcher_path(&self) -> PathBuf {
        self.data_dir.join("switcher-state.json")
    }

    pub fn sessions_index_path(&self) -> PathBuf {
        self.sessions_dir.join("sessions.json")
    }
}
