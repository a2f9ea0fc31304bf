//! spendgate: a budget- and failure-aware model router.
//!
//! Runs inside a host agent runtime as an event-driven plugin. It keeps a
//! daily per-provider spend ledger, switches the host's active model when
//! budgets run out or a provider keeps failing, and compacts the host's
//! session log when it outgrows the context window.
//!
//! The host wires it up once at load:
//!
//! ```no_run
//! use spendgate::{register, HookEvent, HOOK_PRIORITY, POST_TURN_HOOK, PRE_TURN_HOOK};
//!
//! let router = register();
//! // host: on(PRE_TURN_HOOK, |e| router.on_before_agent_start(e), HOOK_PRIORITY)
//! // host: on(POST_TURN_HOOK, |e| router.on_agent_end(e), HOOK_PRIORITY)
//! let out = router.on_before_agent_start(&HookEvent {
//!     prompt: "hello".to_string(),
//!     ..Default::default()
//! });
//! if let Some(preface) = out.prepend_context {
//!     println!("injecting: {preface}");
//! }
//! ```

pub use spendgate_engine::{
    aggregate_turn_usage, check_budget, classify_task, classify_turn, decide, resolve_cost,
    BudgetAction, BudgetCheck, CostRate, Decision, RoutingMode, TurnOutcome, TurnUsage,
};
pub use spendgate_runtime::{
    chain_status, BudgetLedger, BudgetRouter, ChainStatus, FailureTracker, HookEvent, HookOutput,
    HostConfigPatcher, LegacyBudget, ModelSwitcher, ProviderRegistry, SessionTruncator, Settings,
    TruncationReport, HOOK_PRIORITY, POST_TURN_HOOK, PRE_TURN_HOOK,
};
pub use spendgate_types::{
    FailureDoc, LedgerDoc, ProviderChain, ProviderDescriptor, SessionEntry, SwitchMode,
    SwitcherState, TaskKind, TaskModels, Transaction,
};

/// Plugin entry point: resolve settings from the environment (including
/// `.env` files), run the load-time pass, and return the hook handlers.
pub fn register() -> BudgetRouter {
    BudgetRouter::register()
}
