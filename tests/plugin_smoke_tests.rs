//! Facade-level smoke tests: the re-exported surface is enough to drive a
//! whole decision cycle without reaching into the member crates.

use spendgate::{
    chain_status, decide, BudgetRouter, Decision, FailureDoc, HookEvent, LedgerDoc, RoutingMode,
    Settings, TaskModels,
};
use spendgate_testing::{small_chain, TestWorld};

fn settings_for(world: &TestWorld) -> Settings {
    Settings {
        chain_mode: true,
        data_dir: world.data_dir(),
        host_config_path: world.host_config_path(),
        sessions_dir: world.sessions_dir(),
        ollama_url: "http://127.0.0.1:9".to_string(),
        daily_budget_usd: 5.0,
        failure_threshold: 3,
        routing: RoutingMode::Advisory,
        disable_prompt_optimization: false,
        truncation_enabled: false,
        context_max_tokens: 120_000,
        context_keep_recent: 20,
        session_key: "agent:main:main".to_string(),
        local_models: TaskModels::single("qwen3:8b"),
        restart_command: vec!["true".to_string()],
    }
}

#[test]
fn facade_covers_a_full_decision_cycle() {
    let chain = small_chain("anthropic", 5.0);
    let ledger = LedgerDoc::fresh("2026-08-02", "anthropic");
    let failures = FailureDoc::fresh("2026-08-02");

    let decision = decide(&chain, &ledger, &failures, 3, "hello", &[]);
    assert!(matches!(decision, Decision::Allow { .. }));

    let status = chain_status(&chain, &ledger);
    assert_eq!(status.active_provider, "anthropic");
}

#[test]
fn router_construction_and_hooks_do_not_panic() {
    let world = TestWorld::new();
    world.write_host_config("anthropic/claude-sonnet-4-20250514").unwrap();
    world.write_chain(&small_chain("anthropic", 5.0)).unwrap();

    let router = BudgetRouter::with_settings(settings_for(&world));
    router.startup().unwrap();

    let out = router.on_before_agent_start(&HookEvent {
        prompt: "hello".to_string(),
        ..Default::default()
    });
    assert!(out.prepend_context.is_some());
    router.on_agent_end(&HookEvent::default());
}
