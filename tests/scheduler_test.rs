//! End-to-end scheduler tests over in-memory stores and mock agents.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use weathervane::adapters::agents::{MockSourceAgent, MockTargetAgent};
use weathervane::adapters::memory::MemoryCollection;
use weathervane::domain::models::{
    AgentDescription, AgentKind, Comparator, DataValue, Rule, RuleCondition, RuleSource,
    RuleStatus, RuleTarget, TargetAction, User,
};
use weathervane::domain::ports::{
    EntityListResult, OperationResult, SourceAgent, SourceAgentTask, SourceTaskResult, TargetAgent,
    TargetAgentTask,
};
use weathervane::{AgentRegistry, Collection, RuleScheduler};

struct Fixture {
    rules: Arc<MemoryCollection<Rule>>,
    weather: Arc<MockSourceAgent>,
    ads: Arc<MockTargetAgent>,
    scheduler: Arc<RuleScheduler>,
    owner: User,
}

async fn fixture() -> Fixture {
    let rules = Arc::new(MemoryCollection::<Rule>::new());
    let users = Arc::new(MemoryCollection::<User>::new());
    let weather = Arc::new(MockSourceAgent::weather());
    let ads = Arc::new(MockTargetAgent::ads());

    let mut registry = AgentRegistry::new();
    registry.register_source(Arc::clone(&weather) as Arc<dyn SourceAgent>);
    registry.register_target(Arc::clone(&ads) as _);

    let scheduler = Arc::new(RuleScheduler::new(
        Arc::clone(&rules) as _,
        Arc::clone(&users) as _,
        Arc::new(registry),
    ));

    let owner = User::new("tester");
    users.seed(owner.clone()).await;

    Fixture {
        rules,
        weather,
        ads,
        scheduler,
        owner,
    }
}

fn temperature_rule(owner_id: Uuid, name: &str) -> Rule {
    Rule::new(
        owner_id,
        name,
        60,
        RuleSource {
            agent_id: "mock-weather".to_string(),
            parameters: HashMap::from([("location".to_string(), "Hamburg".to_string())]),
        },
        RuleCondition {
            data_point: "temperature".to_string(),
            comparator: Comparator::Gt,
            compare_value: DataValue::Number(10.0),
        },
    )
    .with_target(RuleTarget {
        agent_id: "mock-ads".to_string(),
        parameters: HashMap::from([
            ("advertiserId".to_string(), "42".to_string()),
            ("lineItemId".to_string(), "7".to_string()),
        ]),
        action: TargetAction::Activate,
    })
}

#[tokio::test]
async fn test_matching_condition_activates_target_and_records_success() {
    let fx = fixture().await;
    fx.weather.set_value("temperature", 15.0).await;
    let rule = temperature_rule(fx.owner.id, "warm enough");
    fx.rules.seed(rule.clone()).await;

    let summary = fx.scheduler.run_tick().await;

    assert_eq!(summary.due, 1);
    assert_eq!(summary.succeeded, 1);
    assert_eq!(summary.failed, 0);

    let tasks = fx.ads.recorded_tasks().await;
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].action, TargetAction::Activate);
    assert_eq!(tasks[0].parameters["lineItemId"], "7");
    assert_eq!(tasks[0].owner_id, fx.owner.id);

    let stored = fx.rules.get(rule.id).await.unwrap().unwrap();
    let status = stored.latest_status.unwrap();
    assert!(status.success);
    assert!(status.error.is_none());
}

#[tokio::test]
async fn test_false_condition_dispatches_the_inverse_action() {
    let fx = fixture().await;
    fx.weather.set_value("temperature", 5.0).await;
    fx.rules.seed(temperature_rule(fx.owner.id, "too cold")).await;

    let summary = fx.scheduler.run_tick().await;

    // A false condition is still a successful execution.
    assert_eq!(summary.succeeded, 1);
    let tasks = fx.ads.recorded_tasks().await;
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].action, TargetAction::Deactivate);
}

#[tokio::test]
async fn test_low_pollen_deactivates_a_high_pollen_rule() {
    let rules = Arc::new(MemoryCollection::<Rule>::new());
    let users = Arc::new(MemoryCollection::<User>::new());
    let pollen = Arc::new(MockSourceAgent::pollen());
    let ads = Arc::new(MockTargetAgent::ads());
    pollen.set_value("pollenRiskLevel", "Low").await;

    let mut registry = AgentRegistry::new();
    registry.register_source(Arc::clone(&pollen) as _);
    registry.register_target(Arc::clone(&ads) as _);

    let scheduler = RuleScheduler::new(
        Arc::clone(&rules) as _,
        Arc::clone(&users) as _,
        Arc::new(registry),
    );

    let owner = User::new("tester");
    users.seed(owner.clone()).await;

    let rule = Rule::new(
        owner.id,
        "pollen season",
        60,
        RuleSource {
            agent_id: "mock-pollen".to_string(),
            parameters: HashMap::from([("location".to_string(), "Hamburg".to_string())]),
        },
        RuleCondition {
            data_point: "pollenRiskLevel".to_string(),
            comparator: Comparator::Eq,
            compare_value: DataValue::Text("High".to_string()),
        },
    )
    .with_target(RuleTarget {
        agent_id: "mock-ads".to_string(),
        parameters: HashMap::from([
            ("advertiserId".to_string(), "42".to_string()),
            ("lineItemId".to_string(), "9".to_string()),
        ]),
        action: TargetAction::Activate,
    });
    rules.seed(rule).await;

    let summary = scheduler.run_tick().await;

    assert_eq!(summary.succeeded, 1);
    let tasks = ads.recorded_tasks().await;
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].action, TargetAction::Deactivate);
}

#[tokio::test]
async fn test_source_failure_records_error_and_skips_targets() {
    let fx = fixture().await;
    fx.weather.fail_with("API down").await;
    let rule = temperature_rule(fx.owner.id, "r");
    fx.rules.seed(rule.clone()).await;

    let summary = fx.scheduler.run_tick().await;

    assert_eq!(summary.failed, 1);
    assert!(fx.ads.recorded_tasks().await.is_empty());

    let stored = fx.rules.get(rule.id).await.unwrap().unwrap();
    let status = stored.latest_status.unwrap();
    assert!(!status.success);
    assert_eq!(status.error.as_deref(), Some("API down"));
}

#[tokio::test]
async fn test_type_mismatched_value_records_evaluation_failure() {
    let fx = fixture().await;
    // The agent serves text where the rule compares numerically.
    fx.weather.set_value("temperature", "hot").await;
    let rule = temperature_rule(fx.owner.id, "r");
    fx.rules.seed(rule.clone()).await;

    let summary = fx.scheduler.run_tick().await;

    assert_eq!(summary.failed, 1);
    assert!(fx.ads.recorded_tasks().await.is_empty());

    let stored = fx.rules.get(rule.id).await.unwrap().unwrap();
    let status = stored.latest_status.unwrap();
    assert!(!status.success);
    assert!(status.error.unwrap().contains("Cannot compare data point"));
}

/// Source agent that reports success without resolving any data points.
struct EmptyHandedSourceAgent;

#[async_trait]
impl SourceAgent for EmptyHandedSourceAgent {
    fn id(&self) -> &str {
        "empty-handed"
    }

    fn describe(&self) -> AgentDescription {
        AgentDescription {
            id: "empty-handed".to_string(),
            name: "Empty Handed".to_string(),
            kind: AgentKind::Source,
            settings: Vec::new(),
            parameters: Vec::new(),
            data_points: Vec::new(),
            target_entities: Vec::new(),
        }
    }

    async fn execute_task(&self, _task: SourceAgentTask) -> SourceTaskResult {
        SourceTaskResult::success(HashMap::new())
    }
}

#[tokio::test]
async fn test_missing_data_point_records_evaluation_failure() {
    let rules = Arc::new(MemoryCollection::<Rule>::new());
    let users = Arc::new(MemoryCollection::<User>::new());
    let ads = Arc::new(MockTargetAgent::ads());

    let mut registry = AgentRegistry::new();
    registry.register_source(Arc::new(EmptyHandedSourceAgent) as _);
    registry.register_target(Arc::clone(&ads) as _);

    let scheduler = RuleScheduler::new(
        Arc::clone(&rules) as _,
        Arc::clone(&users) as _,
        Arc::new(registry),
    );

    let owner = User::new("tester");
    users.seed(owner.clone()).await;
    let mut rule = temperature_rule(owner.id, "r");
    rule.source.agent_id = "empty-handed".to_string();
    rules.seed(rule.clone()).await;

    let summary = scheduler.run_tick().await;

    assert_eq!(summary.failed, 1);
    assert!(ads.recorded_tasks().await.is_empty());

    let stored = rules.get(rule.id).await.unwrap().unwrap();
    let status = stored.latest_status.unwrap();
    assert!(!status.success);
    assert!(status
        .error
        .unwrap()
        .contains("missing data point 'temperature'"));
}

#[tokio::test]
async fn test_unknown_source_agent_records_failure() {
    let fx = fixture().await;
    let mut rule = temperature_rule(fx.owner.id, "r");
    rule.source.agent_id = "no-such-source".to_string();
    fx.rules.seed(rule.clone()).await;

    let summary = fx.scheduler.run_tick().await;

    assert_eq!(summary.failed, 1);
    assert!(fx.ads.recorded_tasks().await.is_empty());

    let stored = fx.rules.get(rule.id).await.unwrap().unwrap();
    let status = stored.latest_status.unwrap();
    assert!(!status.success);
    assert!(status
        .error
        .unwrap()
        .contains("unknown source agent 'no-such-source'"));
}

#[tokio::test]
async fn test_target_failure_records_error_but_still_stamps_execution() {
    let fx = fixture().await;
    fx.weather.set_value("temperature", 15.0).await;
    fx.ads.fail_with("Quota exceeded").await;
    let rule = temperature_rule(fx.owner.id, "r");
    fx.rules.seed(rule.clone()).await;

    let summary = fx.scheduler.run_tick().await;

    assert_eq!(summary.failed, 1);
    let stored = fx.rules.get(rule.id).await.unwrap().unwrap();
    let status = stored.latest_status.clone().unwrap();
    assert!(!status.success);
    assert_eq!(status.error.as_deref(), Some("Quota exceeded"));
    // The failed run still counts against the interval.
    assert!(stored.last_execution().is_some());
}

#[tokio::test]
async fn test_rule_with_missing_owner_is_skipped_without_status_write() {
    let fx = fixture().await;
    fx.weather.set_value("temperature", 15.0).await;
    let orphan = temperature_rule(Uuid::new_v4(), "orphan");
    fx.rules.seed(orphan.clone()).await;

    let summary = fx.scheduler.run_tick().await;

    assert_eq!(summary.due, 1);
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.succeeded + summary.failed, 0);

    let stored = fx.rules.get(orphan.id).await.unwrap().unwrap();
    assert!(stored.latest_status.is_none());
}

#[tokio::test]
async fn test_one_rule_failure_does_not_abort_the_batch() {
    let fx = fixture().await;
    fx.weather.set_value("temperature", 15.0).await;

    let good = temperature_rule(fx.owner.id, "good");
    let mut bad = temperature_rule(fx.owner.id, "bad");
    bad.targets[0].agent_id = "no-such-agent".to_string();
    fx.rules.seed(good.clone()).await;
    fx.rules.seed(bad.clone()).await;

    let summary = fx.scheduler.run_tick().await;

    assert_eq!(summary.succeeded, 1);
    assert_eq!(summary.failed, 1);

    let stored_bad = fx.rules.get(bad.id).await.unwrap().unwrap();
    let status = stored_bad.latest_status.unwrap();
    assert!(!status.success);
    assert!(status
        .error
        .unwrap()
        .contains("unknown target agent 'no-such-agent'"));

    let stored_good = fx.rules.get(good.id).await.unwrap().unwrap();
    assert!(stored_good.latest_status.unwrap().success);
}

#[tokio::test]
async fn test_identical_fetches_are_grouped_into_one_source_call() {
    let fx = fixture().await;
    fx.weather.set_value("temperature", 15.0).await;
    fx.weather.set_value("conditions", "Rain").await;

    let a = temperature_rule(fx.owner.id, "a");
    let mut b = temperature_rule(fx.owner.id, "b");
    b.condition = RuleCondition {
        data_point: "conditions".to_string(),
        comparator: Comparator::Eq,
        compare_value: DataValue::Text("Rain".to_string()),
    };
    fx.rules.seed(a).await;
    fx.rules.seed(b).await;

    let summary = fx.scheduler.run_tick().await;

    assert_eq!(summary.succeeded, 2);
    assert_eq!(fx.weather.upstream_calls(), 1);
    // Each rule still dispatched its own target task.
    assert_eq!(fx.ads.recorded_tasks().await.len(), 2);
}

#[tokio::test]
async fn test_different_parameters_are_not_grouped() {
    let fx = fixture().await;
    fx.weather.set_value("temperature", 15.0).await;

    let a = temperature_rule(fx.owner.id, "a");
    let mut b = temperature_rule(fx.owner.id, "b");
    b.source.parameters.insert("location".to_string(), "Berlin".to_string());
    fx.rules.seed(a).await;
    fx.rules.seed(b).await;

    fx.scheduler.run_tick().await;

    assert_eq!(fx.weather.upstream_calls(), 2);
}

#[tokio::test]
async fn test_grouping_can_be_disabled() {
    let rules = Arc::new(MemoryCollection::<Rule>::new());
    let users = Arc::new(MemoryCollection::<User>::new());
    let weather = Arc::new(MockSourceAgent::weather());
    weather.set_value("temperature", 15.0).await;

    let mut registry = AgentRegistry::new();
    registry.register_source(Arc::clone(&weather) as _);
    registry.register_target(Arc::new(MockTargetAgent::ads()) as _);

    let scheduler = RuleScheduler::new(
        Arc::clone(&rules) as _,
        Arc::clone(&users) as _,
        Arc::new(registry),
    )
    .with_group_fetches(false);

    let owner = User::new("tester");
    users.seed(owner.clone()).await;
    rules.seed(temperature_rule(owner.id, "a")).await;
    rules.seed(temperature_rule(owner.id, "b")).await;

    scheduler.run_tick().await;

    assert_eq!(weather.upstream_calls(), 2);
}

/// Target agent that answers every batch with one extra, failed result.
struct ChattyTargetAgent;

#[async_trait]
impl TargetAgent for ChattyTargetAgent {
    fn id(&self) -> &str {
        "chatty"
    }

    fn describe(&self) -> AgentDescription {
        AgentDescription {
            id: "chatty".to_string(),
            name: "Chatty".to_string(),
            kind: AgentKind::Target,
            settings: Vec::new(),
            parameters: Vec::new(),
            data_points: Vec::new(),
            target_entities: Vec::new(),
        }
    }

    async fn execute_tasks(&self, tasks: Vec<TargetAgentTask>) -> Vec<OperationResult> {
        let mut results: Vec<OperationResult> =
            tasks.iter().map(|_| OperationResult::ok()).collect();
        results.push(OperationResult::failed("phantom task"));
        results
    }

    async fn list_target_entities(
        &self,
        _kind: &str,
        _parameters: &HashMap<String, String>,
        _requestor: &User,
    ) -> EntityListResult {
        EntityListResult::Success { entities: Vec::new() }
    }
}

#[tokio::test]
async fn test_overlong_target_reply_is_trimmed_to_the_batch() {
    let rules = Arc::new(MemoryCollection::<Rule>::new());
    let users = Arc::new(MemoryCollection::<User>::new());
    let weather = Arc::new(MockSourceAgent::weather());
    weather.set_value("temperature", 15.0).await;

    let mut registry = AgentRegistry::new();
    registry.register_source(Arc::clone(&weather) as _);
    registry.register_target(Arc::new(ChattyTargetAgent) as _);

    let scheduler = RuleScheduler::new(
        Arc::clone(&rules) as _,
        Arc::clone(&users) as _,
        Arc::new(registry),
    );

    let owner = User::new("tester");
    users.seed(owner.clone()).await;
    let mut rule = temperature_rule(owner.id, "r");
    rule.targets[0].agent_id = "chatty".to_string();
    rules.seed(rule.clone()).await;

    let summary = scheduler.run_tick().await;

    // Only the result aligned with the one real task counts; the
    // phantom extra must not fail the rule.
    assert_eq!(summary.succeeded, 1);
    let stored = rules.get(rule.id).await.unwrap().unwrap();
    assert!(stored.latest_status.unwrap().success);
}

#[tokio::test]
async fn test_rules_within_interval_are_not_executed() {
    let fx = fixture().await;
    fx.weather.set_value("temperature", 15.0).await;

    let mut rule = temperature_rule(fx.owner.id, "recent");
    rule.latest_status = Some(RuleStatus::success(Utc::now()));
    fx.rules.seed(rule).await;

    let summary = fx.scheduler.run_tick().await;

    assert_eq!(summary.due, 0);
    assert!(fx.ads.recorded_tasks().await.is_empty());
    assert_eq!(fx.weather.upstream_calls(), 0);
}

/// Source agent that never answers within the test timeout.
struct StalledSourceAgent;

#[async_trait]
impl SourceAgent for StalledSourceAgent {
    fn id(&self) -> &str {
        "stalled"
    }

    fn describe(&self) -> AgentDescription {
        AgentDescription {
            id: "stalled".to_string(),
            name: "Stalled".to_string(),
            kind: AgentKind::Source,
            settings: Vec::new(),
            parameters: Vec::new(),
            data_points: Vec::new(),
            target_entities: Vec::new(),
        }
    }

    async fn execute_task(&self, _task: SourceAgentTask) -> SourceTaskResult {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        SourceTaskResult::failed("unreachable")
    }
}

#[tokio::test(start_paused = true)]
async fn test_source_timeout_is_recorded_as_failure() {
    let rules = Arc::new(MemoryCollection::<Rule>::new());
    let users = Arc::new(MemoryCollection::<User>::new());

    let mut registry = AgentRegistry::new();
    registry.register_source(Arc::new(StalledSourceAgent) as _);
    registry.register_target(Arc::new(MockTargetAgent::ads()) as _);

    let scheduler = RuleScheduler::new(
        Arc::clone(&rules) as _,
        Arc::clone(&users) as _,
        Arc::new(registry),
    )
    .with_call_timeout(Duration::from_millis(50));

    let owner = User::new("tester");
    users.seed(owner.clone()).await;
    let mut rule = temperature_rule(owner.id, "stuck");
    rule.source.agent_id = "stalled".to_string();
    rules.seed(rule.clone()).await;

    let summary = scheduler.run_tick().await;

    assert_eq!(summary.failed, 1);
    let stored = rules.get(rule.id).await.unwrap().unwrap();
    let status = stored.latest_status.unwrap();
    assert!(!status.success);
    assert!(status.error.unwrap().contains("timed out"));
}

#[tokio::test]
async fn test_start_and_stop_control_the_loop() {
    let fx = fixture().await;
    fx.weather.set_value("temperature", 15.0).await;
    fx.rules.seed(temperature_rule(fx.owner.id, "loop")).await;

    let handle = fx.scheduler.start(Duration::from_millis(10));
    assert!(fx.scheduler.is_running());

    // Give the loop a moment to complete at least one pass.
    tokio::time::sleep(Duration::from_millis(50)).await;
    fx.scheduler.stop();
    handle.await.unwrap();

    assert!(!fx.scheduler.is_running());
    assert!(!fx.ads.recorded_tasks().await.is_empty());
}
