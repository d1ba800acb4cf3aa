//! Rule scheduling core.
//!
//! One `run_tick` pass selects the rules whose interval has elapsed,
//! fetches their source data (deduplicating identical fetches), evaluates
//! each rule's condition, dispatches the effective target actions, and
//! records the outcome on every due rule. Rules are processed
//! sequentially inside a tick; one rule's failure never aborts the batch.
//!
//! Due-ness is derived from timestamps each tick. There is no persisted
//! "running" state; overlap is prevented by the single, non-reentrant
//! tick loop.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::timeout;
use uuid::Uuid;

use crate::domain::models::{Rule, RuleStatus, User};
use crate::domain::ports::{
    Collection, OperationResult, SourceAgent, SourceAgentTask, SourceTaskResult, TargetAgent,
    TargetAgentTask,
};
use crate::services::conditions;
use crate::services::registry::AgentRegistry;

/// Default per-agent-call timeout.
const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(30);

/// Counts from one scheduler pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickSummary {
    /// Rules whose interval had elapsed.
    pub due: usize,
    /// Due rules that completed with an all-success status.
    pub succeeded: usize,
    /// Due rules recorded as failed (source, evaluation or target failure).
    pub failed: usize,
    /// Due rules skipped without a status write (missing owner,
    /// persistence error while resolving the owner).
    pub skipped: usize,
}

/// One deduplicated source fetch and the due rules it serves.
struct FetchGroup {
    agent_id: String,
    parameters: HashMap<String, String>,
    owner: User,
    data_points: Vec<String>,
    rules: Vec<Rule>,
}

impl FetchGroup {
    fn key(owner_id: Uuid, agent_id: &str, parameters: &HashMap<String, String>) -> String {
        // Sorted so parameter ordering never splits a group.
        let mut pairs: Vec<_> = parameters.iter().collect();
        pairs.sort();
        format!("{owner_id}|{agent_id}|{pairs:?}")
    }

    fn add(&mut self, rule: Rule) {
        let data_point = &rule.condition.data_point;
        if !self.data_points.contains(data_point) {
            self.data_points.push(data_point.clone());
        }
        self.rules.push(rule);
    }
}

/// Interval-based rule scheduler.
pub struct RuleScheduler {
    rules: Arc<dyn Collection<Rule>>,
    users: Arc<dyn Collection<User>>,
    registry: Arc<AgentRegistry>,
    call_timeout: Duration,
    group_fetches: bool,
    running: Arc<AtomicBool>,
}

impl RuleScheduler {
    pub fn new(
        rules: Arc<dyn Collection<Rule>>,
        users: Arc<dyn Collection<User>>,
        registry: Arc<AgentRegistry>,
    ) -> Self {
        Self {
            rules,
            users,
            registry,
            call_timeout: DEFAULT_CALL_TIMEOUT,
            group_fetches: true,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Set the per-agent-call timeout.
    pub fn with_call_timeout(mut self, call_timeout: Duration) -> Self {
        self.call_timeout = call_timeout;
        self
    }

    /// Enable or disable in-tick fetch deduplication.
    pub fn with_group_fetches(mut self, group_fetches: bool) -> Self {
        self.group_fetches = group_fetches;
        self
    }

    /// Whether a rule's interval has elapsed.
    ///
    /// Rules that never executed are always due.
    pub fn is_due(rule: &Rule, now: DateTime<Utc>) -> bool {
        match rule.last_execution() {
            None => true,
            Some(last) => {
                let interval =
                    chrono::Duration::minutes(i64::from(rule.execution_interval_minutes));
                now >= last + interval
            }
        }
    }

    /// Run one scheduler pass over all rules.
    pub async fn run_tick(&self) -> TickSummary {
        let now = Utc::now();
        let mut summary = TickSummary::default();

        let all_rules = match self.rules.list().await {
            Ok(rules) => rules,
            Err(e) => {
                tracing::error!(error = %e, "Failed to load rules, skipping tick");
                return summary;
            }
        };

        let due: Vec<Rule> = all_rules
            .into_iter()
            .filter(|rule| Self::is_due(rule, now))
            .collect();
        summary.due = due.len();
        if due.is_empty() {
            return summary;
        }
        tracing::info!(due = due.len(), "Scheduler tick: processing due rules");

        let groups = self.build_groups(due, &mut summary).await;

        for group in groups {
            self.run_group(group, now, &mut summary).await;
        }

        tracing::info!(
            due = summary.due,
            succeeded = summary.succeeded,
            failed = summary.failed,
            skipped = summary.skipped,
            "Scheduler tick complete"
        );
        summary
    }

    /// Resolve owners and bucket due rules into fetch groups.
    ///
    /// Rules whose owner cannot be resolved are skipped with a warning
    /// and no status write; that is fatal for the rule, not the batch.
    async fn build_groups(&self, due: Vec<Rule>, summary: &mut TickSummary) -> Vec<FetchGroup> {
        let mut groups: Vec<FetchGroup> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();

        for rule in due {
            let owner = match self.users.get(rule.owner_id).await {
                Ok(Some(owner)) => owner,
                Ok(None) => {
                    tracing::warn!(
                        rule_id = %rule.id,
                        owner_id = %rule.owner_id,
                        "Skipping rule: owner not found"
                    );
                    summary.skipped += 1;
                    continue;
                }
                Err(e) => {
                    tracing::warn!(
                        rule_id = %rule.id,
                        error = %e,
                        "Skipping rule: failed to resolve owner"
                    );
                    summary.skipped += 1;
                    continue;
                }
            };

            if self.group_fetches {
                let key =
                    FetchGroup::key(owner.id, &rule.source.agent_id, &rule.source.parameters);
                if let Some(&i) = index.get(&key) {
                    groups[i].add(rule);
                    continue;
                }
                index.insert(key, groups.len());
            }
            let mut group = FetchGroup {
                agent_id: rule.source.agent_id.clone(),
                parameters: rule.source.parameters.clone(),
                owner,
                data_points: Vec::new(),
                rules: Vec::new(),
            };
            group.add(rule);
            groups.push(group);
        }

        groups
    }

    /// Fetch one group's source data and process each member rule.
    async fn run_group(&self, group: FetchGroup, now: DateTime<Utc>, summary: &mut TickSummary) {
        let fetch = match self.registry.source(&group.agent_id) {
            Some(agent) => {
                let task = SourceAgentTask {
                    parameters: group.parameters.clone(),
                    owner_id: group.owner.id,
                    owner_settings: group.owner.settings.clone(),
                    data_points: group.data_points.clone(),
                };
                self.call_source(agent.as_ref(), task).await
            }
            None => SourceTaskResult::failed(format!(
                "Cannot run rule for unknown source agent '{}'",
                group.agent_id
            )),
        };

        match fetch {
            SourceTaskResult::Failed { error } => {
                // No target actions on source failure.
                for rule in group.rules {
                    self.record_status(rule, RuleStatus::failure(now, error.clone()))
                        .await;
                    summary.failed += 1;
                }
            }
            SourceTaskResult::Success { data } => {
                for rule in group.rules {
                    let status = self.execute_rule(&rule, &data, &group.owner, now).await;
                    if status.success {
                        summary.succeeded += 1;
                    } else {
                        summary.failed += 1;
                    }
                    self.record_status(rule, status).await;
                }
            }
        }
    }

    /// Evaluate one rule against fetched data and dispatch its targets.
    async fn execute_rule(
        &self,
        rule: &Rule,
        data: &HashMap<String, crate::domain::models::DataValue>,
        owner: &User,
        now: DateTime<Utc>,
    ) -> RuleStatus {
        let data_point = &rule.condition.data_point;
        let Some(value) = data.get(data_point) else {
            return RuleStatus::failure(
                now,
                format!("Source result is missing data point '{data_point}'"),
            );
        };

        let Some(matched) =
            conditions::evaluate(value, rule.condition.comparator, &rule.condition.compare_value)
        else {
            return RuleStatus::failure(
                now,
                format!(
                    "Cannot compare data point '{}' ({}) with '{}' ({}) using '{}'",
                    data_point,
                    value.kind().as_str(),
                    rule.condition.compare_value,
                    rule.condition.compare_value.kind().as_str(),
                    rule.condition.comparator.as_str()
                ),
            );
        };

        tracing::debug!(
            rule_id = %rule.id,
            rule_name = %rule.name,
            value = %value,
            matched,
            "Condition evaluated"
        );

        // Targets describe the state for a true condition; enforce the
        // inverse when it is false.
        let mut batches: Vec<(String, Vec<TargetAgentTask>)> = Vec::new();
        for target in &rule.targets {
            let action = if matched { target.action } else { target.action.inverse() };
            let task = TargetAgentTask {
                agent_id: target.agent_id.clone(),
                action,
                parameters: target.parameters.clone(),
                owner_id: owner.id,
                owner_settings: owner.settings.clone(),
            };
            match batches.iter_mut().find(|(id, _)| *id == target.agent_id) {
                Some((_, tasks)) => tasks.push(task),
                None => batches.push((target.agent_id.clone(), vec![task])),
            }
        }

        // Batches are dispatched sequentially: at most one outstanding
        // target call per rule at any time.
        let mut results: Vec<OperationResult> = Vec::new();
        for (agent_id, tasks) in batches {
            match self.registry.target(&agent_id) {
                Some(agent) => {
                    results.extend(self.call_target(agent.as_ref(), tasks).await);
                }
                None => {
                    tracing::warn!(
                        rule_id = %rule.id,
                        agent_id = %agent_id,
                        "Skipping target batch: unknown target agent"
                    );
                    results.extend(tasks.iter().map(|_| {
                        OperationResult::failed(format!(
                            "Cannot run task for unknown target agent '{agent_id}'"
                        ))
                    }));
                }
            }
        }

        if results.iter().all(|r| r.success) {
            RuleStatus::success(now)
        } else {
            let error = results
                .iter()
                .find(|r| !r.success)
                .and_then(|r| r.error.clone())
                .unwrap_or_else(|| "Target task failed".to_string());
            RuleStatus::failure(now, error)
        }
    }

    /// Call a source agent under the configured timeout.
    async fn call_source(&self, agent: &dyn SourceAgent, task: SourceAgentTask) -> SourceTaskResult {
        match timeout(self.call_timeout, agent.execute_task(task)).await {
            Ok(result) => result,
            Err(_) => SourceTaskResult::failed(format!(
                "Source agent '{}' timed out after {}s",
                agent.id(),
                self.call_timeout.as_secs()
            )),
        }
    }

    /// Call a target agent under the configured timeout, keeping the
    /// result vector aligned with the task batch.
    async fn call_target(
        &self,
        agent: &dyn TargetAgent,
        tasks: Vec<TargetAgentTask>,
    ) -> Vec<OperationResult> {
        let expected = tasks.len();
        let mut results = match timeout(self.call_timeout, agent.execute_tasks(tasks)).await {
            Ok(results) => results,
            Err(_) => {
                let error = format!(
                    "Target agent '{}' timed out after {}s",
                    agent.id(),
                    self.call_timeout.as_secs()
                );
                return (0..expected).map(|_| OperationResult::failed(&error)).collect();
            }
        };
        // A well-behaved agent returns one result per task; pad so a
        // short reply still fails the unanswered tasks, and drop any
        // excess so positional alignment holds either way.
        while results.len() < expected {
            results.push(OperationResult::failed(format!(
                "Target agent '{}' returned no result for task",
                agent.id()
            )));
        }
        results.truncate(expected);
        results
    }

    /// Persist a rule's execution status. A write failure aborts only
    /// this rule's bookkeeping.
    async fn record_status(&self, mut rule: Rule, status: RuleStatus) {
        if let Some(ref error) = status.error {
            tracing::warn!(rule_id = %rule.id, rule_name = %rule.name, error = %error, "Rule failed");
        }
        rule.latest_status = Some(status);
        rule.updated_at = Utc::now();
        let id = rule.id;
        if let Err(e) = self.rules.update(id, rule).await {
            tracing::warn!(rule_id = %id, error = %e, "Failed to persist rule status");
        }
    }

    /// Start the tick loop. Returns the loop's `JoinHandle`.
    ///
    /// Ticks run back to back on one task and therefore never overlap.
    pub fn start(self: &Arc<Self>, tick_interval: Duration) -> tokio::task::JoinHandle<()> {
        self.running.store(true, Ordering::SeqCst);
        let scheduler = Arc::clone(self);

        tokio::spawn(async move {
            while scheduler.running.load(Ordering::SeqCst) {
                scheduler.run_tick().await;
                tokio::time::sleep(tick_interval).await;
            }
        })
    }

    /// Stop the tick loop after the current pass.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}
