//! Rule management commands.

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use uuid::Uuid;

use crate::cli::output::{list_table, output, render_list, truncate, CommandOutput};
use crate::domain::models::Rule;
use crate::infrastructure::{build_runtime, ConfigLoader};

#[derive(Args, Debug)]
pub struct RuleArgs {
    #[command(subcommand)]
    pub command: RuleCommands,
}

#[derive(Subcommand, Debug)]
pub enum RuleCommands {
    /// List all rules
    List {
        /// Only show rules owned by this user
        #[arg(long)]
        owner: Option<Uuid>,
    },
    /// Show rule details
    Show {
        /// Rule ID
        id: Uuid,
    },
    /// Create a rule from a JSON definition file
    Create {
        /// Path to a JSON file describing the rule
        file: String,
    },
    /// Delete a rule
    Delete {
        /// Rule ID
        id: Uuid,
    },
}

#[derive(Debug, serde::Serialize)]
struct RuleRow {
    id: String,
    name: String,
    owner_id: String,
    interval_minutes: u32,
    source_agent: String,
    last_run: Option<String>,
    last_result: Option<String>,
}

impl From<&Rule> for RuleRow {
    fn from(rule: &Rule) -> Self {
        Self {
            id: rule.id.to_string(),
            name: rule.name.clone(),
            owner_id: rule.owner_id.to_string(),
            interval_minutes: rule.execution_interval_minutes,
            source_agent: rule.source.agent_id.clone(),
            last_run: rule.last_execution().map(|t| t.to_rfc3339()),
            last_result: rule.latest_status.as_ref().map(|s| {
                if s.success {
                    "ok".to_string()
                } else {
                    s.error.clone().unwrap_or_else(|| "failed".to_string())
                }
            }),
        }
    }
}

#[derive(Debug, serde::Serialize)]
struct RuleListOutput {
    rules: Vec<RuleRow>,
    total: usize,
}

impl CommandOutput for RuleListOutput {
    fn to_human(&self) -> String {
        let mut table = list_table(&["id", "name", "interval", "source", "last run", "result"]);
        for rule in &self.rules {
            table.add_row(vec![
                rule.id[..8].to_string(),
                truncate(&rule.name, 30),
                format!("{}m", rule.interval_minutes),
                rule.source_agent.clone(),
                rule.last_run.clone().unwrap_or_else(|| "never".to_string()),
                rule.last_result
                    .clone()
                    .map_or_else(|| "-".to_string(), |r| truncate(&r, 40)),
            ]);
        }
        render_list("rule", &table, self.total)
    }
}

#[derive(Debug, serde::Serialize)]
struct RuleDetailOutput {
    rule: Rule,
}

impl CommandOutput for RuleDetailOutput {
    fn to_human(&self) -> String {
        let rule = &self.rule;
        let mut lines = vec![
            format!("Rule: {}", rule.name),
            format!("ID: {}", rule.id),
            format!("Owner: {}", rule.owner_id),
            format!("Interval: {}m", rule.execution_interval_minutes),
            format!(
                "Source: {} {:?}",
                rule.source.agent_id, rule.source.parameters
            ),
            format!(
                "Condition: {} {} {}",
                rule.condition.data_point,
                rule.condition.comparator.as_str(),
                rule.condition.compare_value
            ),
        ];
        for target in &rule.targets {
            lines.push(format!(
                "Target: {} {} {:?}",
                target.agent_id,
                target.action.as_str(),
                target.parameters
            ));
        }
        match &rule.latest_status {
            Some(status) if status.success => {
                lines.push(format!("Last run: ok at {}", status.last_execution));
            }
            Some(status) => {
                lines.push(format!(
                    "Last run: failed at {} ({})",
                    status.last_execution,
                    status.error.as_deref().unwrap_or("unknown error")
                ));
            }
            None => lines.push("Last run: never".to_string()),
        }
        lines.join("\n")
    }
}

#[derive(Debug, serde::Serialize)]
struct MessageOutput {
    message: String,
}

impl CommandOutput for MessageOutput {
    fn to_human(&self) -> String {
        self.message.clone()
    }
}

pub async fn execute(args: RuleArgs, json: bool) -> Result<()> {
    let config = ConfigLoader::load()?;
    let runtime = build_runtime(&config).await?;

    match args.command {
        RuleCommands::List { owner } => {
            let rules = match owner {
                Some(owner_id) => runtime.rule_service.list_for_owner(owner_id).await?,
                None => runtime.rule_service.list().await?,
            };
            let out = RuleListOutput {
                total: rules.len(),
                rules: rules.iter().map(RuleRow::from).collect(),
            };
            output(&out, json);
        }
        RuleCommands::Show { id } => {
            let rule = runtime.rule_service.get(id).await?;
            output(&RuleDetailOutput { rule }, json);
        }
        RuleCommands::Create { file } => {
            let raw = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read rule file {file}"))?;
            let rule: Rule = serde_json::from_str(&raw)
                .with_context(|| format!("Failed to parse rule definition in {file}"))?;
            let created = runtime.rule_service.create(rule).await?;
            output(
                &MessageOutput {
                    message: format!("Created rule {} ({})", created.name, created.id),
                },
                json,
            );
        }
        RuleCommands::Delete { id } => {
            runtime.rule_service.delete(id).await?;
            output(
                &MessageOutput {
                    message: format!("Deleted rule {id}"),
                },
                json,
            );
        }
    }

    Ok(())
}
