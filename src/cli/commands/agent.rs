//! Agent inspection commands.

use std::collections::HashMap;

use anyhow::Result;
use clap::{Args, Subcommand};
use uuid::Uuid;

use crate::cli::output::{list_table, output, render_list, CommandOutput};
use crate::domain::models::AgentDescription;
use crate::domain::ports::EntityListResult;
use crate::infrastructure::{build_runtime, ConfigLoader};

#[derive(Args, Debug)]
pub struct AgentArgs {
    #[command(subcommand)]
    pub command: AgentCommands,
}

#[derive(Subcommand, Debug)]
pub enum AgentCommands {
    /// List registered agents and their capabilities
    List,
    /// List selectable entities exposed by a target agent
    Entities {
        /// Target agent ID
        agent_id: String,

        /// Entity kind to enumerate (e.g. lineItem)
        #[arg(short, long)]
        kind: String,

        /// User to enumerate on behalf of
        #[arg(short, long)]
        user: Uuid,

        /// Agent parameters as key=value pairs
        #[arg(short, long, value_delimiter = ',')]
        parameter: Vec<String>,
    },
}

#[derive(Debug, serde::Serialize)]
struct AgentListOutput {
    agents: Vec<AgentDescription>,
    total: usize,
}

impl CommandOutput for AgentListOutput {
    fn to_human(&self) -> String {
        let mut table = list_table(&["id", "name", "kind", "data points", "entities"]);
        for agent in &self.agents {
            let data_points: Vec<&str> =
                agent.data_points.iter().map(|d| d.key.as_str()).collect();
            let entities: Vec<&str> = agent
                .target_entities
                .iter()
                .map(|e| e.kind.as_str())
                .collect();
            table.add_row(vec![
                agent.id.clone(),
                agent.name.clone(),
                agent.kind.as_str().to_string(),
                data_points.join(", "),
                entities.join(", "),
            ]);
        }
        render_list("agent", &table, self.total)
    }
}

#[derive(Debug, serde::Serialize)]
struct EntityListOutput {
    result: EntityListResult,
}

impl CommandOutput for EntityListOutput {
    fn to_human(&self) -> String {
        match &self.result {
            EntityListResult::Success { entities } => {
                if entities.is_empty() {
                    return "No entities found.".to_string();
                }
                let mut table = list_table(&["kind", "name", "parameters"]);
                for entity in entities {
                    table.add_row(vec![
                        entity.kind.clone(),
                        entity.name.clone(),
                        format!("{:?}", entity.parameters),
                    ]);
                }
                format!("{} entities:\n{table}", entities.len())
            }
            EntityListResult::Failed { error } => format!("Listing failed: {error}"),
        }
    }
}

pub async fn execute(args: AgentArgs, json: bool) -> Result<()> {
    let config = ConfigLoader::load()?;
    let runtime = build_runtime(&config).await?;

    match args.command {
        AgentCommands::List => {
            let agents = runtime.registry.describe_all();
            let out = AgentListOutput {
                total: agents.len(),
                agents,
            };
            output(&out, json);
        }
        AgentCommands::Entities {
            agent_id,
            kind,
            user,
            parameter,
        } => {
            let mut parameters = HashMap::new();
            for pair in parameter {
                let Some((key, value)) = pair.split_once('=') else {
                    anyhow::bail!("Invalid parameter '{pair}', expected key=value");
                };
                parameters.insert(key.to_string(), value.to_string());
            }
            let result = runtime
                .rule_service
                .list_target_entities(&agent_id, &kind, &parameters, user)
                .await?;
            output(&EntityListOutput { result }, json);
        }
    }

    Ok(())
}
