//! User management commands.

use anyhow::Result;
use clap::{Args, Subcommand};
use uuid::Uuid;

use crate::cli::output::{list_table, output, render_list, CommandOutput};
use crate::domain::models::User;
use crate::infrastructure::{build_runtime, ConfigLoader};

#[derive(Args, Debug)]
pub struct UserArgs {
    #[command(subcommand)]
    pub command: UserCommands,
}

#[derive(Subcommand, Debug)]
pub enum UserCommands {
    /// List all users
    List,
    /// Add a user
    Add {
        /// Display name
        name: String,

        /// Agent settings as key=value pairs (e.g. api_token=abc123)
        #[arg(short, long, value_delimiter = ',')]
        setting: Vec<String>,
    },
    /// Delete a user
    Delete {
        /// User ID
        id: Uuid,
    },
}

#[derive(Debug, serde::Serialize)]
struct UserListOutput {
    users: Vec<User>,
    total: usize,
}

impl CommandOutput for UserListOutput {
    fn to_human(&self) -> String {
        let mut table = list_table(&["id", "name", "settings", "created"]);
        for user in &self.users {
            table.add_row(vec![
                user.id.to_string(),
                user.name.clone(),
                user.settings.len().to_string(),
                user.created_at.to_rfc3339(),
            ]);
        }
        render_list("user", &table, self.total)
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

pub async fn execute(args: UserArgs, json: bool) -> Result<()> {
    let config = ConfigLoader::load()?;
    let runtime = build_runtime(&config).await?;

    match args.command {
        UserCommands::List => {
            let users = runtime.users.list().await?;
            let out = UserListOutput {
                total: users.len(),
                users,
            };
            output(&out, json);
        }
        UserCommands::Add { name, setting } => {
            let mut user = User::new(&name);
            for pair in setting {
                let Some((key, value)) = pair.split_once('=') else {
                    anyhow::bail!("Invalid setting '{pair}', expected key=value");
                };
                user = user.with_setting(key, value);
            }
            let created = runtime.users.insert(user).await?;
            output(
                &MessageOutput {
                    message: format!("Created user {} ({})", created.name, created.id),
                },
                json,
            );
        }
        UserCommands::Delete { id } => {
            runtime.users.delete(id).await?;
            output(
                &MessageOutput {
                    message: format!("Deleted user {id}"),
                },
                json,
            );
        }
    }

    Ok(())
}
