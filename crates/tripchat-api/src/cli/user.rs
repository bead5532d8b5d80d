//! User provisioning CLI commands: add, ban, unban, show.

use anyhow::Result;
use clap::Subcommand;
use console::style;

use tripchat_types::user::{Role, User, UserId};

use crate::state::AppState;

#[derive(Subcommand)]
pub enum UserCommand {
    /// Create a user or update an existing user's profile.
    Add {
        /// Numeric user id, as assigned by the identity system.
        id: i64,

        /// Display name.
        #[arg(long)]
        name: String,

        /// Avatar reference (URL or asset key).
        #[arg(long)]
        avatar: Option<String>,

        /// Role: user, advisor or admin.
        #[arg(long, default_value = "user")]
        role: String,
    },

    /// Ban a user. Banned users are refused by the API.
    Ban { id: i64 },

    /// Lift a ban.
    Unban { id: i64 },

    /// Show a user.
    Show { id: i64 },
}

pub async fn handle_user_command(cmd: UserCommand, state: &AppState, json: bool) -> Result<()> {
    match cmd {
        UserCommand::Add {
            id,
            name,
            avatar,
            role,
        } => {
            let role: Role = role.parse().map_err(|e: String| anyhow::anyhow!(e))?;
            let user = state
                .users
                .upsert_user(UserId(id), &name, avatar, role)
                .await?;
            print_user(&user, "User saved", json)
        }
        UserCommand::Ban { id } => {
            let user = state.users.set_banned(UserId(id), true).await?;
            print_user(&user, "User banned", json)
        }
        UserCommand::Unban { id } => {
            let user = state.users.set_banned(UserId(id), false).await?;
            print_user(&user, "Ban lifted", json)
        }
        UserCommand::Show { id } => {
            let user = state.users.get_user(UserId(id)).await?;
            print_user(&user, "User", json)
        }
    }
}

fn print_user(user: &User, headline: &str, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(user)?);
        return Ok(());
    }

    println!();
    println!("  {} {}", style("✓").green().bold(), headline);
    println!();
    println!("  {}    {}", style("ID:").bold(), user.id);
    println!(
        "  {}  {}",
        style("Name:").bold(),
        style(&user.display_name).cyan()
    );
    println!("  {}  {}", style("Role:").bold(), user.role);
    if let Some(avatar) = &user.avatar {
        println!("  {} {}", style("Avatar:").bold(), style(avatar).dim());
    }
    if user.banned {
        println!("  {}", style("● banned").red());
    }
    println!();
    Ok(())
}
