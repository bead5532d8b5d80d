//! Access token CLI commands: issue, revoke.

use anyhow::Result;
use clap::Subcommand;
use console::style;

use tripchat_core::repository::token::AccessTokenRepository;
use tripchat_types::error::ChatError;
use tripchat_types::user::UserId;

use crate::http::extractors::auth::issue_token;
use crate::state::AppState;

#[derive(Subcommand)]
pub enum TokenCommand {
    /// Issue a new token for a user. The token is shown once.
    Issue {
        #[arg(long)]
        user: i64,
    },

    /// Revoke every token of a user.
    Revoke {
        #[arg(long)]
        user: i64,
    },
}

pub async fn handle_token_command(cmd: TokenCommand, state: &AppState, json: bool) -> Result<()> {
    match cmd {
        TokenCommand::Issue { user } => {
            let token = issue_token(state, UserId(user)).await?;

            if json {
                let out = serde_json::json!({ "user_id": user, "token": token });
                println!("{}", serde_json::to_string_pretty(&out)?);
                return Ok(());
            }

            println!();
            println!(
                "  {} Access token issued for user {} (save this -- it won't be shown again):",
                style("🔑").bold(),
                user
            );
            println!();
            println!("  {}", style(&token).yellow().bold());
            println!();
        }
        TokenCommand::Revoke { user } => {
            let revoked = state
                .tokens
                .revoke_tokens(UserId(user))
                .await
                .map_err(ChatError::from)?;

            if json {
                let out = serde_json::json!({ "user_id": user, "revoked": revoked });
                println!("{}", serde_json::to_string_pretty(&out)?);
                return Ok(());
            }

            println!();
            println!(
                "  {} Revoked {} token{} for user {}",
                style("✓").green().bold(),
                style(revoked).bold(),
                if revoked == 1 { "" } else { "s" },
                user
            );
            println!();
        }
    }
    Ok(())
}
