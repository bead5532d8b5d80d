//! Message CLI commands: send, list.

use anyhow::Result;
use clap::Subcommand;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;

use tripchat_types::message::{Message, MessageId, MessageQuery};
use tripchat_types::user::UserId;

use crate::cli::room::parse_room_id;
use crate::state::AppState;

#[derive(Subcommand)]
pub enum MessageCommand {
    /// Send a message to a room as one of its members.
    Send {
        room_id: String,

        /// Sender user id.
        #[arg(long)]
        from: i64,

        /// Message text.
        body: String,
    },

    /// Show a page of a room's history, oldest first.
    #[command(alias = "ls")]
    List {
        room_id: String,

        #[arg(long)]
        limit: Option<u32>,

        /// Only messages older than this message id.
        #[arg(long)]
        before: Option<String>,
    },
}

pub async fn handle_message_command(
    cmd: MessageCommand,
    state: &AppState,
    json: bool,
) -> Result<()> {
    match cmd {
        MessageCommand::Send {
            room_id,
            from,
            body,
        } => {
            let message = state
                .messages
                .send_message(&parse_room_id(&room_id)?, UserId(from), &body)
                .await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&message)?);
                return Ok(());
            }
            println!();
            println!(
                "  {} Message sent {}",
                style("✓").green().bold(),
                style(message.id).dim()
            );
            println!();
            Ok(())
        }
        MessageCommand::List {
            room_id,
            limit,
            before,
        } => {
            let before = before
                .as_deref()
                .map(|s| {
                    s.parse::<MessageId>()
                        .map_err(|e| anyhow::anyhow!("invalid message id '{s}': {e}"))
                })
                .transpose()?;
            let messages = state
                .messages
                .get_messages(&parse_room_id(&room_id)?, MessageQuery { limit, before })
                .await?;
            print_messages(&messages, json)
        }
    }
}

fn print_messages(messages: &[Message], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(messages)?);
        return Ok(());
    }

    if messages.is_empty() {
        println!();
        println!("  {} No messages.", style("i").blue().bold());
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("Time").fg(Color::White),
        Cell::new("From").fg(Color::White),
        Cell::new("Message").fg(Color::White),
    ]);

    for message in messages {
        table.add_row(vec![
            Cell::new(message.created_at.format("%Y-%m-%d %H:%M:%S")).fg(Color::DarkGrey),
            Cell::new(message.sender_id).fg(Color::Cyan),
            Cell::new(&message.body),
        ]);
    }

    println!();
    println!("{table}");
    println!();
    if let Some(oldest) = messages.first() {
        println!(
            "  Older: {}",
            style(format!("--before {}", oldest.id)).dim()
        );
        println!();
    }
    Ok(())
}
