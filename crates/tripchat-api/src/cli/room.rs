//! Room CLI commands: create, list, show, dm and membership changes.

use anyhow::Result;
use clap::Subcommand;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;

use tripchat_types::room::{RoomDetail, RoomId, RoomKind, RoomPage};
use tripchat_types::user::UserId;

use crate::state::AppState;

#[derive(Subcommand)]
pub enum RoomCommand {
    /// Create a group room.
    Create {
        /// Optional display name.
        #[arg(long)]
        name: Option<String>,

        /// Member user ids (repeat or comma-separate).
        #[arg(short, long = "member", value_delimiter = ',', required = true)]
        members: Vec<i64>,
    },

    /// List the rooms a user belongs to.
    #[command(alias = "ls")]
    List {
        #[arg(long)]
        user: i64,

        #[arg(long)]
        limit: Option<u32>,

        /// Only rooms with an id greater than this one.
        #[arg(long)]
        after: Option<String>,
    },

    /// Show a room and its members.
    Show { room_id: String },

    /// Find or create the direct room between two users.
    Dm { user_a: i64, user_b: i64 },

    /// Add a member to a group room.
    AddMember {
        room_id: String,
        #[arg(long)]
        user: i64,
    },

    /// Remove a member from a group room.
    RemoveMember {
        room_id: String,
        #[arg(long)]
        user: i64,
    },
}

pub async fn handle_room_command(cmd: RoomCommand, state: &AppState, json: bool) -> Result<()> {
    match cmd {
        RoomCommand::Create { name, members } => {
            let ids: Vec<UserId> = members.into_iter().map(UserId).collect();
            let detail = state.rooms.create_room(name, &ids).await?;
            print_detail(&detail, "Room created", json)
        }
        RoomCommand::List { user, limit, after } => {
            let after = after.as_deref().map(parse_room_id).transpose()?;
            let rooms = state
                .rooms
                .get_rooms_for_user(UserId(user), RoomPage { limit, after })
                .await?;
            print_rooms(&rooms, json)
        }
        RoomCommand::Show { room_id } => {
            let detail = state.rooms.get_room_detail(&parse_room_id(&room_id)?).await?;
            print_detail(&detail, "Room", json)
        }
        RoomCommand::Dm { user_a, user_b } => {
            let detail = state
                .resolver
                .get_or_create_room(UserId(user_a), UserId(user_b))
                .await?;
            print_detail(&detail, "Direct room", json)
        }
        RoomCommand::AddMember { room_id, user } => {
            let detail = state
                .rooms
                .add_member(&parse_room_id(&room_id)?, UserId(user))
                .await?;
            print_detail(&detail, "Member added", json)
        }
        RoomCommand::RemoveMember { room_id, user } => {
            let room_id = parse_room_id(&room_id)?;
            state.rooms.remove_member(&room_id, UserId(user)).await?;
            let detail = state.rooms.get_room_detail(&room_id).await?;
            print_detail(&detail, "Member removed", json)
        }
    }
}

pub(crate) fn parse_room_id(s: &str) -> Result<RoomId> {
    s.parse()
        .map_err(|e| anyhow::anyhow!("invalid room id '{s}': {e}"))
}

fn room_label(detail: &RoomDetail) -> String {
    match (&detail.room.kind, &detail.room.name) {
        (_, Some(name)) => name.clone(),
        (RoomKind::Direct, None) => format!("DM {}", detail.room.pair_key.as_deref().unwrap_or("")),
        (RoomKind::Group, None) => "(unnamed)".to_string(),
    }
}

fn member_names(detail: &RoomDetail) -> String {
    detail
        .members
        .iter()
        .map(|m| format!("{} ({})", m.display_name, m.id))
        .collect::<Vec<_>>()
        .join(", ")
}

fn print_detail(detail: &RoomDetail, headline: &str, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(detail)?);
        return Ok(());
    }

    println!();
    println!("  {} {}", style("✓").green().bold(), headline);
    println!();
    println!(
        "  {}     {}",
        style("Name:").bold(),
        style(room_label(detail)).cyan()
    );
    println!("  {}     {}", style("Kind:").bold(), detail.room.kind);
    println!(
        "  {}  {}",
        style("Members:").bold(),
        member_names(detail)
    );
    println!(
        "  {}       {}",
        style("ID:").bold(),
        style(detail.room.id).dim()
    );
    println!();
    Ok(())
}

fn print_rooms(rooms: &[RoomDetail], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(rooms)?);
        return Ok(());
    }

    if rooms.is_empty() {
        println!();
        println!(
            "  {} No rooms found. Create one with: {}",
            style("i").blue().bold(),
            style("tripchat room create -m <ids>").yellow()
        );
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("Room").fg(Color::White),
        Cell::new("Kind").fg(Color::White),
        Cell::new("Members").fg(Color::White),
        Cell::new("ID").fg(Color::White),
    ]);

    for detail in rooms {
        let kind_cell = match detail.room.kind {
            RoomKind::Direct => Cell::new("direct").fg(Color::Magenta),
            RoomKind::Group => Cell::new("group").fg(Color::Green),
        };
        table.add_row(vec![
            Cell::new(room_label(detail)).fg(Color::Cyan),
            kind_cell,
            Cell::new(member_names(detail)),
            Cell::new(detail.room.id).fg(Color::DarkGrey),
        ]);
    }

    println!();
    println!("{table}");
    println!();
    println!(
        "  {} room{}",
        style(rooms.len()).bold(),
        if rooms.len() == 1 { "" } else { "s" }
    );
    println!();
    Ok(())
}
