//! Storage status dashboard command.

use anyhow::Result;
use console::style;

use crate::state::AppState;

/// Display counts of users, rooms and messages plus storage settings.
pub async fn status(state: &AppState, json: bool) -> Result<()> {
    let users = state.users.count_users().await?;
    let rooms = state.rooms.count_rooms().await?;
    let messages = state.messages.count_messages().await?;

    if json {
        let status = serde_json::json!({
            "version": env!("CARGO_PKG_VERSION"),
            "data_dir": state.data_dir.display().to_string(),
            "users": users,
            "rooms": rooms,
            "messages": messages,
            "config": &*state.config,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!();
    println!(
        "  {} Tripchat v{}",
        style("⚡").bold(),
        env!("CARGO_PKG_VERSION")
    );
    println!();

    println!("  {}", style("── Data ──").dim());
    println!("  Users:    {}", style(users).bold());
    println!("  Rooms:    {}", style(rooms).bold());
    println!("  Messages: {}", style(messages).bold());
    println!();

    println!("  {}", style("── Limits ──").dim());
    println!(
        "  Page size:       {} (max {})",
        state.config.default_page_size, state.config.max_page_size
    );
    println!("  Max body:        {} chars", state.config.max_body_len);
    println!("  Storage timeout: {} ms", state.config.storage_timeout_ms);
    println!();

    println!("  {}", style("── System ──").dim());
    println!(
        "  Data dir: {}",
        style(state.data_dir.display()).dim()
    );
    println!("  Database: {}", style("SQLite (WAL mode)").dim());
    println!();

    Ok(())
}
