//! CLI command definitions for the `tripchat` binary.
//!
//! Uses clap derive macros for argument parsing. Commands are grouped by
//! noun (e.g., `tripchat room create`, `tripchat token issue`).

pub mod message;
pub mod room;
pub mod status;
pub mod token;
pub mod user;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

/// Room-based chat storage and REST API.
#[derive(Parser)]
#[command(name = "tripchat", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Detailed output (-v for info, -vv for debug, -vvv for trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Export spans to stdout via OpenTelemetry.
    #[arg(long, global = true, env = "TRIPCHAT_OTEL")]
    pub otel: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the REST API server.
    Serve {
        /// Port to listen on (defaults to config.toml, then 3000).
        #[arg(short, long, env = "TRIPCHAT_PORT")]
        port: Option<u16>,

        /// Host to bind to (defaults to config.toml, then 127.0.0.1).
        #[arg(long, env = "TRIPCHAT_HOST")]
        host: Option<String>,
    },

    /// Manage users (add, ban, unban, show).
    User {
        #[command(subcommand)]
        action: user::UserCommand,
    },

    /// Issue or revoke access tokens.
    Token {
        #[command(subcommand)]
        action: token::TokenCommand,
    },

    /// Manage rooms (create, list, show, dm, membership).
    Room {
        #[command(subcommand)]
        action: room::RoomCommand,
    },

    /// Send and read messages.
    #[command(alias = "msg")]
    Message {
        #[command(subcommand)]
        action: message::MessageCommand,
    },

    /// Storage status dashboard.
    Status,

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}
