//! CLI command definitions for the `tripmate` binary.
//!
//! Uses clap derive macros for argument parsing. Resource commands follow a
//! noun-verb pattern (e.g., `tripmate rooms list`, `tripmate plans download`).

pub mod auth;
pub mod chat;
pub mod plans;
pub mod rooms;
pub mod session_guard;
pub mod status;
pub mod style;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

/// Plan trips together with friends and an AI planner.
#[derive(Parser)]
#[command(name = "tripmate", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Log as JSON lines on stderr.
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Export tracing spans to stdout via OpenTelemetry.
    #[arg(long, global = true, hide = true)]
    pub otel: bool,

    /// Override the REST API base URL.
    #[arg(long, global = true, env = "TRIPMATE_API_URL")]
    pub api_url: Option<String>,

    /// Override the realtime WebSocket URL.
    #[arg(long, global = true, env = "TRIPMATE_WS_URL")]
    pub ws_url: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Log in with email and password.
    Login {
        /// Account email (prompted if omitted).
        #[arg(long)]
        email: Option<String>,
    },

    /// Finish a social login by pasting the URL the browser was redirected to.
    Oauth {
        /// Callback URL containing `accessToken` (and optionally `email`).
        callback_url: String,
    },

    /// Print the URL that starts a social login in the browser.
    #[command(name = "oauth-url")]
    OauthUrl {
        /// Identity provider.
        #[arg(long, default_value = "google")]
        provider: String,
    },

    /// Log out and forget the stored session.
    Logout,

    /// Delete the account permanently.
    Withdraw {
        /// Skip confirmation prompt.
        #[arg(long)]
        yes: bool,
    },

    /// Show the logged-in user.
    Whoami,

    /// Show configuration and session status.
    Status,

    /// Manage chat rooms.
    Rooms {
        #[command(subcommand)]
        action: RoomsCommand,
    },

    /// List and download generated plans.
    Plans {
        #[command(subcommand)]
        action: PlansCommand,
    },

    /// Join a room and chat interactively.
    Chat {
        /// Room ID.
        room_id: i64,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum RoomsCommand {
    /// List the rooms you belong to.
    #[command(alias = "ls")]
    List,

    /// Create a new room.
    Create {
        /// Room name (defaults to the server's name when omitted).
        name: Option<String>,
    },

    /// Show details of a room.
    Show {
        /// Room ID.
        room_id: i64,
    },

    /// Rename a room.
    Rename {
        /// Room ID.
        room_id: i64,

        /// New name. Blank resets to the default name.
        name: String,
    },

    /// Leave a room.
    Leave {
        /// Room ID.
        room_id: i64,

        /// Skip confirmation prompt.
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
pub enum PlansCommand {
    /// List generated plans for a room.
    #[command(alias = "ls")]
    List {
        /// Room ID.
        room_id: i64,
    },

    /// Download a plan document.
    Download {
        /// Room ID.
        room_id: i64,

        /// Plan ID.
        plan_id: i64,

        /// Output path (defaults to the plan's file name).
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
}
