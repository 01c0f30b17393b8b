//! Tripmate terminal client entry point.
//!
//! Binary name: `tripmate`
//!
//! Parses CLI arguments, wires the session client against the configured
//! backend, restores any saved session, then dispatches to the command
//! handler.

mod cli;
mod state;

use clap::Parser;
use clap_complete::generate;
use tracing::debug;

use tripmate_observe::tracing_setup::{TracingOptions, init_tracing, shutdown_tracing};
use tripmate_types::chat::RoomId;

use cli::session_guard::SessionGuard;
use cli::{Cli, Commands, PlansCommand, RoomsCommand};
use state::{AppContext, EndpointOverrides};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up tracing based on verbosity
    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "warn",
        1 => "info,tripmate=debug",
        _ => "trace",
    };
    init_tracing(TracingOptions {
        filter: Some(filter.to_string()),
        json: cli.log_json,
        otel: cli.otel,
    })
    .map_err(|e| anyhow::anyhow!("failed to initialize logging: {e}"))?;

    // Shell completions don't need a backend
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "tripmate", &mut std::io::stdout());
        return Ok(());
    }

    let ctx = AppContext::init(EndpointOverrides {
        api_url: cli.api_url.clone(),
        ws_url: cli.ws_url.clone(),
    })
    .await?;
    let _auth_listener = ctx.bootstrapper.spawn_auth_listener();

    let guard = SessionGuard::watch(ctx.store().bus());
    let result = guard.settle(dispatch(&ctx, cli.command, cli.json).await);
    if let Err(e) = &result {
        debug!(error = ?e, "command failed");
    }

    shutdown_tracing();
    result
}

async fn dispatch(ctx: &AppContext, command: Commands, json: bool) -> anyhow::Result<()> {
    let keeps_session = !matches!(command, Commands::Logout | Commands::Withdraw { .. });

    let result = match command {
        Commands::Login { email } => cli::auth::login(ctx, email, json).await,
        Commands::Oauth { callback_url } => cli::auth::oauth_callback(ctx, &callback_url, json),
        Commands::OauthUrl { provider } => cli::auth::oauth_url(ctx, &provider, json),
        Commands::Logout => cli::auth::logout(ctx, json).await,
        Commands::Withdraw { yes } => cli::auth::withdraw(ctx, yes, json).await,
        Commands::Whoami => cli::auth::whoami(ctx, json).await,
        Commands::Status => cli::status::status(ctx, json).await,

        Commands::Rooms { action } => match action {
            RoomsCommand::List => cli::rooms::list_rooms(ctx, json).await,
            RoomsCommand::Create { name } => cli::rooms::create_room(ctx, name, json).await,
            RoomsCommand::Show { room_id } => cli::rooms::show_room(ctx, RoomId(room_id), json).await,
            RoomsCommand::Rename { room_id, name } => {
                cli::rooms::rename_room(ctx, RoomId(room_id), &name, json).await
            }
            RoomsCommand::Leave { room_id, yes } => {
                cli::rooms::leave_room(ctx, RoomId(room_id), yes, json).await
            }
        },

        Commands::Plans { action } => match action {
            PlansCommand::List { room_id } => cli::plans::list_plans(ctx, RoomId(room_id), json).await,
            PlansCommand::Download {
                room_id,
                plan_id,
                output,
            } => cli::plans::download_plan(ctx, RoomId(room_id), plan_id, output, json).await,
        },

        Commands::Chat { room_id } => cli::chat::loop_runner::run_chat_loop(ctx, RoomId(room_id)).await,

        Commands::Completions { .. } => Ok(()),
    };

    // A refresh during the command may have rotated the cookie.
    if keeps_session {
        ctx.persist_cookies();
    }
    result
}
