//! Main chat loop orchestration.
//!
//! Coordinates the room lifecycle: entry (user, room, history and plans
//! fetched together), realtime connection, the input loop, plan workflow
//! tracking and teardown.

use std::fmt::Display;
use std::io::Write;

use console::style;
use rustyline_async::SharedWriter;
use tokio::sync::mpsc;
use tracing::{info, warn};

use tripmate_core::chat::RoomSession;
use tripmate_core::plan::{InboundSignal, PlanWorkflowTracker};
use tripmate_core::realtime::{ConnectionHandle, RealtimeChannel};
use tripmate_core::session::AuthState;
use tripmate_infra::realtime::StompTransport;
use tripmate_types::chat::{ChatMessage, RoomId};
use tripmate_types::error::{RealtimeError, RoomError};
use tripmate_types::realtime::ConnectionState;

use crate::cli::plans::{download_to, plan_table};
use crate::cli::style::{room_failure, spinner};
use crate::state::{AppContext, ConcreteChatApi};

use super::banner::print_welcome_banner;
use super::commands::{self, ChatCommand};
use super::input::{ChatInput, InputEvent};
use super::renderer::{prompt, render_message, render_notice};

type Channel = RealtimeChannel<StompTransport>;
type Tracker = PlanWorkflowTracker<ConcreteChatApi>;

fn emit(out: &mut SharedWriter, text: impl Display) {
    let _ = writeln!(out, "{text}");
}

async fn connect(
    channel: &Channel,
    room_id: RoomId,
    inbound: &mpsc::UnboundedSender<ChatMessage>,
) -> Result<ConnectionHandle, RealtimeError> {
    let inbound = inbound.clone();
    channel
        .connect(room_id, move |message| {
            let _ = inbound.send(message);
        })
        .await
}

/// What the loop should do after handling a command.
enum Flow {
    Continue,
    Stop,
}

/// Run the interactive chat loop for a room.
pub async fn run_chat_loop(ctx: &AppContext, room_id: RoomId) -> anyhow::Result<()> {
    ctx.require_session().await?;

    let progress = spinner("entering room...");
    let mut session =
        match RoomSession::enter(&ctx.chat, room_id, ctx.config.chat.history_limit).await {
            Ok(session) => session,
            Err(e) => {
                progress.finish_and_clear();
                return Err(room_failure(e));
            }
        };

    let tracker = PlanWorkflowTracker::new(room_id, ctx.chat.clone(), &ctx.config.plan);
    tracker.seed_artifacts(session.plans.clone());

    progress.set_message("connecting...");
    let channel = RealtimeChannel::new(StompTransport::new(&ctx.config.realtime));
    let (inbound_tx, mut inbound_rx) = mpsc::unbounded_channel();
    let connected = connect(&channel, room_id, &inbound_tx).await;
    progress.finish_and_clear();

    print_welcome_banner(
        session.room.display_name(),
        room_id.0,
        &session.user.full_name,
        &session.invite_url(&ctx.config.api.web_origin),
        session.plans.len(),
    );
    for message in session.log.messages() {
        if let Some(line) = render_message(message, session.is_own(&message.sender_user_id)) {
            println!("{line}");
        }
    }

    let mut handle = match connected {
        Ok(handle) => Some(handle),
        Err(e) => {
            println!(
                "  {} Could not connect to the room: {e}. Type /reconnect to retry.",
                style("!").red().bold()
            );
            None
        }
    };

    let mut connection_rx = channel.subscribe_state();
    let mut plan_state_rx = tracker.subscribe_state();
    let mut notice_rx = tracker.subscribe_notice();
    let mut auth_rx = ctx.bootstrapper.subscribe();

    let (mut input, mut out) = ChatInput::new(prompt(channel.state(), tracker.state()))
        .map_err(|e| anyhow::anyhow!("Failed to initialize input: {e}"))?;

    loop {
        tokio::select! {
            event = input.read_line() => match event {
                InputEvent::Eof => {
                    emit(&mut out, style("\n  Session ended.").dim());
                    break;
                }
                InputEvent::Interrupted => {
                    emit(&mut out, style("\n  Press Ctrl+D to exit, or keep chatting.").dim());
                }
                InputEvent::Message(text) => {
                    if text.is_empty() {
                        continue;
                    }
                    if let Some(cmd) = commands::parse(&text) {
                        let flow = run_command(
                            cmd, ctx, &mut session, &tracker, &channel, &inbound_tx,
                            &mut handle, &mut input, &mut out,
                        )
                        .await;
                        match flow {
                            Flow::Continue => continue,
                            Flow::Stop => break,
                        }
                    }
                    send_message(&text, &session, &tracker, &channel, &mut out).await;
                }
            },

            Some(message) = inbound_rx.recv() => {
                if let Some(line) = render_message(&message, session.is_own(&message.sender_user_id)) {
                    emit(&mut out, line);
                }
                session.log.push_realtime(message.clone());
                match tracker.on_inbound(&message).await {
                    InboundSignal::Ready | InboundSignal::Refreshed => {
                        let count = tracker.artifacts().len();
                        emit(
                            &mut out,
                            format!(
                                "  {} Travel plan ready ({count} available). Type /plans to see them.",
                                style("✈").magenta().bold()
                            ),
                        );
                    }
                    InboundSignal::Failed
                    | InboundSignal::NotPlanner
                    | InboundSignal::Ignored => {}
                }
            }

            Ok(()) = connection_rx.changed() => {
                let state = *connection_rx.borrow_and_update();
                input.update_prompt(&prompt(state, tracker.state()));
                if state == ConnectionState::Disconnected && handle.is_some() {
                    handle = None;
                    emit(
                        &mut out,
                        format!(
                            "  {} Connection lost. Type /reconnect to rejoin.",
                            style("!").yellow().bold()
                        ),
                    );
                }
            }

            Ok(()) = plan_state_rx.changed() => {
                let state = *plan_state_rx.borrow_and_update();
                input.update_prompt(&prompt(channel.state(), state));
            }

            Ok(()) = notice_rx.changed() => {
                let notice = notice_rx.borrow_and_update().clone();
                if let Some(notice) = notice {
                    emit(&mut out, render_notice(&notice));
                }
            }

            Ok(()) = auth_rx.changed() => {
                if *auth_rx.borrow_and_update() == AuthState::Unauthenticated {
                    emit(
                        &mut out,
                        format!(
                            "  {} Your session has expired. Run `tripmate login` to continue.",
                            style("!").red().bold()
                        ),
                    );
                    break;
                }
            }
        }
    }

    tracker.leave();
    if let Some(handle) = handle {
        channel.disconnect(handle).await;
    }
    input.finish();
    info!(%room_id, "left chat loop");
    Ok(())
}

async fn send_message(
    text: &str,
    session: &RoomSession,
    tracker: &Tracker,
    channel: &Channel,
    out: &mut SharedWriter,
) {
    if !channel.state().is_connected() {
        emit(
            out,
            format!(
                "  {} Not connected. Type /reconnect first.",
                style("!").yellow().bold()
            ),
        );
        return;
    }
    let Some(outgoing) = session.outgoing(text) else {
        return;
    };
    if let Err(e) = channel.send_to_room(&outgoing).await {
        warn!(error = %e, "send failed");
        emit(out, format!("  {} Message not sent: {e}", style("!").red().bold()));
        return;
    }
    if tracker.on_outgoing(text) {
        emit(
            out,
            style("  ✈ Asked the planner. This can take a while; keep chatting.").magenta(),
        );
    }
}

#[allow(clippy::too_many_arguments)]
async fn run_command(
    cmd: ChatCommand,
    ctx: &AppContext,
    session: &mut RoomSession,
    tracker: &Tracker,
    channel: &Channel,
    inbound: &mpsc::UnboundedSender<ChatMessage>,
    handle: &mut Option<ConnectionHandle>,
    input: &mut ChatInput,
    out: &mut SharedWriter,
) -> Flow {
    let room_id = session.room_id();
    match cmd {
        ChatCommand::Help => emit(out, commands::help_text()),
        ChatCommand::Clear => input.clear(),
        ChatCommand::Rename(name) => match session.rename(&ctx.chat, &name).await {
            Ok(true) => emit(
                out,
                format!(
                    "  {} Room renamed to {}",
                    style("✓").green().bold(),
                    style(session.room.display_name()).cyan()
                ),
            ),
            Ok(false) => emit(out, style("  Name unchanged.").dim()),
            Err(RoomError::PermissionDenied) => emit(
                out,
                format!(
                    "  {} Only the room owner can rename this room.",
                    style("!").red().bold()
                ),
            ),
            Err(e) => emit(out, format!("  {} {}", style("!").red().bold(), room_failure(e))),
        },
        ChatCommand::Plans => {
            let plans = tracker.artifacts();
            if plans.is_empty() {
                emit(out, style("  No plans yet. Ask the planner, e.g. \"일정 짜줘\".").dim());
            } else {
                emit(out, plan_table(&plans));
            }
        }
        ChatCommand::Download { plan_id, path } => {
            match download_to(&ctx.chat, room_id, &tracker.artifacts(), plan_id, path).await {
                Ok(path) => emit(
                    out,
                    format!(
                        "  {} Saved to {}",
                        style("✓").green().bold(),
                        style(path.display()).cyan()
                    ),
                ),
                Err(e) => emit(out, format!("  {} {e}", style("!").red().bold())),
            }
        }
        ChatCommand::Invite => emit(
            out,
            format!(
                "  {}  {}",
                style("Invite:").bold(),
                style(session.invite_url(&ctx.config.api.web_origin)).underlined()
            ),
        ),
        ChatCommand::Status => emit(
            out,
            format!(
                "  {} {} · connection {} · plan {} · {} messages · {} plans",
                style("Room").bold(),
                session.room.display_name(),
                channel.state(),
                tracker.state(),
                session.log.len(),
                tracker.artifacts().len()
            ),
        ),
        ChatCommand::Reconnect => {
            if channel.state().is_connected() {
                emit(out, style("  Already connected.").dim());
            } else {
                match connect(channel, room_id, inbound).await {
                    Ok(new_handle) => {
                        *handle = Some(new_handle);
                        emit(out, format!("  {} Reconnected.", style("✓").green().bold()));
                    }
                    Err(e) => emit(out, format!("  {} Reconnect failed: {e}", style("!").red().bold())),
                }
            }
        }
        ChatCommand::Leave => match ctx.chat.leave_room(room_id).await {
            Ok(()) => {
                emit(out, format!("  {} Left the room.", style("✓").green().bold()));
                return Flow::Stop;
            }
            Err(e) => emit(out, format!("  {} {}", style("!").red().bold(), e.hint())),
        },
        ChatCommand::Exit => {
            emit(out, style("\n  Session ended.").dim());
            return Flow::Stop;
        }
        ChatCommand::Unknown(name) => emit(
            out,
            format!(
                "  {} Unknown command: {}. Type /help for available commands.",
                style("?").yellow().bold(),
                style(name).dim()
            ),
        ),
    }
    Flow::Continue
}
