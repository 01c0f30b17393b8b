//! Room management commands.

use anyhow::Result;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;
use dialoguer::Confirm;

use tripmate_core::chat::invite_url;
use tripmate_types::chat::{DEFAULT_ROOM_NAME, RoomId};
use tripmate_types::error::RoomError;

use crate::state::AppContext;

use super::style::{format_datetime, http_failure, print_info, print_success, room_failure, truncate};

pub async fn list_rooms(ctx: &AppContext, json: bool) -> Result<()> {
    ctx.require_session().await?;
    let rooms = ctx.chat.list_rooms().await.map_err(http_failure)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&rooms)?);
        return Ok(());
    }

    if rooms.is_empty() {
        println!();
        println!(
            "  {} No rooms yet. Create one with: {}",
            style("i").blue().bold(),
            style("tripmate rooms create <name>").yellow()
        );
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("ID").fg(Color::White),
        Cell::new("Name").fg(Color::White),
        Cell::new("Created By").fg(Color::White),
        Cell::new("Created").fg(Color::White),
    ]);

    for room in &rooms {
        table.add_row(vec![
            Cell::new(room.id).fg(Color::Cyan),
            Cell::new(truncate(room.display_name(), 40)),
            Cell::new(room.created_by_user_name.as_deref().unwrap_or("-")),
            Cell::new(format_datetime(room.created_at)).fg(Color::DarkGrey),
        ]);
    }

    println!();
    println!("{table}");
    println!();
    println!(
        "  {} room{}",
        rooms.len(),
        if rooms.len() == 1 { "" } else { "s" }
    );
    println!();
    Ok(())
}

pub async fn create_room(ctx: &AppContext, name: Option<String>, json: bool) -> Result<()> {
    ctx.require_session().await?;
    let name = name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| DEFAULT_ROOM_NAME.to_string());
    let room = ctx.chat.create_room(&name).await.map_err(http_failure)?;
    let invite = invite_url(&ctx.config.api.web_origin, room.id);

    if json {
        let out = serde_json::json!({ "room": room, "invite_url": invite });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    print_success(&format!(
        "Created room {} ({})",
        style(room.display_name()).cyan().bold(),
        room.id
    ));
    println!("  {}  {}", style("Invite:").bold(), style(&invite).underlined());
    println!(
        "  {}",
        style(format!("Start chatting with: tripmate chat {}", room.id)).dim()
    );
    println!();
    Ok(())
}

pub async fn show_room(ctx: &AppContext, room_id: RoomId, json: bool) -> Result<()> {
    ctx.require_session().await?;
    let (room, plans) = tokio::join!(ctx.chat.get_room(room_id), ctx.chat.list_plans(room_id));
    let room = room.map_err(room_failure)?;
    let plans = plans.unwrap_or_default();
    let invite = invite_url(&ctx.config.api.web_origin, room.id);

    if json {
        let out = serde_json::json!({
            "room": room,
            "plans": plans,
            "invite_url": invite,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!();
    println!("  {}", style(room.display_name()).cyan().bold());
    println!();
    println!("  {}         {}", style("ID:").bold(), room.id);
    if let Some(owner) = &room.created_by_user_name {
        println!("  {} {}", style("Created by:").bold(), owner);
    }
    println!("  {}    {}", style("Created:").bold(), format_datetime(room.created_at));
    println!("  {}      {}", style("Plans:").bold(), plans.len());
    println!("  {}     {}", style("Invite:").bold(), style(&invite).underlined());
    println!();
    Ok(())
}

pub async fn rename_room(ctx: &AppContext, room_id: RoomId, name: &str, json: bool) -> Result<()> {
    ctx.require_session().await?;
    let name = match name.trim() {
        "" => DEFAULT_ROOM_NAME,
        trimmed => trimmed,
    };

    let updated = match ctx.chat.rename_room(room_id, name).await {
        Ok(updated) => updated,
        Err(RoomError::PermissionDenied) => {
            anyhow::bail!("Only the room owner can rename this room.")
        }
        Err(e) => return Err(room_failure(e)),
    };
    let shown = updated
        .as_ref()
        .map(|room| room.display_name().to_string())
        .unwrap_or_else(|| name.to_string());

    if json {
        let out = serde_json::json!({ "id": room_id, "name": shown });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    print_success(&format!("Room {room_id} renamed to {}", style(shown).cyan()));
    Ok(())
}

pub async fn leave_room(ctx: &AppContext, room_id: RoomId, yes: bool, json: bool) -> Result<()> {
    ctx.require_session().await?;

    if !yes {
        let confirmed = Confirm::new()
            .with_prompt(format!("Leave room {room_id}?"))
            .default(false)
            .interact()?;
        if !confirmed {
            print_info("Cancelled.");
            return Ok(());
        }
    }

    ctx.chat.leave_room(room_id).await.map_err(http_failure)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&serde_json::json!({ "left": room_id }))?);
        return Ok(());
    }
    print_success(&format!("Left room {room_id}"));
    Ok(())
}
