//! Plan listing and download commands.

use std::path::{Path, PathBuf};

use anyhow::Result;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;

use tripmate_core::chat::ChatApi;
use tripmate_core::http::HttpTransport;
use tripmate_types::chat::RoomId;
use tripmate_types::error::HttpError;
use tripmate_types::plan::PlanArtifact;

use crate::state::AppContext;

use super::style::{format_datetime, http_failure, print_success, spinner};

/// Render plan artifacts as a table.
pub fn plan_table(plans: &[PlanArtifact]) -> Table {
    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("ID").fg(Color::White),
        Cell::new("File").fg(Color::White),
        Cell::new("Created").fg(Color::White),
        Cell::new("Status").fg(Color::White),
    ]);

    for plan in plans {
        let status = if plan.downloadable {
            Cell::new("● available").fg(Color::Green)
        } else {
            Cell::new("◌ expired").fg(Color::DarkGrey)
        };
        table.add_row(vec![
            Cell::new(plan.id).fg(Color::Cyan),
            Cell::new(&plan.file_name),
            Cell::new(format_datetime(plan.created_at)).fg(Color::DarkGrey),
            status,
        ]);
    }
    table
}

/// Where a downloaded plan is written: `output`, or the artifact's own file
/// name (without any directory part) in the working directory.
pub fn output_path(artifact: &PlanArtifact, output: Option<PathBuf>) -> PathBuf {
    output.unwrap_or_else(|| {
        Path::new(&artifact.file_name)
            .file_name()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(format!("plan-{}.pdf", artifact.id)))
    })
}

/// Download `plan_id` from `room_id` into `output`. Returns the path written.
pub async fn download_to<T: HttpTransport>(
    api: &ChatApi<T>,
    room_id: RoomId,
    plans: &[PlanArtifact],
    plan_id: i64,
    output: Option<PathBuf>,
) -> Result<PathBuf> {
    let artifact = plans
        .iter()
        .find(|p| p.id == plan_id)
        .ok_or_else(|| anyhow::anyhow!("Plan {plan_id} is not in room {room_id}."))?;

    let bytes = match api.download_plan(room_id, artifact).await {
        Ok(bytes) => bytes,
        Err(HttpError::PlanExpired) => {
            anyhow::bail!("Plan {plan_id} has expired and can no longer be downloaded.")
        }
        Err(e) => return Err(http_failure(e)),
    };

    let path = output_path(artifact, output);
    tokio::fs::write(&path, &bytes).await?;
    Ok(path)
}

pub async fn list_plans(ctx: &AppContext, room_id: RoomId, json: bool) -> Result<()> {
    ctx.require_session().await?;
    let plans = ctx.chat.list_plans(room_id).await.map_err(http_failure)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&plans)?);
        return Ok(());
    }

    if plans.is_empty() {
        println!();
        println!(
            "  {} No plans yet. Ask the planner in {} to make one.",
            style("i").blue().bold(),
            style(format!("tripmate chat {room_id}")).yellow()
        );
        println!();
        return Ok(());
    }

    println!();
    println!("{}", plan_table(&plans));
    println!();
    Ok(())
}

pub async fn download_plan(
    ctx: &AppContext,
    room_id: RoomId,
    plan_id: i64,
    output: Option<PathBuf>,
    json: bool,
) -> Result<()> {
    ctx.require_session().await?;
    let plans = ctx.chat.list_plans(room_id).await.map_err(http_failure)?;

    let progress = spinner("downloading...");
    let result = download_to(&ctx.chat, room_id, &plans, plan_id, output).await;
    progress.finish_and_clear();
    let path = result?;

    if json {
        let out = serde_json::json!({ "plan_id": plan_id, "path": path.display().to_string() });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }
    print_success(&format!("Saved plan to {}", style(path.display()).cyan()));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn artifact(file_name: &str) -> PlanArtifact {
        PlanArtifact {
            id: 7,
            file_name: file_name.to_string(),
            created_at: None,
            downloadable: true,
            download_url: None,
        }
    }

    #[test]
    fn output_defaults_to_file_name() {
        assert_eq!(output_path(&artifact("jeju.pdf"), None), PathBuf::from("jeju.pdf"));
    }

    #[test]
    fn output_strips_directories_from_server_name() {
        assert_eq!(
            output_path(&artifact("../../etc/jeju.pdf"), None),
            PathBuf::from("jeju.pdf")
        );
        assert_eq!(output_path(&artifact(".."), None), PathBuf::from("plan-7.pdf"));
    }

    #[test]
    fn explicit_output_wins() {
        let out = PathBuf::from("/tmp/trip.pdf");
        assert_eq!(output_path(&artifact("jeju.pdf"), Some(out.clone())), out);
    }

    #[test]
    fn table_marks_expired_plans() {
        let mut expired = artifact("old.pdf");
        expired.downloadable = false;
        let rendered = plan_table(&[artifact("jeju.pdf"), expired]).to_string();
        assert!(rendered.contains("available"));
        assert!(rendered.contains("expired"));
    }
}
