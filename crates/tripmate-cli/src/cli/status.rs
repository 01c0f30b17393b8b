//! Configuration and session status command.

use anyhow::Result;
use console::style;

use tripmate_core::session::AuthState;

use crate::state::AppContext;

/// Display endpoints, data directory and whether a session is active.
///
/// Runs the start-up session check, so an expired access token with a valid
/// refresh cookie still reports as logged in.
pub async fn status(ctx: &AppContext, json: bool) -> Result<()> {
    let auth = ctx.bootstrapper.run().await;
    let email = ctx.store().get().and_then(|c| c.subject_email.clone());

    if json {
        let status = serde_json::json!({
            "version": env!("CARGO_PKG_VERSION"),
            "data_dir": ctx.data_dir.display().to_string(),
            "api_url": ctx.config.api.base_url,
            "ws_url": ctx.config.realtime.url,
            "web_origin": ctx.config.api.web_origin,
            "authenticated": auth.is_authenticated(),
            "email": email,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!();
    println!(
        "  {} Tripmate v{}",
        style("✈").bold(),
        env!("CARGO_PKG_VERSION")
    );
    println!();
    println!("  {}      {}", style("API:").bold(), ctx.config.api.base_url);
    println!("  {} {}", style("Realtime:").bold(), ctx.config.realtime.url);
    println!("  {}      {}", style("Web:").bold(), ctx.config.api.web_origin);
    println!("  {}     {}", style("Data:").bold(), ctx.data_dir.display());
    println!();

    let session = match auth {
        AuthState::Authenticated => format!(
            "{} logged in{}",
            style("●").green(),
            email.map(|e| format!(" as {e}")).unwrap_or_default()
        ),
        AuthState::Unauthenticated | AuthState::Pending => {
            format!("{} not logged in", style("○").yellow())
        }
    };
    println!("  {}  {}", style("Session:").bold(), session);
    println!();
    Ok(())
}
