//! Login, logout, withdrawal and identity commands.

use anyhow::Result;
use console::style;
use dialoguer::{Confirm, Input, Password};
use secrecy::SecretString;

use tripmate_core::auth::oauth::{authorization_url, complete_callback};
use tripmate_types::error::AuthError;

use crate::state::AppContext;

use super::style::{http_failure, print_success, spinner};

fn auth_failure(error: AuthError) -> anyhow::Error {
    match error {
        AuthError::Http(e) if e.status() == Some(401) => {
            anyhow::anyhow!("Email or password is incorrect.")
        }
        AuthError::Http(e) => http_failure(e),
        other => anyhow::Error::new(other),
    }
}

/// Log in with email and password (prompted interactively).
pub async fn login(ctx: &AppContext, email: Option<String>, json: bool) -> Result<()> {
    let email = match email {
        Some(email) => email,
        None => Input::<String>::new()
            .with_prompt("Email")
            .validate_with(|input: &String| -> Result<(), &str> {
                if input.contains('@') {
                    Ok(())
                } else {
                    Err("Enter a valid email address")
                }
            })
            .interact_text()?,
    };
    let password = SecretString::from(Password::new().with_prompt("Password").interact()?);

    let progress = spinner("logging in...");
    let result = ctx.auth.login(email.trim(), &password).await;
    progress.finish_and_clear();
    let credential = result.map_err(auth_failure)?;

    if json {
        let out = serde_json::json!({
            "authenticated": true,
            "email": credential.subject_email,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    print_success(&format!(
        "Logged in as {}",
        style(credential.subject_email.as_deref().unwrap_or(email.trim())).cyan()
    ));
    Ok(())
}

/// Finish a social login from the redirect URL.
pub fn oauth_callback(ctx: &AppContext, callback_url: &str, json: bool) -> Result<()> {
    let credential = complete_callback(callback_url, ctx.store()).map_err(auth_failure)?;

    if json {
        let out = serde_json::json!({
            "authenticated": true,
            "email": credential.subject_email,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    match &credential.subject_email {
        Some(email) => print_success(&format!("Logged in as {}", style(email).cyan())),
        None => print_success("Logged in"),
    }
    Ok(())
}

/// Print the social login entry URL.
pub fn oauth_url(ctx: &AppContext, provider: &str, json: bool) -> Result<()> {
    let url = authorization_url(&ctx.config.api.base_url, provider)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&serde_json::json!({ "url": url.as_str() }))?);
        return Ok(());
    }

    println!();
    println!("  Open this URL in a browser to sign in with {provider}:");
    println!();
    println!("  {}", style(url.as_str()).cyan().underlined());
    println!();
    println!(
        "  {}",
        style("Then run `tripmate oauth <redirected-url>` with the address you land on.").dim()
    );
    println!();
    Ok(())
}

pub async fn logout(ctx: &AppContext, json: bool) -> Result<()> {
    let result = ctx.auth.logout().await;
    ctx.forget_session();

    if json {
        let out = serde_json::json!({
            "logged_out": true,
            "server_error": result.as_ref().err().map(|e| e.to_string()),
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    if let Err(e) = result {
        println!();
        println!(
            "  {} Server did not confirm the logout: {}",
            style("!").yellow().bold(),
            e.hint()
        );
    }
    print_success("Logged out");
    Ok(())
}

/// Delete the account after confirmation.
pub async fn withdraw(ctx: &AppContext, yes: bool, json: bool) -> Result<()> {
    ctx.require_session().await?;

    if !yes {
        let confirmed = Confirm::new()
            .with_prompt("Delete your account permanently? This cannot be undone")
            .default(false)
            .interact()?;
        if !confirmed {
            println!("  Cancelled.");
            return Ok(());
        }
    }

    let result = ctx.auth.withdraw().await;
    ctx.forget_session();
    result.map_err(http_failure)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&serde_json::json!({ "withdrawn": true }))?);
        return Ok(());
    }
    print_success("Account deleted");
    Ok(())
}

pub async fn whoami(ctx: &AppContext, json: bool) -> Result<()> {
    ctx.require_session().await?;
    let user = ctx.chat.user_info().await.map_err(http_failure)?;
    let email = ctx.store().get().and_then(|c| c.subject_email.clone());

    if json {
        let out = serde_json::json!({
            "user_id": user.user_id,
            "full_name": user.full_name,
            "email": email,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!();
    println!("  {}  {}", style("Name:").bold(), style(&user.full_name).cyan());
    println!("  {}    {}", style("ID:").bold(), user.user_id);
    if let Some(email) = email {
        println!("  {} {}", style("Email:").bold(), email);
    }
    println!();
    Ok(())
}
