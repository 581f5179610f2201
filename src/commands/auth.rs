use anyhow::Result;
use dialoguer::Input;
use owo_colors::OwoColorize;

use crate::commands::{print_done, require_member};
use crate::context::AppContext;
use crate::render::Render;
use crate::session;
use crate::utils::tui::{is_interactive, with_spinner};

pub async fn login(ctx: &AppContext, email: Option<String>) -> Result<()> {
    let email = match email {
        Some(e) => e,
        None if is_interactive() => Input::<String>::new()
            .with_prompt("  Email")
            .interact_text()?,
        None => anyhow::bail!("Email and password are required."),
    };
    let password = rpassword::prompt_password("  Password: ")?;

    let session = with_spinner("Signing in...", ctx.actions.sign_in(&email, &password)).await?;
    session::save(&session)?;

    print_done(&format!(
        "Signed in as {}",
        session.user.email.as_deref().unwrap_or(&session.user.id)
    ));
    Ok(())
}

pub async fn logout(ctx: &AppContext) -> Result<()> {
    if ctx.actions.current_user().await?.is_none() {
        session::clear()?;
        println!("{}", "  Not signed in".dimmed());
        return Ok(());
    }

    // The local session goes regardless of what the server says
    let result = with_spinner("Signing out...", ctx.actions.sign_out()).await;
    session::clear()?;
    if let Err(e) = result {
        tracing::warn!(error = %e, "server sign-out failed");
    }

    print_done("Signed out");
    Ok(())
}

pub async fn whoami(ctx: &AppContext) -> Result<()> {
    let Some(user) = ctx.actions.current_user().await? else {
        println!("{}", "  Not signed in".dimmed());
        return Ok(());
    };

    let email = user.email.as_deref().unwrap_or(&user.id);
    match ctx.actions.current_profile().await? {
        Some(profile) => println!("  {} {}", profile.render(), email.dimmed()),
        None => println!("  {} {}", email, "(no profile)".dimmed()),
    }
    Ok(())
}

/// Change the display name and/or the password.
pub async fn account(ctx: &AppContext, username: Option<String>, password: bool) -> Result<()> {
    require_member(ctx).await?;

    if username.is_none() && !password {
        anyhow::bail!("Nothing to change. Use --username <name> or --password");
    }

    if let Some(username) = username {
        let name = with_spinner("Saving username...", ctx.actions.rename(&username)).await?;
        print_done(&format!("Username changed to {name}"));
    }

    if password {
        let current = rpassword::prompt_password("  Current password: ")?;
        let new_password = rpassword::prompt_password("  New password: ")?;
        let confirm = rpassword::prompt_password("  Confirm new password: ")?;

        with_spinner(
            "Updating password...",
            ctx.actions
                .change_password(Some(&current), &new_password, &confirm),
        )
        .await?;
        print_done("Password updated");
    }

    Ok(())
}
