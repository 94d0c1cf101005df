use anyhow::{Context as _, Result};
use colored::Colorize;
use inti_client::auth;
use inti_client::client::Registration;
use inti_client::extract;

use crate::cli::{LoginArgs, RegisterArgs};
use crate::context::Context;
use crate::output::{print_error, print_success};

pub async fn login(ctx: &Context, args: &LoginArgs) -> Result<()> {
    let email = args.email.as_deref().context("--email is required")?;
    let password = args
        .password
        .as_deref()
        .context("--password is required (or set INTI_PASSWORD)")?;

    let session = auth::login(&ctx.client, ctx.store.as_ref(), email.trim(), password).await?;
    let who = session
        .user
        .as_ref()
        .and_then(extract::username)
        .unwrap_or_else(|| email.trim().to_string());
    print_success(&format!(
        "Logged in to {} as {}",
        ctx.base_url().cyan(),
        who.cyan()
    ));
    Ok(())
}

pub async fn register(ctx: &Context, args: &RegisterArgs) -> Result<()> {
    let username =
        extract::sanitize_username(&args.username).context("Username must not be empty")?;
    let registration = Registration {
        name: args.name.trim().to_string(),
        username,
        email: args.email.trim().to_string(),
        password: args.password.clone(),
        kind: args.kind.as_str().to_string(),
    };

    auth::register(&ctx.client, ctx.store.as_ref(), &registration).await?;
    print_success(&format!(
        "Registered {} on {}",
        format!("@{}", registration.username).cyan(),
        ctx.base_url().cyan()
    ));
    Ok(())
}

pub fn logout(ctx: &Context, profile: &str) -> Result<()> {
    if auth::logout(ctx.store.as_ref())? {
        print_success("Logged out (session removed)");
    } else {
        println!("No session found for profile \"{profile}\"");
    }
    Ok(())
}

pub async fn whoami(ctx: &Context, profile: &str) -> Result<()> {
    if !ctx.session.is_authenticated() {
        print_error(&format!("Not logged in (profile: \"{profile}\")"));
        return Ok(());
    }

    let identity = auth::resolve_self(&ctx.client, &ctx.session).await?;
    println!("{}: {}", "Profile".cyan(), profile);
    println!("{}: {}", "Server".cyan(), ctx.base_url().cyan());
    println!(
        "{}: {}",
        "Username".cyan(),
        identity
            .username
            .as_deref()
            .map_or_else(|| "(unknown)".to_string(), |u| format!("@{u}"))
    );
    println!(
        "{}: {}",
        "Profile ID".cyan(),
        identity
            .id
            .as_ref()
            .map_or_else(|| "(unknown)".to_string(), |id| id.to_string())
    );
    if let Some(email) = ctx
        .session
        .user
        .as_ref()
        .and_then(|u| u.get("email"))
        .and_then(|v| v.as_str())
    {
        println!("{}: {}", "Email".cyan(), email);
    }
    Ok(())
}
