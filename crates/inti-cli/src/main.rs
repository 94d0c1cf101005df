mod cli;
mod commands;
mod config;
mod context;
mod output;

use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use inti_client::{FileSessionStore, SessionStore};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use cli::{Cli, Commands};
use context::Context;
use output::print_error;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    if let Err(e) = run(&cli).await {
        if context::is_session_expired(&e) {
            expire_session(&cli.profile);
            print_error("Session expired. Log in again with: inti login --email <email>");
        } else {
            print_error(&format!("{e:#}"));
        }
        std::process::exit(1);
    }
}

/// Logs go to stderr so they never mix with command output.
fn init_tracing(level: &str) {
    let filter = std::env::var("RUST_LOG")
        .ok()
        .and_then(|_| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new(level));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

fn expire_session(profile: &str) {
    let cleared = FileSessionStore::for_profile(profile).and_then(|store| store.clear());
    if let Err(e) = cleared {
        tracing::warn!(error = %e, "failed to clear expired session");
    }
}

async fn run(cli: &Cli) -> Result<()> {
    let profile = &cli.profile;

    if let Commands::Config(args) = &cli.command {
        return configure(profile, &args.command);
    }

    let ctx = Context::load(cli)?;
    match &cli.command {
        Commands::Login(args) => commands::auth::login(&ctx, args).await?,
        Commands::Register(args) => commands::auth::register(&ctx, args).await?,
        Commands::Logout => commands::auth::logout(&ctx, profile)?,
        Commands::Whoami => commands::auth::whoami(&ctx, profile).await?,
        Commands::Profile(args) => commands::profile::show(&ctx, args).await?,
        Commands::EditProfile(args) => commands::profile::edit(&ctx, args).await?,
        Commands::Search(args) => commands::social::search(&ctx, args).await?,
        Commands::Follow(args) => commands::social::set_following(&ctx, &args.username, true).await?,
        Commands::Unfollow(args) => {
            commands::social::set_following(&ctx, &args.username, false).await?
        }
        Commands::Feed(args) => commands::social::feed(&ctx, args).await?,
        Commands::Post(args) => commands::social::post(&ctx, &args.command).await?,
        Commands::Products(args) => commands::products::run(&ctx, &args.command).await?,
        Commands::Events(args) => commands::events::run(&ctx, &args.command).await?,
        Commands::Config(_) => {}
    }

    Ok(())
}

fn configure(profile: &str, command: &cli::ConfigCommands) -> Result<()> {
    match command {
        cli::ConfigCommands::Show => {
            let cfg = config::load_profile(profile)?;
            println!("{}: {}", "Profile".cyan(), profile);
            println!(
                "{}: {}",
                "Server".cyan(),
                cfg.server.as_deref().unwrap_or("(not set)")
            );
            println!(
                "{}: {}",
                "Format".cyan(),
                cfg.format.as_deref().unwrap_or("json")
            );
        }
        cli::ConfigCommands::Set(set_args) => {
            let mut cfg = config::load_profile(profile)?;
            match set_args.key.as_str() {
                "server" => cfg.server = Some(set_args.value.clone()),
                "format" => {
                    <cli::OutputFormat as clap::ValueEnum>::from_str(&set_args.value, true)
                        .map_err(|e| anyhow::anyhow!("Invalid format: {e}"))?;
                    cfg.format = Some(set_args.value.clone());
                }
                other => {
                    anyhow::bail!("Unknown config key: {other}. Valid keys: server, format")
                }
            }
            config::save_profile(profile, &cfg)?;
            output::print_success(&format!("Set {} = {}", set_args.key, set_args.value));
        }
    }
    Ok(())
}
