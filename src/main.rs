//! # Leadwire: sheet-to-Telegram lead relay
//!
//! Watches a Google Sheet for appended rows and relays each one to the
//! right Telegram chat with a one-tap claim button; the claimant's name is
//! written back into the sheet.
//!
//! Usage:
//!   leadwire                # watch and relay (default)
//!   leadwire login          # run the Google device-flow authorization
//!   leadwire status         # show config and credential state

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use leadwire_core::LeadwireConfig;
use leadwire_relay::{RelayEngine, run_detection_loop, run_inbound_loop};
use leadwire_sheets::{SheetsClient, TokenManager};
use leadwire_telegram::BotClient;

#[derive(Parser)]
#[command(
    name = "leadwire",
    version,
    about = "📋 Leadwire relays new sheet rows to Telegram, one tap to claim"
)]
struct Cli {
    /// Path to config.toml (default: ~/.leadwire/config.toml)
    #[arg(short, long)]
    config: Option<String>,

    /// Verbose logging
    #[arg(short, long)]
    debug: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Watch the sheet and relay new rows (default)
    Run,
    /// Run the Google device-flow authorization and exit
    Login,
    /// Show config and credential state
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_target(false)
        .init();

    let (config_path, config) = match &cli.config {
        Some(path) => {
            let path = PathBuf::from(path);
            let config = LeadwireConfig::load_from(&path)?;
            (path, config)
        }
        None => (LeadwireConfig::default_path(), load_or_init_config()?),
    };

    let tokens = TokenManager::new(&config.google, LeadwireConfig::token_path());

    match cli.command.unwrap_or(Command::Run) {
        Command::Login => login(&config, &tokens).await,
        Command::Status => status(&config, &tokens, &config_path).await,
        Command::Run => run(config, tokens).await,
    }
}

/// Load the default config, writing a starter file on first run.
fn load_or_init_config() -> Result<LeadwireConfig> {
    let path = LeadwireConfig::default_path();
    if !path.exists() {
        LeadwireConfig::default().save()?;
        println!("📝 Wrote a starter config to {}", path.display());
        println!("   Fill in [telegram] and [google], then start again.");
    }
    Ok(LeadwireConfig::load()?)
}

async fn login(config: &LeadwireConfig, tokens: &TokenManager) -> Result<()> {
    if config.google.client_id.is_empty() || config.google.client_secret.is_empty() {
        anyhow::bail!("google.client_id / client_secret missing; fill in the config first");
    }
    tokens.login_device_flow().await?;
    println!("✅ Authorized. Token saved to {}", LeadwireConfig::token_path().display());
    Ok(())
}

async fn status(config: &LeadwireConfig, tokens: &TokenManager, config_path: &Path) -> Result<()> {
    println!("📋 Leadwire v{}", env!("CARGO_PKG_VERSION"));
    println!("   Config:   {}", config_path.display());
    println!("   Sheet:    {} ({})", config.google.spreadsheet_id, sheet_label(config));
    println!(
        "   Routing:  {} mapped locality(ies), fallback {}",
        config.routing.chats.len(),
        config.telegram.default_chat
    );
    if tokens.load().await {
        if let Some(cred) = tokens.snapshot().await {
            let state = if cred.is_expired() { "EXPIRED" } else { "valid" };
            println!("   Token:    {state} (expires_at {})", cred.expires_at);
        }
    } else {
        println!("   Token:    none, run `leadwire login`");
    }
    match config.validate() {
        Ok(()) => println!("   Checks:   config OK"),
        Err(e) => println!("   Checks:   ⚠️  {e}"),
    }
    Ok(())
}

async fn run(config: LeadwireConfig, tokens: TokenManager) -> Result<()> {
    config.validate()?;

    // Credential bootstrap: stored token, else the device flow. A dead
    // refresh token also falls back to the device flow, but only here at
    // startup; inside the loops it just skips ticks.
    if !tokens.load().await {
        println!("🔑 No stored Google credential, starting device authorization");
        tokens.login_device_flow().await?;
    }
    if tokens.is_expired().await && !tokens.refresh().await? {
        tracing::warn!("⚠️ Stored credential is dead, re-authorizing");
        tokens.login_device_flow().await?;
    }

    let bot = BotClient::new(config.telegram.bot_token.clone());
    match bot.get_me().await {
        Ok(me) => tracing::info!("🤖 Bot: {}", me.display_name()),
        Err(e) => tracing::warn!("⚠️ getMe failed (bot token wrong?): {e}"),
    }

    println!("📋 Leadwire v{}", env!("CARGO_PKG_VERSION"));
    println!("   Sheet:    {} ({})", config.google.spreadsheet_id, sheet_label(&config));
    println!(
        "   Polling:  updates every {}s, leads every {}s",
        config.telegram.poll_interval_secs, config.sheet.poll_interval_secs
    );
    println!(
        "   Routing:  {} mapped locality(ies), fallback {}",
        config.routing.chats.len(),
        config.telegram.default_chat
    );
    println!();

    let sheets = SheetsClient::new(config.google.spreadsheet_id.clone(), tokens.clone());
    let engine = Arc::new(RelayEngine::new(config, bot, sheets, tokens)?);
    engine.seed().await?;
    let inbound = tokio::spawn(run_inbound_loop(engine.clone()));
    let detection = tokio::spawn(run_detection_loop(engine.clone()));

    tokio::signal::ctrl_c().await?;
    tracing::info!("👋 Shutting down");
    inbound.abort();
    detection.abort();
    Ok(())
}

fn sheet_label(config: &LeadwireConfig) -> String {
    format!(
        "{}!{}{}:{}{}",
        config.sheet.name,
        config.sheet.first_column,
        config.sheet.start_row,
        config.sheet.last_column,
        config.sheet.last_row
    )
}
