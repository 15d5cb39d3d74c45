mod config_commands;

use std::path::PathBuf;

use {
    anyhow::Context as _,
    clap::{Parser, Subcommand},
    rollcall_discord::DiscordConfig,
    tracing::{info, warn},
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

#[derive(Parser)]
#[command(name = "rollcall", about = "Rollcall, a Discord ready-check bot")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Config file (defaults to ./rollcall.toml, then the user config dir).
    #[arg(long, global = true, env = "ROLLCALL_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Connect to Discord and serve ready checks (default).
    Run,
    /// Print the slash-command definitions as JSON.
    Commands,
    /// Print the text of the `/help` reply.
    HelpText,
    /// Configuration management.
    Config {
        #[command(subcommand)]
        action: config_commands::ConfigAction,
    },
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(fmt::layer().json().with_target(true).with_thread_ids(false))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true),
            )
            .init();
    }
}

async fn run(config_path: Option<PathBuf>) -> anyhow::Result<()> {
    let mut config = rollcall_config::discover_and_load(config_path.as_deref())?;
    rollcall_config::apply_env_overrides(&mut config);

    let discord = DiscordConfig::from_value(config.discord.clone())?;
    let cancel = rollcall_discord::start(discord, config.checks.clone())
        .await
        .context("failed to start discord bot")?;

    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                warn!(error = %e, "failed to listen for ctrl-c");
            }
            info!("shutdown requested");
            cancel.cancel();
        },
        () = cancel.cancelled() => {
            warn!("discord client exited");
        },
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    init_telemetry(&cli);

    match cli.command {
        None | Some(Commands::Run) => {
            info!(version = env!("CARGO_PKG_VERSION"), "rollcall starting");
            run(cli.config).await
        },
        Some(Commands::Commands) => {
            let definitions = rollcall_channels::command_definitions();
            println!("{}", serde_json::to_string_pretty(&definitions)?);
            Ok(())
        },
        Some(Commands::HelpText) => {
            print!("{}", rollcall_channels::help_text());
            Ok(())
        },
        Some(Commands::Config { action }) => {
            config_commands::handle_config(action, cli.config.as_deref())
        },
    }
}
