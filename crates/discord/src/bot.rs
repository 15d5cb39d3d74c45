use std::{sync::Arc, time::Duration};

use {
    rollcall_channels::{CheckService, ReplyWatchdog},
    rollcall_config::ChecksConfig,
    secrecy::ExposeSecret,
    serenity::all::{Client, Http},
    tokio_util::sync::CancellationToken,
    tracing::{error, info},
};

use crate::{
    config::DiscordConfig,
    error::{Error, Result},
    handler::ReadyCheckHandler,
    outbound::DiscordTransport,
};

/// Connect to the gateway and serve ready checks.
///
/// The client runs in a background task until the returned token is
/// cancelled. The token is also cancelled when the client stops on its own,
/// so callers can wait on it.
pub async fn start(config: DiscordConfig, checks: ChecksConfig) -> Result<CancellationToken> {
    if !config.has_token() {
        return Err(Error::MissingToken);
    }
    let token = config.token.expose_secret().trim().to_string();

    let transport = Arc::new(DiscordTransport::new(Arc::new(Http::new(&token))));
    let service = Arc::new(CheckService::new(transport));
    let watchdog = ReplyWatchdog::new(
        Duration::from_millis(checks.reply_timeout_ms),
        checks.fallback_reply,
    );
    let handler = ReadyCheckHandler::new(config, service, watchdog);

    let mut client = Client::builder(&token, ReadyCheckHandler::intents())
        .event_handler(handler)
        .await?;

    let cancel = CancellationToken::new();
    let stop = cancel.clone();
    let shard_manager = Arc::clone(&client.shard_manager);
    tokio::spawn(async move {
        info!("starting discord client");
        tokio::select! {
            result = client.start() => {
                match result {
                    Ok(()) => info!("discord client stopped"),
                    Err(e) => error!(error = %e, "discord client failed"),
                }
                stop.cancel();
            },
            () = stop.cancelled() => {
                info!("shutting down discord client");
                shard_manager.shutdown_all().await;
            },
        }
    });

    Ok(cancel)
}
