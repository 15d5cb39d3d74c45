//! Discord front end for the ready-check bot.
//!
//! Uses serenity to receive slash commands and button presses over the
//! gateway, resolves check audiences from command options and the voice
//! state cache, and posts status messages with `Ready` / `Not Ready`
//! buttons.

pub mod audience;
pub mod bot;
pub mod commands;
pub mod config;
pub mod error;
pub mod handler;
pub mod outbound;

pub use {
    bot::start,
    config::DiscordConfig,
    error::{Error, Result},
    handler::ReadyCheckHandler,
    outbound::DiscordTransport,
};
