//! Platform-neutral ready-check command handling.
//!
//! Chat integrations (Discord today) turn inbound slash commands and button
//! presses into [`Invocation`]s, resolve the audience of new checks with the
//! helpers in [`audience`], implement [`StatusTransport`] for their message
//! API, and hand everything to a [`CheckService`].

pub mod audience;
pub mod commands;
pub mod error;
pub mod reply;
pub mod service;
pub mod transport;
pub mod watchdog;

pub use {
    audience::{AudienceError, TargetType},
    commands::{
        Choice, CommandDefinition, CommandKind, OptionDefinition, OptionKind, command_definitions,
        help_text,
    },
    error::{Error, Result},
    reply::Reply,
    service::{Action, CheckService, Invocation},
    transport::StatusTransport,
    watchdog::ReplyWatchdog,
};
