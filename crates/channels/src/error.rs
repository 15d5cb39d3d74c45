use std::error::Error as StdError;

use rollcall_checks::CheckError;

use crate::{audience::AudienceError, reply::Reply};

/// Crate-wide result type for command handling.
pub type Result<T> = std::result::Result<T, Error>;

/// Typed failures of command handling. Every variant maps to a denial
/// message for the user who issued the command.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Check(#[from] CheckError),

    #[error(transparent)]
    Audience(#[from] AudienceError),

    /// A command or button id this bot does not own.
    #[error("unknown command: {name}")]
    UnknownCommand { name: String },

    /// Wrapped source error from the chat platform.
    #[error("channel operation failed: {context}: {source}")]
    External {
        context: String,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },
}

impl Error {
    #[must_use]
    pub fn unknown_command(name: impl Into<String>) -> Self {
        Self::UnknownCommand { name: name.into() }
    }

    #[must_use]
    pub fn external(
        context: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self::External {
            context: context.into(),
            source: Box::new(source),
        }
    }

    /// Text shown to the user in place of a normal reply.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Check(CheckError::InvalidTarget) => with_help_hint(
                "Sorry, a ready check needs a count of at least 1 or at least one user.",
            ),
            Self::Check(CheckError::AlreadyActive) => {
                "There's already a ready check running in this channel. Use `/status` to see \
                 who's ready or `/cancel` to stop it."
                    .into()
            },
            Self::Check(CheckError::NoActiveCheck) => {
                with_help_hint("There's no ready check running in this channel.")
            },
            Self::Check(CheckError::NotRequester) => {
                "Only the person who created this ready check can cancel it.".into()
            },
            Self::Check(CheckError::AlreadyActivated) | Self::External { .. } => {
                with_help_hint("Sorry, something went wrong with that ready check.")
            },
            Self::Audience(e) => e.to_string(),
            Self::UnknownCommand { .. } => {
                "Yikes! Somehow a command not meant for me made it all the way to my system 😥."
                    .into()
            },
        }
    }

    /// Denial reply for this error, visible only to the issuer.
    #[must_use]
    pub fn into_reply(self) -> Reply {
        Reply::ephemeral(self.user_message())
    }
}

fn with_help_hint(reason: &str) -> String {
    if reason.is_empty() {
        "Type `/help` for a list of commands.".into()
    } else {
        format!("{reason} Type `/help` for a list of commands.")
    }
}
