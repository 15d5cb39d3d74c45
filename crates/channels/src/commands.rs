//! Command names and the platform-neutral command catalogue.

use std::str::FromStr;

use serde::Serialize;

use crate::error::Error;

pub const CHECK: &str = "check";
pub const CANCEL: &str = "cancel";
pub const READY: &str = "ready";
pub const UNREADY: &str = "unready";
pub const STATUS: &str = "status";
pub const HELP: &str = "help";

/// Option of `check` naming the [`crate::TargetType`].
pub const TYPE_OPTION: &str = "type";
pub const COUNT_TARGET: &str = "count";
pub const MENTION_TARGET: &str = "mentions";
pub const CHANNEL_TARGET: &str = "channel";

/// A command the bot answers, whether typed or pressed as a button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    Check,
    Cancel,
    Ready,
    Unready,
    Status,
    Help,
}

impl CommandKind {
    pub const ALL: [Self; 6] = [
        Self::Check,
        Self::Cancel,
        Self::Ready,
        Self::Unready,
        Self::Status,
        Self::Help,
    ];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Check => CHECK,
            Self::Cancel => CANCEL,
            Self::Ready => READY,
            Self::Unready => UNREADY,
            Self::Status => STATUS,
            Self::Help => HELP,
        }
    }

    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Check => "Create a ready check",
            Self::Cancel => "Cancel a ready check",
            Self::Ready => "Respond \"Ready\" to a ready check",
            Self::Unready => "Respond \"Not Ready\" to a ready check",
            Self::Status => "Check the status of the current ready check",
            Self::Help => "List the ready check commands",
        }
    }
}

/// Slash-command names and button custom ids share one namespace, so the
/// `ready` / `unready` buttons parse to the same kinds as their commands.
impl FromStr for CommandKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| Error::unknown_command(s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OptionKind {
    String,
    Integer,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Choice {
    pub name: &'static str,
    pub value: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OptionDefinition {
    pub name: &'static str,
    pub description: &'static str,
    pub kind: OptionKind,
    pub required: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<Choice>,
}

/// Registration metadata for one command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandDefinition {
    pub kind: CommandKind,
    pub name: &'static str,
    pub description: &'static str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<OptionDefinition>,
}

impl Serialize for CommandKind {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

/// Every command the bot registers, in registration order.
#[must_use]
pub fn command_definitions() -> Vec<CommandDefinition> {
    CommandKind::ALL
        .into_iter()
        .map(|kind| CommandDefinition {
            kind,
            name: kind.name(),
            description: kind.description(),
            options: if kind == CommandKind::Check {
                check_options()
            } else {
                Vec::new()
            },
        })
        .collect()
}

fn check_options() -> Vec<OptionDefinition> {
    vec![
        OptionDefinition {
            name: TYPE_OPTION,
            description: "The type of ready check to do",
            kind: OptionKind::String,
            required: true,
            choices: vec![
                Choice {
                    name: "Channel",
                    value: CHANNEL_TARGET,
                },
                Choice {
                    name: "Count",
                    value: COUNT_TARGET,
                },
                Choice {
                    name: "Mentions",
                    value: MENTION_TARGET,
                },
            ],
        },
        OptionDefinition {
            name: COUNT_TARGET,
            description: "The number of users to ready",
            kind: OptionKind::Integer,
            required: false,
            choices: Vec::new(),
        },
        OptionDefinition {
            name: MENTION_TARGET,
            description: "The users/roles to ready",
            kind: OptionKind::String,
            required: false,
            choices: Vec::new(),
        },
    ]
}

/// Text of the `/help` reply.
#[must_use]
pub fn help_text() -> String {
    format!(
        "To create a check, run `/{CHECK}`\nTo respond to a check, run `/{READY}` or \
         `/{UNREADY}`\nTo cancel a check, run `/{CANCEL}`\nTo see who still needs to ready, run \
         `/{STATUS}`\n"
    )
}
