use {
    secrecy::{ExposeSecret, Secret},
    serde::{Deserialize, Serialize},
};

use crate::error::Result;

/// Activity shown under the bot's name unless configured otherwise.
pub const DEFAULT_ACTIVITY: &str = "Guan Yu Flow";

/// The `[discord]` section of the config file.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscordConfig {
    /// Bot token from the Discord developer portal.
    #[serde(serialize_with = "serialize_secret")]
    pub token: Secret<String>,

    /// Register commands on this guild only. Guild commands show up
    /// immediately, global ones can take up to an hour.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guild_id: Option<u64>,

    /// Overwrite the slash commands on startup.
    pub register_commands: bool,

    /// "Playing ..." status. Empty clears it.
    pub activity: String,
}

impl std::fmt::Debug for DiscordConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscordConfig")
            .field("token", &"[REDACTED]")
            .field("guild_id", &self.guild_id)
            .field("register_commands", &self.register_commands)
            .field("activity", &self.activity)
            .finish()
    }
}

fn serialize_secret<S: serde::Serializer>(
    secret: &Secret<String>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(secret.expose_secret())
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            token: Secret::new(String::new()),
            guild_id: None,
            register_commands: true,
            activity: DEFAULT_ACTIVITY.into(),
        }
    }
}

impl DiscordConfig {
    /// Parse the raw `[discord]` section. A missing section yields defaults.
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        if value.is_null() {
            return Ok(Self::default());
        }
        Ok(serde_json::from_value(value)?)
    }

    #[must_use]
    pub fn has_token(&self) -> bool {
        !self.token.expose_secret().trim().is_empty()
    }
}
