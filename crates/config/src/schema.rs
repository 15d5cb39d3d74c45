use serde::{Deserialize, Serialize};

/// Default message shown when a command produced no reply in time.
pub const DEFAULT_FALLBACK_REPLY: &str = "Sorry, something has gone wrong!";

/// Root configuration (`rollcall.toml`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RollcallConfig {
    /// Discord account settings. Kept as raw JSON so the Discord crate owns
    /// its own schema (token, guild, activity, ...).
    pub discord: serde_json::Value,
    pub checks: ChecksConfig,
}

/// Command handling behaviour shared by all chat platforms.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ChecksConfig {
    /// How long a command may take before the fallback reply is sent (ms).
    pub reply_timeout_ms: u64,
    /// Text of the fallback reply.
    pub fallback_reply: String,
}

impl Default for ChecksConfig {
    fn default() -> Self {
        Self {
            reply_timeout_ms: 2000,
            fallback_reply: DEFAULT_FALLBACK_REPLY.into(),
        }
    }
}

impl RollcallConfig {
    /// The configured Discord token, if any (after env substitution).
    #[must_use]
    pub fn discord_token(&self) -> Option<&str> {
        self.discord
            .get("token")
            .and_then(|v| v.as_str())
            .filter(|t| !t.is_empty())
    }
}
