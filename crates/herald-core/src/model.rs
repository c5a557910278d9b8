//! Transport-level data carriers.
//!
//! These are plain values supplied by a gateway. The dispatch engine only
//! reads them.

use serde::{Deserialize, Serialize};

/// A user account on the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct User {
    /// Gateway-assigned user id.
    pub id: u64,
    /// Display name.
    pub name: String,
    /// Whether this account is a bot.
    #[serde(default)]
    pub bot: bool,
}

impl User {
    /// Creates a (non-bot) user.
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            bot: false,
        }
    }

    /// Marks this user as a bot account.
    pub fn with_bot(mut self, bot: bool) -> Self {
        self.bot = bot;
        self
    }
}

/// The kind of a channel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelKind {
    /// A guild text channel.
    #[default]
    Text,
    /// A direct/private conversation.
    Private,
    /// A guild voice channel.
    Voice,
    /// Anything else the gateway reports.
    Other,
}

/// A channel messages are posted in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Channel {
    /// Gateway-assigned channel id.
    pub id: u64,
    /// Channel name; private channels usually have none.
    #[serde(default)]
    pub name: Option<String>,
    /// Channel kind.
    #[serde(default)]
    pub kind: ChannelKind,
}

impl Channel {
    /// Creates a guild text channel.
    pub fn text(id: u64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: Some(name.into()),
            kind: ChannelKind::Text,
        }
    }

    /// Creates a private (direct message) channel.
    pub fn private(id: u64) -> Self {
        Self {
            id,
            name: None,
            kind: ChannelKind::Private,
        }
    }

    /// Returns `true` for direct/private channels.
    pub fn is_private(&self) -> bool {
        self.kind == ChannelKind::Private
    }
}

/// A guild (server/community).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Guild {
    /// Gateway-assigned guild id.
    pub id: u64,
    /// Guild name.
    pub name: String,
}

impl Guild {
    /// Creates a guild.
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}
