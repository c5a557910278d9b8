//! Built-in gateway events.
//!
//! Gateways translate their wire events into these types. Applications may
//! define further event types by implementing [`Event`].

use std::any::Any;

use serde::{Deserialize, Serialize};

use crate::event::Event;
use crate::model::{Channel, Guild, User};

/// The gateway session is established and events will start flowing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ready {
    /// The account the bot is logged in as, if the gateway reports it.
    #[serde(default)]
    pub user: Option<User>,
    /// Number of guilds visible to the bot.
    #[serde(default)]
    pub guild_count: usize,
}

impl Event for Ready {
    fn event_name(&self) -> &'static str {
        "ready"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A message was posted in a channel the bot can see.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageReceived {
    /// Raw text content.
    pub content: String,
    /// The sending user.
    pub author: User,
    /// The channel the message was posted in.
    pub channel: Channel,
    /// The guild, absent for direct/private channels.
    #[serde(default)]
    pub guild: Option<Guild>,
}

impl MessageReceived {
    /// Creates a message posted in a guild channel.
    pub fn in_guild(
        content: impl Into<String>,
        author: User,
        channel: Channel,
        guild: Guild,
    ) -> Self {
        Self {
            content: content.into(),
            author,
            channel,
            guild: Some(guild),
        }
    }

    /// Creates a direct message.
    pub fn direct(content: impl Into<String>, author: User, channel: Channel) -> Self {
        Self {
            content: content.into(),
            author,
            channel,
            guild: None,
        }
    }

    /// Returns `true` if the message was posted inside a guild.
    pub fn is_from_guild(&self) -> bool {
        self.guild.is_some()
    }
}

impl Event for MessageReceived {
    fn event_name(&self) -> &'static str {
        "message_received"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_message(&self) -> Option<&MessageReceived> {
        Some(self)
    }
}

/// Online status reported by presence updates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnlineStatus {
    /// Online.
    Online,
    /// Idle / away.
    Idle,
    /// Do not disturb.
    DoNotDisturb,
    /// Offline or invisible.
    #[default]
    Offline,
}

/// A user's presence changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresenceUpdated {
    /// The user whose presence changed.
    pub user: User,
    /// The guild the update was observed in.
    #[serde(default)]
    pub guild: Option<Guild>,
    /// New status.
    pub status: OnlineStatus,
}

impl Event for PresenceUpdated {
    fn event_name(&self) -> &'static str {
        "presence_updated"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A user joined a guild.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberJoined {
    /// The guild joined.
    pub guild: Guild,
    /// The new member.
    pub user: User,
}

impl Event for MemberJoined {
    fn event_name(&self) -> &'static str {
        "member_joined"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A user left (or was removed from) a guild.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberLeft {
    /// The guild left.
    pub guild: Guild,
    /// The former member.
    pub user: User,
}

impl Event for MemberLeft {
    fn event_name(&self) -> &'static str {
        "member_left"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
