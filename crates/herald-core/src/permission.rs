//! Permission tokens and the membership lookup seam.

use serde::{Deserialize, Serialize};

use crate::model::{Guild, User};

/// An opaque capability token a command can require.
///
/// The well-known variants mirror common gateway capabilities; anything else
/// goes through [`Permission::Custom`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    /// Post messages in a channel. The default requirement for commands.
    #[default]
    SendMessages,
    /// Read channel history.
    ReadMessages,
    /// Delete or pin other members' messages.
    ManageMessages,
    /// Create, edit and assign roles.
    ManageRoles,
    /// Create and edit channels.
    ManageChannels,
    /// Kick members.
    KickMembers,
    /// Ban members.
    BanMembers,
    /// Every capability.
    Administrator,
    /// An application-defined capability.
    Custom(String),
}

impl Permission {
    /// Creates an application-defined permission.
    pub fn custom(name: impl Into<String>) -> Self {
        Self::Custom(name.into())
    }

    /// Returns the snake_case name of this permission.
    pub fn as_str(&self) -> &str {
        match self {
            Self::SendMessages => "send_messages",
            Self::ReadMessages => "read_messages",
            Self::ManageMessages => "manage_messages",
            Self::ManageRoles => "manage_roles",
            Self::ManageChannels => "manage_channels",
            Self::KickMembers => "kick_members",
            Self::BanMembers => "ban_members",
            Self::Administrator => "administrator",
            Self::Custom(name) => name,
        }
    }
}

impl std::fmt::Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Answers whether a guild member holds a permission.
///
/// Implemented by gateways (from their role cache) or by applications. Must be
/// callable synchronously from a dispatch worker.
///
/// Any `Fn(&Guild, &User, &Permission) -> bool` closure is a lookup:
///
/// ```rust,ignore
/// let admins_only = |_: &Guild, user: &User, _: &Permission| user.id == OWNER_ID;
/// let gate = PermissionGate::new(admins_only);
/// ```
pub trait MembershipLookup: Send + Sync {
    /// Returns `true` if `actor`'s roles in `guild` grant `permission`.
    fn has_permission(&self, guild: &Guild, actor: &User, permission: &Permission) -> bool;
}

impl<F> MembershipLookup for F
where
    F: Fn(&Guild, &User, &Permission) -> bool + Send + Sync,
{
    fn has_permission(&self, guild: &Guild, actor: &User, permission: &Permission) -> bool {
        self(guild, actor, permission)
    }
}
