//! Permission gate for command invocation.

use std::sync::Arc;

use herald_core::{Guild, MembershipLookup, Permission, User};

/// Decides whether an actor may run a command.
///
/// Outside a guild (direct messages) every actor is allowed: there is no
/// membership to check against. Inside a guild the decision is delegated to
/// the [`MembershipLookup`].
#[derive(Clone)]
pub struct PermissionGate {
    lookup: Arc<dyn MembershipLookup>,
}

impl PermissionGate {
    pub fn new(lookup: impl MembershipLookup + 'static) -> Self {
        Self {
            lookup: Arc::new(lookup),
        }
    }

    /// Wraps an already shared lookup.
    pub fn from_arc(lookup: Arc<dyn MembershipLookup>) -> Self {
        Self { lookup }
    }

    /// A gate that grants every permission.
    pub fn allow_all() -> Self {
        Self::new(|_: &Guild, _: &User, _: &Permission| true)
    }

    /// A gate that grants nothing inside a guild.
    ///
    /// Direct messages are still allowed. This is the default.
    pub fn deny_all() -> Self {
        Self::new(|_: &Guild, _: &User, _: &Permission| false)
    }

    pub fn allow(&self, guild: Option<&Guild>, actor: &User, permission: &Permission) -> bool {
        match guild {
            None => true,
            Some(guild) => self.lookup.has_permission(guild, actor, permission),
        }
    }
}

impl Default for PermissionGate {
    fn default() -> Self {
        Self::deny_all()
    }
}

impl std::fmt::Debug for PermissionGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PermissionGate").finish_non_exhaustive()
    }
}
