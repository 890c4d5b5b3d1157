use serde::{Deserialize, Serialize};

use storefront_core::RoleId;

/// An ordered, duplicate-free list of role ids as persisted in guild settings
/// (`restricted_roles`, `grant_permissions`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleList(Vec<RoleId>);

impl RoleList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, role: RoleId) -> bool {
        self.0.contains(&role)
    }

    /// Append a role. Returns `false` when it was already listed.
    pub fn insert(&mut self, role: RoleId) -> bool {
        if self.contains(role) {
            return false;
        }
        self.0.push(role);
        true
    }

    /// Drop a role. Returns `false` when it was not listed.
    pub fn remove(&mut self, role: RoleId) -> bool {
        let before = self.0.len();
        self.0.retain(|listed| *listed != role);
        self.0.len() != before
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = RoleId> + '_ {
        self.0.iter().copied()
    }

    /// True when any of `roles` appears in this list.
    pub fn intersects(&self, roles: &[RoleId]) -> bool {
        roles.iter().any(|r| self.contains(*r))
    }
}

impl FromIterator<RoleId> for RoleList {
    fn from_iter<T: IntoIterator<Item = RoleId>>(iter: T) -> Self {
        let mut list = RoleList::new();
        for role in iter {
            list.insert(role);
        }
        list
    }
}
