use storefront_core::{RoleId, UserId};

/// The identity issuing a command, as resolved by the chat transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invoker {
    pub user_id: UserId,
    /// Account name, recorded as `sold_by` on purchases.
    pub name: String,
    pub roles: Vec<RoleId>,
    /// The member carries the server-wide administrator permission.
    pub administrator: bool,
}

impl Invoker {
    pub fn new(user_id: UserId, name: impl Into<String>) -> Self {
        Self {
            user_id,
            name: name.into(),
            roles: Vec::new(),
            administrator: false,
        }
    }

    pub fn with_roles(mut self, roles: impl IntoIterator<Item = RoleId>) -> Self {
        self.roles = roles.into_iter().collect();
        self
    }

    pub fn with_administrator(mut self, administrator: bool) -> Self {
        self.administrator = administrator;
        self
    }

    pub fn has_role(&self, role: RoleId) -> bool {
        self.roles.contains(&role)
    }
}
