use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{Invoker, Permission, RoleList};

/// Per-guild role configuration consulted by the guards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessPolicy {
    /// Roles allowed to mutate stock. Empty means unrestricted.
    pub restricted_roles: RoleList,
    /// Roles allowed to change store settings in addition to administrators.
    pub grant_roles: RoleList,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("forbidden: missing permission '{0}'")]
    Forbidden(Permission),
}

/// Command-side authorization contract (checked at the command boundary).
///
/// Implement this on commands so the dispatcher can enforce requirements
/// before running them.
pub trait CommandAuthorization {
    fn required_permission(&self) -> Permission;
}

/// True when the restricted-role list is empty or the invoker holds one of
/// its roles.
pub fn is_allowed(invoker: &Invoker, policy: &AccessPolicy) -> bool {
    policy.restricted_roles.is_empty() || policy.restricted_roles.intersects(&invoker.roles)
}

/// True when the invoker holds a role from the grant-permission list.
pub fn has_grant_permissions(invoker: &Invoker, policy: &AccessPolicy) -> bool {
    policy.grant_roles.intersects(&invoker.roles)
}

pub fn is_administrator(invoker: &Invoker) -> bool {
    invoker.administrator
}

/// Authorize an invoker against a required permission.
///
/// - No IO
/// - No panics
/// - No business logic (pure policy check)
pub fn authorize(
    invoker: &Invoker,
    policy: &AccessPolicy,
    required: Permission,
) -> Result<(), AuthzError> {
    let granted = match required {
        Permission::Public => true,
        Permission::ManageStock => is_allowed(invoker, policy),
        Permission::ManageSettings => {
            is_administrator(invoker) || has_grant_permissions(invoker, policy)
        }
    };

    if granted {
        Ok(())
    } else {
        tracing::debug!(
            user_id = %invoker.user_id,
            permission = %required,
            "authorization denied"
        );
        Err(AuthzError::Forbidden(required))
    }
}
