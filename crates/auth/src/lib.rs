//! `storefront-auth`: role-based guards for storefront commands.
//!
//! Pure policy checks over an explicit invoker and the guild's access policy.
//! This crate is decoupled from the chat transport and from storage.

pub mod authorize;
pub mod invoker;
pub mod permissions;
pub mod roles;

pub use authorize::{
    AccessPolicy, AuthzError, CommandAuthorization, authorize, has_grant_permissions,
    is_administrator, is_allowed,
};
pub use invoker::Invoker;
pub use permissions::Permission;
pub use roles::RoleList;
