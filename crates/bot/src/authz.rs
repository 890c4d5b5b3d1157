//! Command-boundary authorization.
//!
//! Checked before any argument is parsed, so a denied invoker learns nothing
//! about a command's arguments and no command runs without its guard.

use storefront_auth::{AccessPolicy, AuthzError, CommandAuthorization, authorize};

use crate::context::CommandContext;

/// Check authorization for a command in the current invocation context.
pub fn authorize_command<C: CommandAuthorization>(
    ctx: &CommandContext,
    policy: &AccessPolicy,
    command: &C,
) -> Result<(), AuthzError> {
    authorize(ctx.invoker(), policy, command.required_permission())
}
