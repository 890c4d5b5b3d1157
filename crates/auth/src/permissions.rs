use serde::{Deserialize, Serialize};

/// What a command requires from its invoker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    /// Anyone in the guild.
    Public,
    /// Stock-mutating commands; gated by the guild's restricted roles.
    ManageStock,
    /// Store settings; administrators or holders of a granted role.
    ManageSettings,
}

impl Permission {
    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::Public => "public",
            Permission::ManageStock => "manage_stock",
            Permission::ManageSettings => "manage_settings",
        }
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}
