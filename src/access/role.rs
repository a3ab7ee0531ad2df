//! Permission tiers

use std::fmt;
use std::str::FromStr;

use crate::error::DataError;

/// Role assigned to a session at login
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Everything, including erase-all and server exit
    Admin,
    /// Reads and writes
    NormalUser,
    /// Reads and loads only
    ReadOnly,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Admin, Role::NormalUser, Role::ReadOnly];

    /// Check if this role can run mutating commands
    pub fn can_write(&self) -> bool {
        matches!(self, Role::Admin | Role::NormalUser)
    }

    /// Check if this role can run admin commands
    pub fn can_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }

    /// Name as written in the users file
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::NormalUser => "normal-user",
            Role::ReadOnly => "read-only",
        }
    }
}

impl FromStr for Role {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| DataError::Config(format!("unknown role: {}", s)))
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
