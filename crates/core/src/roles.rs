//! Content roles as resolved by the external identity provider.
//!
//! The core never authenticates anyone. Each call carries an already-resolved
//! [`Role`], and the workflow machine decides what that role may do.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

pub const ROLE_AUTHOR: &str = "author";
pub const ROLE_APPROVER: &str = "approver";
pub const ROLE_ADMIN: &str = "admin";

/// All valid role names.
pub const VALID_ROLES: &[&str] = &[ROLE_AUTHOR, ROLE_APPROVER, ROLE_ADMIN];

/// A resolved content role. Roles are ordered: every approver may act as an
/// author, and every admin may act as an approver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Author,
    Approver,
    Admin,
}

impl Role {
    /// All roles, lowest privilege first.
    pub const ALL: [Role; 3] = [Role::Author, Role::Approver, Role::Admin];

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Author => ROLE_AUTHOR,
            Role::Approver => ROLE_APPROVER,
            Role::Admin => ROLE_ADMIN,
        }
    }

    /// Returns `true` if this role carries at least the privileges of `required`.
    pub fn at_least(self, required: Role) -> bool {
        self >= required
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            ROLE_AUTHOR => Ok(Role::Author),
            ROLE_APPROVER => Ok(Role::Approver),
            ROLE_ADMIN => Ok(Role::Admin),
            other => Err(CoreError::Validation(format!(
                "Invalid role '{other}'. Must be one of: {}",
                VALID_ROLES.join(", ")
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roles_parse_from_names() {
        assert_eq!("author".parse::<Role>().unwrap(), Role::Author);
        assert_eq!("approver".parse::<Role>().unwrap(), Role::Approver);
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
    }

    #[test]
    fn unknown_role_is_rejected() {
        let err = "editor".parse::<Role>().unwrap_err();
        assert!(err.to_string().contains("editor"));
    }

    #[test]
    fn role_hierarchy() {
        assert!(Role::Admin.at_least(Role::Approver));
        assert!(Role::Approver.at_least(Role::Author));
        assert!(!Role::Author.at_least(Role::Approver));
        assert!(!Role::Approver.at_least(Role::Admin));
    }

    #[test]
    fn display_matches_constant() {
        for role in Role::ALL {
            assert_eq!(role.to_string(), role.as_str());
            assert!(VALID_ROLES.contains(&role.as_str()));
        }
    }
}
