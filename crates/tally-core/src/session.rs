//! # Session & Roles
//!
//! Who is calling, passed explicitly into every gated operation.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Role       │ record transactions │ transfers / withdrawals │ deduct   │
//! │  ───────────┼─────────────────────┼─────────────────────────┼───────── │
//! │  merchant   │        ✅           │          ✅             │   ✅     │
//! │  manager    │        ✅           │          ✅             │   ✅     │
//! │  admin      │        ✅           │          ✅             │   ✅     │
//! │  employee   │        ❌           │          ❌             │   ❌     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! This is a precondition check on a role the caller already holds, not an
//! authentication system. There are no tokens and no session store.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};

// =============================================================================
// Role
// =============================================================================

/// Staff role, stored on the employee record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Shop owner. Receives employee transfers and makes withdrawals.
    Merchant,
    Manager,
    Admin,
    /// Sales staff. Earns salary and collects payments.
    Employee,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Merchant, Role::Manager, Role::Admin, Role::Employee];

    /// Merchant, manager and admin may perform mutating operations.
    #[inline]
    pub const fn is_privileged(&self) -> bool {
        !matches!(self, Role::Employee)
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Role::Merchant => "merchant",
            Role::Manager => "manager",
            Role::Admin => "admin",
            Role::Employee => "employee",
        }
    }
}

impl Default for Role {
    fn default() -> Self {
        Role::Employee
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|role| role.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ValidationError::NotAllowed {
                field: "role".to_string(),
                allowed: Role::ALL.iter().map(|r| r.as_str().to_string()).collect(),
            })
    }
}

// =============================================================================
// Session
// =============================================================================

/// The signed-in user, as held by the UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Session {
    pub user_id: String,
    /// Display name, also used as the `collector` on transactions.
    pub name: String,
    pub role: Role,
}

impl Session {
    pub fn new(user_id: impl Into<String>, name: impl Into<String>, role: Role) -> Self {
        Session {
            user_id: user_id.into(),
            name: name.into(),
            role,
        }
    }

    #[inline]
    pub fn is_privileged(&self) -> bool {
        self.role.is_privileged()
    }

    /// Fails with [`CoreError::PermissionDenied`] unless the caller is
    /// merchant, manager or admin.
    ///
    /// ```rust
    /// use tally_core::session::{Role, Session};
    ///
    /// let boss = Session::new("u1", "Boss", Role::Merchant);
    /// assert!(boss.require_privileged("create withdrawal").is_ok());
    ///
    /// let clerk = Session::new("u2", "Zhang San", Role::Employee);
    /// assert!(clerk.require_privileged("create withdrawal").is_err());
    /// ```
    pub fn require_privileged(&self, action: &str) -> CoreResult<()> {
        if self.is_privileged() {
            Ok(())
        } else {
            Err(CoreError::PermissionDenied {
                action: action.to_string(),
                role: self.role,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_privileged_roles() {
        assert!(Role::Merchant.is_privileged());
        assert!(Role::Manager.is_privileged());
        assert!(Role::Admin.is_privileged());
        assert!(!Role::Employee.is_privileged());
    }

    #[test]
    fn test_role_parse() {
        assert_eq!("merchant".parse::<Role>().unwrap(), Role::Merchant);
        assert_eq!(" Manager ".parse::<Role>().unwrap(), Role::Manager);
        assert!("owner".parse::<Role>().is_err());
    }

    #[test]
    fn test_require_privileged_reports_action_and_role() {
        let session = Session::new("e1", "Zhang San", Role::Employee);
        let err = session.require_privileged("deduct bonus").unwrap_err();
        match err {
            CoreError::PermissionDenied { action, role } => {
                assert_eq!(action, "deduct bonus");
                assert_eq!(role, Role::Employee);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"admin\"");
    }
}
