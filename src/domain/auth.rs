//! Identity carried by access and refresh tokens.

use serde::{Deserialize, Serialize};

use crate::domain::types::{TypeConstraintError, UserId};
use crate::domain::user::{Role, User};

/// JWT claims of a signed-in account.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticatedUser {
    pub sub: String,
    pub email: String,
    pub role: Role,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    pub exp: usize,
}

impl AuthenticatedUser {
    pub fn user_id(&self) -> Result<UserId, TypeConstraintError> {
        UserId::parse(&self.sub)
    }

    /// True when the user holds one of `roles`; superadmins always pass.
    pub fn has_role(&self, roles: &[Role]) -> bool {
        self.role == Role::SuperAdmin || roles.contains(&self.role)
    }

    /// Name shown in notification messages.
    pub fn display_name(&self) -> &str {
        self.first_name
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or("User")
    }

    pub fn full_name(&self) -> String {
        [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Builds claims for `user` expiring at `exp` (seconds since epoch).
    pub fn from_user(user: &User, exp: usize) -> Self {
        Self {
            sub: user.id.to_string(),
            email: user.email.to_string(),
            role: user.role,
            first_name: Some(user.first_name.to_string()),
            last_name: Some(user.last_name.to_string()),
            exp,
        }
    }
}
