//! Business operations invoked by the HTTP routes.
//!
//! Every function takes the repository as a generic `&R` bounded by the
//! reader/writer traits it needs, which keeps the services testable with
//! in-memory or mockall repositories.

use thiserror::Error;

use crate::domain::auth::AuthenticatedUser;
use crate::domain::types::{TypeConstraintError, UserId};
use crate::domain::user::Role;
use crate::forms::FormError;
use crate::notifications::{NotificationHub, NotificationInput};
use crate::repository::UserReader;
use crate::repository::errors::RepositoryError;

pub mod audit;
pub mod auth;
pub mod clients;
pub mod dashboard;
pub mod devices;
pub mod notifications;
pub mod profile;
pub mod proposals;
pub mod users;

pub const INSUFFICIENT_PERMISSIONS: &str = "Insufficient permissions";

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    /// Request body failed validation.
    #[error("{0}")]
    Form(String),

    /// Request is well formed but clashes with stored state.
    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    TypeConstraint(#[from] TypeConstraintError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("{0}")]
    Internal(String),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

impl From<FormError> for ServiceError {
    fn from(err: FormError) -> Self {
        match err {
            FormError::Validation(errors) => ServiceError::Form(format!("Validation failed: {errors}")),
            FormError::TypeConstraint(err) => ServiceError::TypeConstraint(err),
            FormError::Invalid(message) => ServiceError::Form(message),
        }
    }
}

/// Rejects callers whose role is not in `roles`. Superadmins always pass.
pub fn ensure_role(user: &AuthenticatedUser, roles: &[Role]) -> ServiceResult<()> {
    if user.has_role(roles) {
        Ok(())
    } else {
        Err(ServiceError::Forbidden(INSUFFICIENT_PERMISSIONS.to_string()))
    }
}

/// Identifier of the caller taken from the token subject.
pub fn actor_id(user: &AuthenticatedUser) -> ServiceResult<UserId> {
    user.user_id()
        .map_err(|_| ServiceError::Unauthorized("Invalid or expired token".to_string()))
}

/// Sends `input` to every active account. Failures are logged only.
pub fn notify_active_users<R>(repo: &R, hub: &NotificationHub, input: &NotificationInput)
where
    R: UserReader + ?Sized,
{
    match repo.list_active_users() {
        Ok(users) => {
            let ids: Vec<UserId> = users.iter().map(|u| u.id).collect();
            hub.add_for_users(&ids, input);
        }
        Err(err) => log::error!("Failed to load notification recipients: {err}"),
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::Utc;

    use crate::domain::auth::AuthenticatedUser;
    use crate::domain::types::{Email, PersonName, UserId};
    use crate::domain::user::{Role, User};

    pub fn claims(role: Role) -> AuthenticatedUser {
        AuthenticatedUser {
            sub: UserId::new().to_string(),
            email: "actor@example.com".to_string(),
            role,
            first_name: Some("Alex".to_string()),
            last_name: Some("Doe".to_string()),
            exp: 0,
        }
    }

    pub fn user(role: Role) -> User {
        let now = Utc::now().naive_utc();
        User {
            id: UserId::new(),
            email: Email::new("someone@example.com").unwrap(),
            password_hash: String::new(),
            role,
            first_name: PersonName::new("Sam").unwrap(),
            last_name: PersonName::new("Lee").unwrap(),
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }
}
