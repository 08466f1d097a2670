//! Account administration for admins and superadmins.

use crate::domain::auth::AuthenticatedUser;
use crate::domain::types::UserId;
use crate::domain::user::{NewUser, Role, UpdateUser, User};
use crate::dto::users::UserView;
use crate::forms::users::{CreateUserForm, CreateUserPayload};
use crate::repository::{UserReader, UserWriter};
use crate::services::auth::hash_password;
use crate::services::{ServiceError, ServiceResult, ensure_role};

const ADMIN_ROLES: &[Role] = &[Role::Admin, Role::SuperAdmin];

/// Looks up an account by its path id; malformed ids count as missing.
fn find_user<R>(repo: &R, user_id: &str) -> ServiceResult<Option<User>>
where
    R: UserReader + ?Sized,
{
    match UserId::parse(user_id) {
        Ok(id) => Ok(repo.get_user_by_id(id)?),
        Err(_) => Ok(None),
    }
}

/// Every account, newest first.
pub fn list_users<R>(repo: &R, user: &AuthenticatedUser) -> ServiceResult<Vec<UserView>>
where
    R: UserReader + ?Sized,
{
    ensure_role(user, ADMIN_ROLES)?;

    let users = repo.list_users().map_err(|err| {
        log::error!("Failed to list users: {err}");
        err
    })?;

    Ok(users.iter().map(UserView::from).collect())
}

/// Creates an account. Only a superadmin may create admins; any other
/// requested role collapses to USER.
pub fn create_user<R>(
    repo: &R,
    user: &AuthenticatedUser,
    form: CreateUserForm,
) -> ServiceResult<UserView>
where
    R: UserReader + UserWriter + ?Sized,
{
    ensure_role(user, ADMIN_ROLES)?;

    let payload = CreateUserPayload::try_from(form)?;

    if repo.get_user_by_email(&payload.email)?.is_some() {
        return Err(ServiceError::Conflict("Email already exists".to_string()));
    }

    let role = match payload.role {
        Some(Role::Admin) if user.role == Role::SuperAdmin => Role::Admin,
        _ => Role::User,
    };

    let new_user = NewUser::new(
        payload.email,
        hash_password(&payload.password)?,
        role,
        payload.first_name,
        payload.last_name,
    );

    let created = repo.create_user(&new_user).map_err(|err| {
        log::error!("Failed to create user: {err}");
        err
    })?;

    Ok(UserView::from(&created))
}

pub fn delete_user<R>(repo: &R, user: &AuthenticatedUser, user_id: &str) -> ServiceResult<()>
where
    R: UserReader + UserWriter + ?Sized,
{
    ensure_role(user, ADMIN_ROLES)?;

    let target = find_user(repo, user_id)?
        .ok_or_else(|| ServiceError::NotFound("User not found".to_string()))?;

    match target.role {
        Role::SuperAdmin => {
            return Err(ServiceError::Conflict("Cannot delete superadmin".to_string()));
        }
        Role::Admin if user.role != Role::SuperAdmin => {
            return Err(ServiceError::Forbidden(
                "Only superadmin can delete admin accounts".to_string(),
            ));
        }
        _ => {}
    }

    repo.delete_user(target.id).map_err(|err| {
        log::error!("Failed to delete user {}: {err}", target.id);
        err
    })?;

    Ok(())
}

/// USER → ADMIN.
pub fn promote_user<R>(repo: &R, user: &AuthenticatedUser, user_id: &str) -> ServiceResult<UserView>
where
    R: UserReader + UserWriter + ?Sized,
{
    ensure_role(user, &[Role::SuperAdmin])?;

    let target = find_user(repo, user_id)?
        .ok_or_else(|| ServiceError::NotFound("User not found".to_string()))?;

    if target.role.is_admin() {
        return Err(ServiceError::Conflict("User is already an admin".to_string()));
    }

    let updated = repo.update_user(
        target.id,
        &UpdateUser {
            role: Some(Role::Admin),
            ..UpdateUser::default()
        },
    )?;

    Ok(UserView::from(&updated))
}

/// ADMIN → USER. Superadmins cannot be demoted.
pub fn demote_user<R>(repo: &R, user: &AuthenticatedUser, user_id: &str) -> ServiceResult<UserView>
where
    R: UserReader + UserWriter + ?Sized,
{
    ensure_role(user, &[Role::SuperAdmin])?;

    let target = find_user(repo, user_id)?
        .filter(|target| target.role.is_admin())
        .ok_or_else(|| ServiceError::NotFound("Admin not found".to_string()))?;

    if target.role == Role::SuperAdmin {
        return Err(ServiceError::Conflict("Cannot demote superadmin".to_string()));
    }

    let updated = repo.update_user(
        target.id,
        &UpdateUser {
            role: Some(Role::User),
            ..UpdateUser::default()
        },
    )?;

    Ok(UserView::from(&updated))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::mock::MockRepository;
    use crate::services::test_support::{claims, user};

    fn form(role: Option<&str>) -> CreateUserForm {
        CreateUserForm {
            email: "new@example.com".to_string(),
            password: "longenough".to_string(),
            first_name: "New".to_string(),
            last_name: "Person".to_string(),
            role: role.map(str::to_string),
        }
    }

    fn echo_created(repo: &mut MockRepository) {
        repo.expect_create_user().returning(|new_user| {
            let mut created = user(new_user.role);
            created.id = new_user.id;
            created.email = new_user.email.clone();
            Ok(created)
        });
    }

    #[test]
    fn plain_users_cannot_list() {
        let repo = MockRepository::new();
        assert!(matches!(
            list_users(&repo, &claims(Role::User)),
            Err(ServiceError::Forbidden(_))
        ));
    }

    #[test]
    fn admin_request_downgrades_to_user_for_admins() {
        let mut repo = MockRepository::new();
        repo.expect_get_user_by_email().returning(|_| Ok(None));
        echo_created(&mut repo);

        let created = create_user(&repo, &claims(Role::Admin), form(Some("ADMIN"))).unwrap();
        assert_eq!(created.role, Role::User);

        let created = create_user(&repo, &claims(Role::SuperAdmin), form(Some("ADMIN"))).unwrap();
        assert_eq!(created.role, Role::Admin);
        assert_eq!(created.email, "new@example.com");
    }

    #[test]
    fn duplicate_email_is_rejected() {
        let mut repo = MockRepository::new();
        repo.expect_get_user_by_email()
            .returning(|_| Ok(Some(user(Role::User))));
        repo.expect_create_user().never();

        let result = create_user(&repo, &claims(Role::Admin), form(None));

        assert!(matches!(result, Err(ServiceError::Conflict(msg)) if msg == "Email already exists"));
    }

    #[test]
    fn deletion_rules_follow_roles() {
        let superadmin = user(Role::SuperAdmin);
        let admin = user(Role::Admin);
        let (superadmin_id, admin_id) = (superadmin.id, admin.id);
        let mut repo = MockRepository::new();
        repo.expect_get_user_by_id().returning(move |id| {
            Ok(if id == superadmin_id {
                Some(superadmin.clone())
            } else if id == admin_id {
                Some(admin.clone())
            } else {
                None
            })
        });
        repo.expect_delete_user().times(1).returning(|_| Ok(()));

        let by_admin = claims(Role::Admin);
        let by_root = claims(Role::SuperAdmin);

        assert!(matches!(
            delete_user(&repo, &by_root, &superadmin_id.to_string()),
            Err(ServiceError::Conflict(_))
        ));
        assert!(matches!(
            delete_user(&repo, &by_admin, &admin_id.to_string()),
            Err(ServiceError::Forbidden(_))
        ));
        assert!(matches!(
            delete_user(&repo, &by_admin, &UserId::new().to_string()),
            Err(ServiceError::NotFound(_))
        ));
        assert!(matches!(
            delete_user(&repo, &by_admin, "not-a-uuid"),
            Err(ServiceError::NotFound(_))
        ));
        delete_user(&repo, &by_root, &admin_id.to_string()).unwrap();
    }

    #[test]
    fn promote_and_demote_check_current_role() {
        let admin = user(Role::Admin);
        let admin_id = admin.id;
        let mut repo = MockRepository::new();
        repo.expect_get_user_by_id()
            .returning(move |_| Ok(Some(admin.clone())));
        repo.expect_update_user()
            .withf(|_, updates| updates.role == Some(Role::User))
            .times(1)
            .returning(|_, _| Ok(user(Role::User)));

        let root = claims(Role::SuperAdmin);
        assert!(matches!(
            promote_user(&repo, &root, &admin_id.to_string()),
            Err(ServiceError::Conflict(_))
        ));
        let demoted = demote_user(&repo, &root, &admin_id.to_string()).unwrap();
        assert_eq!(demoted.role, Role::User);

        assert!(matches!(
            promote_user(&repo, &claims(Role::Admin), &admin_id.to_string()),
            Err(ServiceError::Forbidden(_))
        ));
    }

    #[test]
    fn demoting_non_admin_reports_admin_not_found() {
        let mut repo = MockRepository::new();
        repo.expect_get_user_by_id()
            .returning(|_| Ok(Some(user(Role::User))));

        let result = demote_user(&repo, &claims(Role::SuperAdmin), &UserId::new().to_string());

        assert!(matches!(result, Err(ServiceError::NotFound(msg)) if msg == "Admin not found"));
    }
}
