//! Self-service profile edits gated by admin approval.

use serde_json::json;

use crate::domain::auth::AuthenticatedUser;
use crate::domain::types::{ProfileRequestId, UserId};
use crate::domain::user::{Role, UpdateUser};
use crate::dto::profile::ApprovalView;
use crate::forms::profile::{
    Decision, DecisionForm, RequestChangeForm, RequestChangePayload, UpdateSelfForm,
    UpdateSelfPayload,
};
use crate::notifications::{NotificationHub, NotificationInput, NotificationType};
use crate::profile_requests::{
    ProfileChangeRequest, ProfileRequestStore, RequestStatus, RequestStoreError,
};
use crate::repository::{UserReader, UserWriter};
use crate::services::auth::hash_password;
use crate::services::{ServiceError, ServiceResult, actor_id, ensure_role};

const PROFILE_REQUEST_ENTITY: &str = "ProfileRequest";
const REQUEST_NOT_FOUND: &str = "Request not found";
const APPROVER_ROLES: &[Role] = &[Role::Admin, Role::SuperAdmin];

/// Accounts allowed to decide a request raised by `role`.
fn approver_ids<R>(repo: &R, role: Role) -> ServiceResult<Vec<UserId>>
where
    R: UserReader + ?Sized,
{
    let roles: &[Role] = match role {
        Role::User => &[Role::Admin, Role::SuperAdmin],
        Role::Admin => &[Role::SuperAdmin],
        Role::SuperAdmin => return Ok(Vec::new()),
    };
    Ok(repo
        .list_active_users_with_roles(roles)?
        .into_iter()
        .map(|user| user.id)
        .collect())
}

/// Opens a change request and alerts the approvers.
pub fn request_change<R>(
    repo: &R,
    hub: &NotificationHub,
    store: &ProfileRequestStore,
    user: &AuthenticatedUser,
    form: RequestChangeForm,
) -> ServiceResult<ProfileChangeRequest>
where
    R: UserReader + ?Sized,
{
    let requester = actor_id(user)?;
    if user.role == Role::SuperAdmin {
        return Err(ServiceError::Form(
            "Superadmins can edit directly".to_string(),
        ));
    }

    let payload = RequestChangePayload::try_from(form)?;
    let request = store.create(requester, user.role, payload.fields, payload.reason);

    let recipients = approver_ids(repo, user.role).unwrap_or_else(|err| {
        log::error!("Failed to load approvers for request {}: {err}", request.id);
        Vec::new()
    });
    let field_names: Vec<&str> = request.fields.iter().map(|f| f.as_str()).collect();
    let input = NotificationInput::new(
        NotificationType::Request,
        "Profile change request",
        format!("{} requested changes: {}", user.email, field_names.join(", ")),
    )
    .record(PROFILE_REQUEST_ENTITY, request.id)
    .meta(json!({ "fields": request.fields, "requesterId": requester }));
    hub.add_for_users(&recipients, &input);

    Ok(request)
}

/// Pending requests the caller may decide.
pub fn list_requests(
    store: &ProfileRequestStore,
    user: &AuthenticatedUser,
) -> ServiceResult<Vec<ProfileChangeRequest>> {
    ensure_role(user, APPROVER_ROLES)?;
    Ok(store.list_pending(user.role))
}

pub fn decide(
    hub: &NotificationHub,
    store: &ProfileRequestStore,
    user: &AuthenticatedUser,
    request_id: &str,
    form: DecisionForm,
) -> ServiceResult<ProfileChangeRequest> {
    ensure_role(user, APPROVER_ROLES)?;
    let approver = actor_id(user)?;

    let request = ProfileRequestId::parse(request_id)
        .ok()
        .and_then(|id| store.get(id))
        .ok_or_else(|| ServiceError::NotFound(REQUEST_NOT_FOUND.to_string()))?;

    if request.requester_role == Role::Admin && user.role != Role::SuperAdmin {
        return Err(ServiceError::Forbidden(
            "Only superadmins can approve admin requests".to_string(),
        ));
    }

    let decision = Decision::try_from(form)?;
    let status = match decision {
        Decision::Approve => RequestStatus::Approved,
        Decision::Deny => RequestStatus::Denied,
    };

    let updated = store
        .set_status(request.id, status, Some(approver))
        .map_err(|err| match err {
            RequestStoreError::AlreadyDecided => ServiceError::Conflict(err.to_string()),
            _ => ServiceError::NotFound(REQUEST_NOT_FOUND.to_string()),
        })?;

    let message = match decision {
        Decision::Approve => "Your profile change request was approved.",
        Decision::Deny => "Your profile change request was denied.",
    };
    let input = NotificationInput::new(
        NotificationType::Request,
        "Profile request update",
        message,
    )
    .record(PROFILE_REQUEST_ENTITY, updated.id)
    .meta(json!({ "status": updated.status }));
    hub.add_for_users(&[updated.requester_id], &input);

    Ok(updated)
}

/// The caller's approved, not yet used request.
pub fn my_approval(
    store: &ProfileRequestStore,
    user: &AuthenticatedUser,
) -> ServiceResult<Option<ApprovalView>> {
    Ok(store.peek_approved(actor_id(user)?).map(ApprovalView::from))
}

/// Applies a self-edit. Everyone but superadmins needs an approved request
/// covering every supplied field; the request is used up once the edit
/// passes validation.
pub fn update_self<R>(
    repo: &R,
    hub: &NotificationHub,
    store: &ProfileRequestStore,
    user: &AuthenticatedUser,
    form: UpdateSelfForm,
) -> ServiceResult<()>
where
    R: UserReader + UserWriter + ?Sized,
{
    let user_id = actor_id(user)?;
    let payload = UpdateSelfPayload::try_from(form)?;
    let needs_approval = user.role != Role::SuperAdmin;

    if needs_approval {
        store
            .find_covering(user_id, &payload.fields())
            .map_err(|err| ServiceError::Forbidden(err.to_string()))?;
    }

    if let Some(email) = &payload.email {
        let taken = repo
            .get_user_by_email(email)?
            .is_some_and(|other| other.id != user_id);
        if taken {
            return Err(ServiceError::Conflict("Email already exists".to_string()));
        }
    }

    // Re-checked under the store lock; a concurrent edit may have spent it.
    if needs_approval {
        store
            .consume_covering(user_id, &payload.fields())
            .map_err(|err| ServiceError::Forbidden(err.to_string()))?;
    }

    let password_hash = payload
        .password
        .as_deref()
        .map(hash_password)
        .transpose()?;
    let updates = UpdateUser {
        email: payload.email,
        password_hash,
        first_name: payload.first_name,
        last_name: payload.last_name,
        ..UpdateUser::default()
    };

    repo.update_user(user_id, &updates).map_err(|err| {
        log::error!("Failed to update profile of {user_id}: {err}");
        err
    })?;

    let input = NotificationInput::new(
        NotificationType::Info,
        "Profile updated",
        "Your profile changes were saved.",
    )
    .record("Profile", user_id);
    hub.add_for_users(&[user_id], &input);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile_requests::ProfileField;
    use crate::repository::mock::MockRepository;
    use crate::services::test_support::{claims, user};

    fn request_form(fields: &[&str]) -> RequestChangeForm {
        RequestChangeForm {
            fields: fields.iter().map(|f| f.to_string()).collect(),
            reason: Some("Married".to_string()),
        }
    }

    #[test]
    fn superadmin_cannot_request() {
        let repo = MockRepository::new();
        let result = request_change(
            &repo,
            &NotificationHub::new(),
            &ProfileRequestStore::new(),
            &claims(Role::SuperAdmin),
            request_form(&["email"]),
        );
        assert!(matches!(result, Err(ServiceError::Form(msg)) if msg == "Superadmins can edit directly"));
    }

    #[test]
    fn user_request_notifies_every_admin() {
        let admin = user(Role::Admin);
        let admin_id = admin.id;
        let mut repo = MockRepository::new();
        repo.expect_list_active_users_with_roles()
            .withf(|roles| roles == [Role::Admin, Role::SuperAdmin])
            .times(1)
            .returning(move |_| Ok(vec![admin.clone()]));
        let hub = NotificationHub::new();
        let store = ProfileRequestStore::new();

        let request = request_change(
            &repo,
            &hub,
            &store,
            &claims(Role::User),
            request_form(&["lastName", "salary"]),
        )
        .unwrap();

        assert_eq!(request.fields, vec![ProfileField::LastName]);
        let inbox = hub.list(admin_id);
        assert_eq!(inbox[0].message, "actor@example.com requested changes: lastName");
        assert_eq!(inbox[0].kind, NotificationType::Request);
        assert_eq!(store.list_pending(Role::Admin).len(), 1);
    }

    #[test]
    fn admin_requests_need_superadmin_decision() {
        let store = ProfileRequestStore::new();
        let requester = claims(Role::Admin);
        let request = store.create(
            requester.user_id().unwrap(),
            Role::Admin,
            vec![ProfileField::Email],
            None,
        );
        let hub = NotificationHub::new();

        let result = decide(
            &hub,
            &store,
            &claims(Role::Admin),
            &request.id.to_string(),
            DecisionForm {
                action: "APPROVE".to_string(),
            },
        );
        assert!(matches!(result, Err(ServiceError::Forbidden(_))));

        let invalid = decide(
            &hub,
            &store,
            &claims(Role::SuperAdmin),
            &request.id.to_string(),
            DecisionForm {
                action: "later".to_string(),
            },
        );
        assert!(matches!(invalid, Err(ServiceError::Form(msg)) if msg == "Invalid action"));

        let approved = decide(
            &hub,
            &store,
            &claims(Role::SuperAdmin),
            &request.id.to_string(),
            DecisionForm {
                action: "approve".to_string(),
            },
        )
        .unwrap();
        assert_eq!(approved.status, RequestStatus::Approved);
        let inbox = hub.list(requester.user_id().unwrap());
        assert_eq!(inbox[0].message, "Your profile change request was approved.");
    }

    #[test]
    fn unknown_request_is_not_found() {
        let result = decide(
            &NotificationHub::new(),
            &ProfileRequestStore::new(),
            &claims(Role::Admin),
            &ProfileRequestId::new().to_string(),
            DecisionForm {
                action: "DENY".to_string(),
            },
        );
        assert!(matches!(result, Err(ServiceError::NotFound(msg)) if msg == "Request not found"));
    }

    #[test]
    fn denied_request_cannot_be_approved_later() {
        let store = ProfileRequestStore::new();
        let requester = claims(Role::User);
        let request = store.create(
            requester.user_id().unwrap(),
            Role::User,
            vec![ProfileField::Password],
            None,
        );
        let hub = NotificationHub::new();
        let decide_as = |action: &str| {
            decide(
                &hub,
                &store,
                &claims(Role::Admin),
                &request.id.to_string(),
                DecisionForm {
                    action: action.to_string(),
                },
            )
        };

        assert_eq!(decide_as("DENY").unwrap().status, RequestStatus::Denied);
        let again = decide_as("APPROVE");
        assert!(matches!(again, Err(ServiceError::Conflict(msg)) if msg == "Request already decided"));
        assert!(store.peek_approved(requester.user_id().unwrap()).is_none());
        assert_eq!(hub.list(requester.user_id().unwrap()).len(), 1);
    }

    #[test]
    fn update_without_approval_is_forbidden() {
        let repo = MockRepository::new();
        let result = update_self(
            &repo,
            &NotificationHub::new(),
            &ProfileRequestStore::new(),
            &claims(Role::User),
            UpdateSelfForm {
                first_name: Some("Alexandra".to_string()),
                ..UpdateSelfForm::default()
            },
        );
        assert!(matches!(result, Err(ServiceError::Forbidden(msg)) if msg == "Request approval required"));
    }

    #[test]
    fn approval_must_cover_every_field_and_is_used_once() {
        let me = claims(Role::User);
        let my_id = me.user_id().unwrap();
        let store = ProfileRequestStore::new();
        let request = store.create(my_id, Role::User, vec![ProfileField::FirstName], None);
        store
            .set_status(request.id, RequestStatus::Approved, Some(UserId::new()))
            .unwrap();
        let hub = NotificationHub::new();

        let mut repo = MockRepository::new();
        repo.expect_get_user_by_email().returning(|_| Ok(None));
        repo.expect_update_user()
            .withf(move |id, updates| {
                *id == my_id
                    && updates.first_name.as_ref().map(|n| n.as_str()) == Some("Alexandra")
                    && updates.role.is_none()
            })
            .times(1)
            .returning(|_, _| Ok(user(Role::User)));

        let too_much = update_self(
            &repo,
            &hub,
            &store,
            &me,
            UpdateSelfForm {
                first_name: Some("Alexandra".to_string()),
                email: Some("new@example.com".to_string()),
                ..UpdateSelfForm::default()
            },
        );
        assert!(matches!(too_much, Err(ServiceError::Forbidden(msg)) if msg == "Requested fields not approved"));
        assert!(my_approval(&store, &me).unwrap().is_some());

        update_self(
            &repo,
            &hub,
            &store,
            &me,
            UpdateSelfForm {
                first_name: Some("Alexandra".to_string()),
                ..UpdateSelfForm::default()
            },
        )
        .unwrap();

        assert!(my_approval(&store, &me).unwrap().is_none());
        assert_eq!(hub.list(my_id)[0].title, "Profile updated");
    }

    #[test]
    fn superadmin_edits_directly() {
        let root = claims(Role::SuperAdmin);
        let mut repo = MockRepository::new();
        repo.expect_get_user_by_email().returning(|_| Ok(None));
        repo.expect_update_user()
            .withf(|_, updates| updates.password_hash.is_some() && updates.email.is_some())
            .times(1)
            .returning(|_, _| Ok(user(Role::SuperAdmin)));

        update_self(
            &repo,
            &NotificationHub::new(),
            &ProfileRequestStore::new(),
            &root,
            UpdateSelfForm {
                email: Some("Root@Example.com".to_string()),
                password: Some("a-new-password".to_string()),
                ..UpdateSelfForm::default()
            },
        )
        .unwrap();
    }
}
