//! Audit trail recording and browsing.

use crate::domain::audit_log::NewAuditLog;
use crate::domain::auth::AuthenticatedUser;
use crate::domain::user::Role;
use crate::dto::audit::{AuditHistory, AuditPage};
use crate::forms::audit::AuditQueryForm;
use crate::repository::{AuditLogQuery, AuditLogReader, AuditLogWriter};
use crate::services::{ServiceResult, ensure_role};

/// Client details attached to each audit entry.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RequestMeta {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

/// Appends `entry` on behalf of `user`. A failed write is logged and does
/// not fail the surrounding request.
pub fn record<R>(repo: &R, user: &AuthenticatedUser, meta: &RequestMeta, entry: NewAuditLog)
where
    R: AuditLogWriter + ?Sized,
{
    let entry = entry.actor(
        user.user_id().ok(),
        meta.ip_address.clone(),
        meta.user_agent.clone(),
    );
    if let Err(err) = repo.create_audit_log(&entry) {
        log::error!(
            "Failed to write audit entry for {} {}: {err}",
            entry.entity,
            entry.record_id
        );
    }
}

/// Filtered, paginated audit entries, newest first.
pub fn list_audit_logs<R>(
    repo: &R,
    user: &AuthenticatedUser,
    form: AuditQueryForm,
) -> ServiceResult<AuditPage>
where
    R: AuditLogReader + ?Sized,
{
    ensure_role(user, &[Role::Admin, Role::User])?;

    let query = AuditLogQuery::try_from(form)?;
    let (total, logs) = repo.list_audit_logs(query).map_err(|err| {
        log::error!("Failed to list audit logs: {err}");
        err
    })?;

    Ok(AuditPage { logs, total })
}

/// Full history of one record.
pub fn list_record_history<R>(
    repo: &R,
    user: &AuthenticatedUser,
    entity: &str,
    record_id: &str,
) -> ServiceResult<AuditHistory>
where
    R: AuditLogReader + ?Sized,
{
    ensure_role(user, &[Role::Admin, Role::User])?;

    let logs = repo
        .list_audit_logs_for_record(entity, record_id)
        .map_err(|err| {
            log::error!("Failed to load audit history of {entity} {record_id}: {err}");
            err
        })?;

    Ok(AuditHistory { logs })
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::domain::audit_log::{AuditAction, AuditLog, entity};
    use crate::domain::types::AuditLogId;
    use crate::repository::errors::RepositoryError;
    use crate::repository::mock::MockRepository;
    use crate::services::test_support::claims;

    #[test]
    fn record_stamps_actor_and_request_details() {
        let user = claims(Role::User);
        let actor = user.user_id().unwrap();
        let mut repo = MockRepository::new();
        repo.expect_create_audit_log()
            .withf(move |entry| {
                entry.user_id == Some(actor)
                    && entry.ip_address.as_deref() == Some("10.0.0.1")
                    && entry.user_agent.as_deref() == Some("curl")
            })
            .times(1)
            .returning(|entry| {
                Ok(AuditLog {
                    id: AuditLogId::new(),
                    entity: entry.entity.clone(),
                    record_id: entry.record_id.clone(),
                    action: entry.action,
                    old_values: None,
                    new_values: None,
                    user_id: entry.user_id,
                    ip_address: entry.ip_address.clone(),
                    user_agent: entry.user_agent.clone(),
                    timestamp: Utc::now().naive_utc(),
                })
            });

        let meta = RequestMeta {
            ip_address: Some("10.0.0.1".to_string()),
            user_agent: Some("curl".to_string()),
        };
        record(
            &repo,
            &user,
            &meta,
            NewAuditLog::new(entity::CLIENT, "c-1", AuditAction::Create),
        );
    }

    #[test]
    fn record_swallows_write_failures() {
        let mut repo = MockRepository::new();
        repo.expect_create_audit_log()
            .returning(|_| Err(RepositoryError::DatabaseError("locked".to_string())));

        record(
            &repo,
            &claims(Role::Admin),
            &RequestMeta::default(),
            NewAuditLog::new(entity::DEVICE, "d-1", AuditAction::Delete),
        );
    }

    #[test]
    fn history_is_loaded_for_the_record() {
        let mut repo = MockRepository::new();
        repo.expect_list_audit_logs_for_record()
            .withf(|entity, record_id| entity == "Client" && record_id == "abc")
            .times(1)
            .returning(|_, _| Ok(Vec::new()));

        let history = list_record_history(&repo, &claims(Role::User), "Client", "abc").unwrap();

        assert!(history.logs.is_empty());
    }

    #[test]
    fn listing_reports_total() {
        let mut repo = MockRepository::new();
        repo.expect_list_audit_logs()
            .withf(|query| query.limit == 50 && query.offset == 0)
            .returning(|_| Ok((7, Vec::new())));

        let page = list_audit_logs(&repo, &claims(Role::Admin), AuditQueryForm::default()).unwrap();

        assert_eq!(page.total, 7);
    }
}
