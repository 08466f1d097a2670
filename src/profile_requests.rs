//! In-memory store of profile change requests.
//!
//! A request moves `PENDING -> APPROVED | DENIED` exactly once and an
//! approved request becomes `USED` once the requester applies the change. Requests expire
//! [`PROFILE_REQUEST_TTL_HOURS`] hours after creation; expired and used
//! requests are pruned on every access.

use std::collections::HashMap;
use std::fmt::Display;
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::types::{ProfileRequestId, TypeConstraintError, UserId};
use crate::domain::user::Role;

pub const PROFILE_REQUEST_TTL_HOURS: i64 = 24;

/// Profile attribute a user may ask to change.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum ProfileField {
    FirstName,
    LastName,
    Email,
    Password,
    Role,
}

impl ProfileField {
    pub fn as_str(self) -> &'static str {
        match self {
            ProfileField::FirstName => "firstName",
            ProfileField::LastName => "lastName",
            ProfileField::Email => "email",
            ProfileField::Password => "password",
            ProfileField::Role => "role",
        }
    }
}

impl Display for ProfileField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProfileField {
    type Err = TypeConstraintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "firstName" => Ok(ProfileField::FirstName),
            "lastName" => Ok(ProfileField::LastName),
            "email" => Ok(ProfileField::Email),
            "password" => Ok(ProfileField::Password),
            "role" => Ok(ProfileField::Role),
            other => Err(TypeConstraintError::InvalidValue(format!(
                "unknown profile field: {other}"
            ))),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RequestStoreError {
    #[error("Request not found")]
    NotFound,

    #[error("Request already decided")]
    AlreadyDecided,

    #[error("Request approval required")]
    ApprovalRequired,

    #[error("Requested fields not approved")]
    FieldsNotApproved,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum RequestStatus {
    Pending,
    Approved,
    Denied,
    Used,
}

#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProfileChangeRequest {
    pub id: ProfileRequestId,
    pub requester_id: UserId,
    pub requester_role: Role,
    pub fields: Vec<ProfileField>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub status: RequestStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approver_id: Option<UserId>,
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub expires_at: DateTime<Utc>,
}

impl ProfileChangeRequest {
    /// True when every field in `wanted` was part of this request.
    pub fn covers(&self, wanted: &[ProfileField]) -> bool {
        wanted.iter().all(|field| self.fields.contains(field))
    }
}

/// Shared handle to the pending/approved request table.
#[derive(Clone, Default)]
pub struct ProfileRequestStore {
    requests: Arc<Mutex<HashMap<ProfileRequestId, ProfileChangeRequest>>>,
}

fn prune(requests: &mut HashMap<ProfileRequestId, ProfileChangeRequest>, now: DateTime<Utc>) {
    requests.retain(|_, r| r.expires_at > now && r.status != RequestStatus::Used);
}

impl ProfileRequestStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_at(
        &self,
        now: DateTime<Utc>,
    ) -> MutexGuard<'_, HashMap<ProfileRequestId, ProfileChangeRequest>> {
        let mut requests = self.requests.lock().unwrap_or_else(PoisonError::into_inner);
        prune(&mut requests, now);
        requests
    }

    pub fn create(
        &self,
        requester_id: UserId,
        requester_role: Role,
        fields: Vec<ProfileField>,
        reason: Option<String>,
    ) -> ProfileChangeRequest {
        self.create_at(requester_id, requester_role, fields, reason, Utc::now())
    }

    pub fn create_at(
        &self,
        requester_id: UserId,
        requester_role: Role,
        fields: Vec<ProfileField>,
        reason: Option<String>,
        now: DateTime<Utc>,
    ) -> ProfileChangeRequest {
        let request = ProfileChangeRequest {
            id: ProfileRequestId::new(),
            requester_id,
            requester_role,
            fields,
            reason,
            status: RequestStatus::Pending,
            approver_id: None,
            created_at: now,
            expires_at: now + Duration::hours(PROFILE_REQUEST_TTL_HOURS),
        };
        self.lock_at(now).insert(request.id, request.clone());
        request
    }

    /// Pending requests visible to an approver of `viewer_role`. Requests
    /// raised by admins are only visible to superadmins.
    pub fn list_pending(&self, viewer_role: Role) -> Vec<ProfileChangeRequest> {
        self.list_pending_at(viewer_role, Utc::now())
    }

    pub fn list_pending_at(&self, viewer_role: Role, now: DateTime<Utc>) -> Vec<ProfileChangeRequest> {
        let mut pending: Vec<ProfileChangeRequest> = self
            .lock_at(now)
            .values()
            .filter(|r| r.status == RequestStatus::Pending)
            .filter(|r| r.requester_role != Role::Admin || viewer_role == Role::SuperAdmin)
            .cloned()
            .collect();
        pending.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        pending
    }

    pub fn get(&self, id: ProfileRequestId) -> Option<ProfileChangeRequest> {
        self.get_at(id, Utc::now())
    }

    pub fn get_at(&self, id: ProfileRequestId, now: DateTime<Utc>) -> Option<ProfileChangeRequest> {
        self.lock_at(now).get(&id).cloned()
    }

    /// Records the decision on a pending request. Decided, used and
    /// expired requests cannot be decided again.
    pub fn set_status(
        &self,
        id: ProfileRequestId,
        status: RequestStatus,
        approver_id: Option<UserId>,
    ) -> Result<ProfileChangeRequest, RequestStoreError> {
        let mut requests = self.lock_at(Utc::now());
        let request = requests.get_mut(&id).ok_or(RequestStoreError::NotFound)?;
        if request.status != RequestStatus::Pending {
            return Err(RequestStoreError::AlreadyDecided);
        }
        request.status = status;
        request.approver_id = approver_id;
        Ok(request.clone())
    }

    /// The oldest approved request of `user_id`, left untouched.
    pub fn peek_approved(&self, user_id: UserId) -> Option<ProfileChangeRequest> {
        self.peek_approved_at(user_id, Utc::now())
    }

    pub fn peek_approved_at(
        &self,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> Option<ProfileChangeRequest> {
        self.lock_at(now)
            .values()
            .filter(|r| r.requester_id == user_id && r.status == RequestStatus::Approved)
            .min_by_key(|r| r.created_at)
            .cloned()
    }

    /// The oldest approved request of `user_id` that covers `wanted`,
    /// left untouched.
    pub fn find_covering(
        &self,
        user_id: UserId,
        wanted: &[ProfileField],
    ) -> Result<ProfileChangeRequest, RequestStoreError> {
        let requests = self.lock_at(Utc::now());
        let id = covering_id(&requests, user_id, wanted)?;
        requests.get(&id).cloned().ok_or(RequestStoreError::NotFound)
    }

    /// Marks the oldest approved request of `user_id` that covers `wanted`
    /// as used. Lookup and update happen under one lock, so an approval
    /// is spent at most once.
    pub fn consume_covering(
        &self,
        user_id: UserId,
        wanted: &[ProfileField],
    ) -> Result<ProfileChangeRequest, RequestStoreError> {
        self.consume_covering_at(user_id, wanted, Utc::now())
    }

    pub fn consume_covering_at(
        &self,
        user_id: UserId,
        wanted: &[ProfileField],
        now: DateTime<Utc>,
    ) -> Result<ProfileChangeRequest, RequestStoreError> {
        let mut requests = self.lock_at(now);
        let id = covering_id(&requests, user_id, wanted)?;
        let request = requests.get_mut(&id).ok_or(RequestStoreError::NotFound)?;
        request.status = RequestStatus::Used;
        Ok(request.clone())
    }
}

fn covering_id(
    requests: &HashMap<ProfileRequestId, ProfileChangeRequest>,
    user_id: UserId,
    wanted: &[ProfileField],
) -> Result<ProfileRequestId, RequestStoreError> {
    let mut approved: Vec<&ProfileChangeRequest> = requests
        .values()
        .filter(|r| r.requester_id == user_id && r.status == RequestStatus::Approved)
        .collect();
    if approved.is_empty() {
        return Err(RequestStoreError::ApprovalRequired);
    }
    approved.sort_by_key(|r| r.created_at);
    approved
        .into_iter()
        .find(|r| r.covers(wanted))
        .map(|r| r.id)
        .ok_or(RequestStoreError::FieldsNotApproved)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn approved_request_is_consumed_once() {
        let store = ProfileRequestStore::new();
        let user = UserId::new();
        let request = store.create(user, Role::User, vec![ProfileField::Email], None);

        assert!(store.peek_approved(user).is_none());
        store
            .set_status(request.id, RequestStatus::Approved, Some(UserId::new()))
            .unwrap();
        assert!(store.peek_approved(user).is_some());

        let used = store
            .consume_covering(user, &[ProfileField::Email])
            .unwrap();
        assert_eq!(used.status, RequestStatus::Used);
        assert_eq!(
            store.consume_covering(user, &[ProfileField::Email]),
            Err(RequestStoreError::ApprovalRequired)
        );
        assert!(store.get(request.id).is_none());
    }

    #[test]
    fn uncovered_fields_leave_the_approval_in_place() {
        let store = ProfileRequestStore::new();
        let user = UserId::new();
        let request = store.create(user, Role::User, vec![ProfileField::FirstName], None);
        store
            .set_status(request.id, RequestStatus::Approved, None)
            .unwrap();

        assert_eq!(
            store.consume_covering(user, &[ProfileField::FirstName, ProfileField::Email]),
            Err(RequestStoreError::FieldsNotApproved)
        );
        assert_eq!(
            store.peek_approved(user).map(|r| r.status),
            Some(RequestStatus::Approved)
        );
    }

    #[test]
    fn oldest_covering_approval_is_spent_first() {
        let store = ProfileRequestStore::new();
        let user = UserId::new();
        let now = Utc::now();
        let older = store.create_at(user, Role::User, vec![ProfileField::Email], None, now);
        let newer = store.create_at(
            user,
            Role::User,
            vec![ProfileField::Email],
            None,
            now + Duration::minutes(5),
        );
        for id in [newer.id, older.id] {
            store.set_status(id, RequestStatus::Approved, None).unwrap();
        }

        assert_eq!(store.peek_approved_at(user, now).unwrap().id, older.id);
        let spent = store
            .consume_covering_at(user, &[ProfileField::Email], now)
            .unwrap();
        assert_eq!(spent.id, older.id);
        assert_eq!(store.peek_approved_at(user, now).unwrap().id, newer.id);
    }

    #[test]
    fn concurrent_updates_spend_one_approval_once() {
        let store = ProfileRequestStore::new();
        let user = UserId::new();
        let request = store.create(user, Role::User, vec![ProfileField::Password], None);
        store
            .set_status(request.id, RequestStatus::Approved, None)
            .unwrap();

        let barrier = Arc::new(std::sync::Barrier::new(8));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = store.clone();
                let barrier = Arc::clone(&barrier);
                std::thread::spawn(move || {
                    barrier.wait();
                    store
                        .consume_covering(user, &[ProfileField::Password])
                        .is_ok()
                })
            })
            .collect();
        let spent = handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .filter(|ok| *ok)
            .count();
        assert_eq!(spent, 1);
    }

    #[test]
    fn decided_requests_cannot_be_decided_again() {
        let store = ProfileRequestStore::new();
        let request = store.create(UserId::new(), Role::User, vec![ProfileField::LastName], None);
        let approver = UserId::new();

        let denied = store
            .set_status(request.id, RequestStatus::Denied, Some(approver))
            .unwrap();
        assert_eq!(denied.status, RequestStatus::Denied);
        assert_eq!(
            store.set_status(request.id, RequestStatus::Approved, Some(UserId::new())),
            Err(RequestStoreError::AlreadyDecided)
        );
        let stored = store.get(request.id).unwrap();
        assert_eq!(stored.status, RequestStatus::Denied);
        assert_eq!(stored.approver_id, Some(approver));
        assert_eq!(
            store.set_status(ProfileRequestId::new(), RequestStatus::Denied, None),
            Err(RequestStoreError::NotFound)
        );
    }

    #[test]
    fn admins_do_not_see_admin_requests() {
        let store = ProfileRequestStore::new();
        store.create(UserId::new(), Role::User, vec![ProfileField::FirstName], None);
        store.create(UserId::new(), Role::Admin, vec![ProfileField::LastName], None);

        assert_eq!(store.list_pending(Role::Admin).len(), 1);
        assert_eq!(store.list_pending(Role::SuperAdmin).len(), 2);
    }

    #[test]
    fn requests_expire_after_a_day() {
        let store = ProfileRequestStore::new();
        let now = Utc::now();
        let request = store.create_at(
            UserId::new(),
            Role::User,
            vec![ProfileField::Password],
            Some("forgot".to_string()),
            now,
        );

        assert!(store.get_at(request.id, now + Duration::hours(23)).is_some());
        assert!(store.get_at(request.id, now + Duration::hours(24)).is_none());
    }

    #[test]
    fn covers_checks_every_field() {
        let store = ProfileRequestStore::new();
        let request = store.create(
            UserId::new(),
            Role::User,
            vec![ProfileField::FirstName, ProfileField::Email],
            None,
        );

        assert!(request.covers(&[ProfileField::Email]));
        assert!(!request.covers(&[ProfileField::Email, ProfileField::Password]));
        assert_eq!("lastName".parse::<ProfileField>().unwrap(), ProfileField::LastName);
    }
}
