//! Append-only change records and the before/after diff.

use std::collections::BTreeSet;
use std::fmt::Display;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::types::{AuditLogId, TypeConstraintError, UserId};
use crate::domain::user::Role;

/// Keys never recorded in a diff.
pub const EXCLUDED_DIFF_FIELDS: [&str; 4] = ["passwordHash", "password", "createdAt", "updatedAt"];

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum AuditAction {
    Create,
    Update,
    Delete,
}

impl AuditAction {
    pub fn as_str(self) -> &'static str {
        match self {
            AuditAction::Create => "CREATE",
            AuditAction::Update => "UPDATE",
            AuditAction::Delete => "DELETE",
        }
    }
}

impl Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuditAction {
    type Err = TypeConstraintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CREATE" => Ok(AuditAction::Create),
            "UPDATE" => Ok(AuditAction::Update),
            "DELETE" => Ok(AuditAction::Delete),
            other => Err(TypeConstraintError::InvalidValue(format!(
                "unknown audit action: {other}"
            ))),
        }
    }
}

/// Entity names used in audit records and notifications.
pub mod entity {
    pub const CLIENT: &str = "Client";
    pub const DEVICE: &str = "Device";
    pub const PROPOSAL: &str = "Proposal";
}

#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AuditLog {
    pub id: AuditLogId,
    pub entity: String,
    pub record_id: String,
    pub action: AuditAction,
    pub old_values: Option<Map<String, Value>>,
    pub new_values: Option<Map<String, Value>>,
    pub user_id: Option<UserId>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub timestamp: NaiveDateTime,
}

/// Account summary attached to audit entries.
#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AuditActor {
    pub id: UserId,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    pub is_active: bool,
}

#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AuditLogWithUser {
    #[serde(flatten)]
    pub log: AuditLog,
    pub user: Option<AuditActor>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct NewAuditLog {
    pub id: AuditLogId,
    pub entity: String,
    pub record_id: String,
    pub action: AuditAction,
    pub old_values: Option<Map<String, Value>>,
    pub new_values: Option<Map<String, Value>>,
    pub user_id: Option<UserId>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl NewAuditLog {
    #[must_use]
    pub fn new(entity: &str, record_id: impl Display, action: AuditAction) -> Self {
        Self {
            id: AuditLogId::new(),
            entity: entity.to_string(),
            record_id: record_id.to_string(),
            action,
            old_values: None,
            new_values: None,
            user_id: None,
            ip_address: None,
            user_agent: None,
        }
    }

    pub fn old_values(mut self, values: Map<String, Value>) -> Self {
        self.old_values = Some(values);
        self
    }

    pub fn new_values(mut self, values: Map<String, Value>) -> Self {
        self.new_values = Some(values);
        self
    }

    pub fn actor(
        mut self,
        user_id: Option<UserId>,
        ip_address: Option<String>,
        user_agent: Option<String>,
    ) -> Self {
        self.user_id = user_id;
        self.ip_address = ip_address;
        self.user_agent = user_agent;
        self
    }
}

/// Old and new values of the keys that changed.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AuditDiff {
    pub old: Map<String, Value>,
    pub new: Map<String, Value>,
}

impl AuditDiff {
    pub fn is_empty(&self) -> bool {
        self.old.is_empty() && self.new.is_empty()
    }
}

/// Keeps only keys whose values differ, skipping [`EXCLUDED_DIFF_FIELDS`].
/// A key missing on one side is recorded as `null` there.
pub fn diff(old: &Map<String, Value>, new: &Map<String, Value>) -> AuditDiff {
    let keys: BTreeSet<&String> = old.keys().chain(new.keys()).collect();
    let mut result = AuditDiff::default();

    for key in keys {
        if EXCLUDED_DIFF_FIELDS.contains(&key.as_str()) {
            continue;
        }
        let before = old.get(key).cloned().unwrap_or(Value::Null);
        let after = new.get(key).cloned().unwrap_or(Value::Null);
        if before != after {
            result.old.insert(key.clone(), before);
            result.new.insert(key.clone(), after);
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn map(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn diff_keeps_only_changed_keys() {
        let old = map(json!({"companyName": "Acme", "taxId": "1", "billingAddress": "A"}));
        let new = map(json!({"companyName": "Acme", "taxId": "2", "billingAddress": "A"}));

        let diff = diff(&old, &new);

        assert_eq!(diff.old, map(json!({"taxId": "1"})));
        assert_eq!(diff.new, map(json!({"taxId": "2"})));
    }

    #[test]
    fn diff_skips_sensitive_and_timestamp_fields() {
        let old = map(json!({"passwordHash": "a", "updatedAt": "x", "email": "a@b.c"}));
        let new = map(json!({"passwordHash": "b", "updatedAt": "y", "email": "a@b.c"}));

        assert!(diff(&old, &new).is_empty());
    }

    #[test]
    fn diff_reports_added_and_removed_keys_as_null() {
        let old = map(json!({"a": 1}));
        let new = map(json!({"b": 2}));

        let diff = diff(&old, &new);

        assert_eq!(diff.old, map(json!({"a": 1, "b": null})));
        assert_eq!(diff.new, map(json!({"a": null, "b": 2})));
    }

    #[test]
    fn builder_sets_values() {
        let user = UserId::new();
        let entry = NewAuditLog::new(entity::CLIENT, "c1", AuditAction::Delete)
            .old_values(map(json!({"companyName": "Acme"})))
            .actor(Some(user), Some("10.0.0.1".into()), None);

        assert_eq!(entry.record_id, "c1");
        assert_eq!(entry.user_id, Some(user));
        assert!(entry.new_values.is_none());
    }
}
