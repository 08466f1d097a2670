use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde_json::{Map, Value};

use crate::domain::audit_log::{AuditAction, AuditLog as DomainAuditLog, NewAuditLog as DomainNewAuditLog};
use crate::domain::types::{AuditLogId, TypeConstraintError, UserId};
use crate::models::device::parse_json_object;

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::audit_logs)]
/// Diesel model for [`crate::domain::audit_log::AuditLog`].
pub struct AuditLog {
    pub id: String,
    pub entity: String,
    pub record_id: String,
    pub action: String,
    pub old_values: Option<String>,
    pub new_values: Option<String>,
    pub user_id: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub timestamp: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::audit_logs)]
/// Insertable form of [`AuditLog`].
pub struct NewAuditLog<'a> {
    pub id: String,
    pub entity: &'a str,
    pub record_id: &'a str,
    pub action: &'a str,
    pub old_values: Option<String>,
    pub new_values: Option<String>,
    pub user_id: Option<String>,
    pub ip_address: Option<&'a str>,
    pub user_agent: Option<&'a str>,
    pub timestamp: NaiveDateTime,
}

fn values_text(values: &Map<String, Value>) -> String {
    Value::Object(values.clone()).to_string()
}

impl TryFrom<AuditLog> for DomainAuditLog {
    type Error = TypeConstraintError;

    fn try_from(log: AuditLog) -> Result<Self, Self::Error> {
        Ok(Self {
            id: AuditLogId::parse(&log.id)?,
            entity: log.entity,
            record_id: log.record_id,
            action: log.action.parse::<AuditAction>()?,
            old_values: log.old_values.as_deref().map(parse_json_object).transpose()?,
            new_values: log.new_values.as_deref().map(parse_json_object).transpose()?,
            user_id: log.user_id.as_deref().map(UserId::parse).transpose()?,
            ip_address: log.ip_address,
            user_agent: log.user_agent,
            timestamp: log.timestamp,
        })
    }
}

impl<'a> NewAuditLog<'a> {
    pub fn from_domain(log: &'a DomainNewAuditLog, now: NaiveDateTime) -> Self {
        Self {
            id: log.id.to_string(),
            entity: &log.entity,
            record_id: &log.record_id,
            action: log.action.as_str(),
            old_values: log.old_values.as_ref().map(values_text),
            new_values: log.new_values.as_ref().map(values_text),
            user_id: log.user_id.map(|id| id.to_string()),
            ip_address: log.ip_address.as_deref(),
            user_agent: log.user_agent.as_deref(),
            timestamp: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use serde_json::json;

    use super::*;
    use crate::domain::audit_log::entity;

    #[test]
    fn values_are_stored_as_json_text() {
        let entry = DomainNewAuditLog::new(entity::DEVICE, "d1", AuditAction::Create)
            .new_values(json!({"name": "Switch"}).as_object().cloned().unwrap());
        let row = NewAuditLog::from_domain(&entry, Utc::now().naive_utc());
        assert_eq!(row.action, "CREATE");
        assert_eq!(row.new_values.as_deref(), Some(r#"{"name":"Switch"}"#));
        assert!(row.old_values.is_none());
    }

    #[test]
    fn row_converts_into_domain() {
        let row = AuditLog {
            id: AuditLogId::new().to_string(),
            entity: "Client".to_string(),
            record_id: "c1".to_string(),
            action: "UPDATE".to_string(),
            old_values: Some(r#"{"taxId":"1"}"#.to_string()),
            new_values: Some(r#"{"taxId":"2"}"#.to_string()),
            user_id: None,
            ip_address: Some("127.0.0.1".to_string()),
            user_agent: None,
            timestamp: Utc::now().naive_utc(),
        };
        let log = DomainAuditLog::try_from(row).unwrap();
        assert_eq!(log.action, AuditAction::Update);
        assert_eq!(log.new_values.unwrap().get("taxId"), Some(&json!("2")));
    }
}
