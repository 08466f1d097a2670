use serde::Deserialize;

use crate::domain::types::UserId;
use crate::forms::{FormError, clean};
use crate::repository::{AuditLogQuery, DEFAULT_AUDIT_LIMIT};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Query string of `GET /api/audit`.
pub struct AuditQueryForm {
    pub entity: Option<String>,
    pub record_id: Option<String>,
    pub user_id: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl TryFrom<AuditQueryForm> for AuditLogQuery {
    type Error = FormError;

    fn try_from(form: AuditQueryForm) -> Result<Self, Self::Error> {
        let mut query = AuditLogQuery::default().paginate(
            form.limit.filter(|l| *l > 0).unwrap_or(DEFAULT_AUDIT_LIMIT),
            form.offset.filter(|o| *o >= 0).unwrap_or(0),
        );
        if let Some(entity) = clean(form.entity) {
            query = query.entity(entity);
        }
        if let Some(record_id) = clean(form.record_id) {
            query = query.record_id(record_id);
        }
        if let Some(user_id) = clean(form.user_id) {
            query = query.user_id(UserId::parse(&user_id)?);
        }
        Ok(query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_first_page() {
        let query = AuditLogQuery::try_from(AuditQueryForm::default()).unwrap();
        assert_eq!(query.limit, 50);
        assert_eq!(query.offset, 0);
        assert!(query.entity.is_none());
    }

    #[test]
    fn filters_are_applied() {
        let user = UserId::new();
        let query = AuditLogQuery::try_from(AuditQueryForm {
            entity: Some("Client".into()),
            user_id: Some(user.to_string()),
            limit: Some(10),
            offset: Some(20),
            ..AuditQueryForm::default()
        })
        .unwrap();
        assert_eq!(query.entity.as_deref(), Some("Client"));
        assert_eq!(query.user_id, Some(user));
        assert_eq!((query.limit, query.offset), (10, 20));
    }
}
