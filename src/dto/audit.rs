use serde::Serialize;

use crate::domain::audit_log::AuditLogWithUser;

/// One page of `GET /api/audit`.
#[derive(Debug, Serialize)]
pub struct AuditPage {
    pub logs: Vec<AuditLogWithUser>,
    pub total: usize,
}

/// History of a single record.
#[derive(Debug, Serialize)]
pub struct AuditHistory {
    pub logs: Vec<AuditLogWithUser>,
}
