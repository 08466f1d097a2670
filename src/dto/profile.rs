use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::types::ProfileRequestId;
use crate::profile_requests::{ProfileChangeRequest, ProfileField};

/// Approved request as shown to its requester.
#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalView {
    pub id: ProfileRequestId,
    pub fields: Vec<ProfileField>,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<ProfileChangeRequest> for ApprovalView {
    fn from(request: ProfileChangeRequest) -> Self {
        Self {
            id: request.id,
            fields: request.fields,
            reason: request.reason,
            created_at: request.created_at,
        }
    }
}
