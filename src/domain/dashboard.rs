//! Aggregates shown on the landing dashboard.

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::domain::proposal::ProposalStatus;
use crate::domain::types::ProposalId;

/// Number of proposals listed under "recent".
pub const RECENT_PROPOSALS: i64 = 5;

#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RecentProposal {
    pub id: ProposalId,
    pub proposal_number: String,
    pub proposal_title: Option<String>,
    pub client_name: Option<String>,
    pub status: ProposalStatus,
    pub total_amount: f64,
    pub created_at: NaiveDateTime,
}

#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub active_clients: i64,
    pub active_proposals: i64,
    pub active_devices: i64,
    pub total_value: f64,
    pub recent_proposals: Vec<RecentProposal>,
}
