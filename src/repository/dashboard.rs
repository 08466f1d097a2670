//! Aggregate queries backing the dashboard.

use std::collections::HashMap;

use diesel::dsl::sum;
use diesel::prelude::*;

use crate::domain::dashboard::{DashboardSummary, RECENT_PROPOSALS, RecentProposal};
use crate::domain::proposal::ProposalStatus;
use crate::domain::types::ProposalId;
use crate::models::proposal::Proposal as DbProposal;
use crate::repository::errors::RepositoryResult;
use crate::repository::{DashboardReader, DieselRepository};

impl DashboardReader for DieselRepository {
    fn dashboard_summary(&self) -> RepositoryResult<DashboardSummary> {
        use crate::schema::{clients, devices, proposals};

        let mut conn = self.conn()?;

        let active_clients = clients::table
            .filter(clients::is_active.eq(true))
            .count()
            .get_result::<i64>(&mut conn)?;

        let active_devices = devices::table
            .filter(devices::is_active.eq(true))
            .count()
            .get_result::<i64>(&mut conn)?;

        let rejected = ProposalStatus::Rejected.as_str();

        let active_proposals = proposals::table
            .filter(proposals::status.ne(rejected))
            .count()
            .get_result::<i64>(&mut conn)?;

        let total_value = proposals::table
            .filter(proposals::status.ne(rejected))
            .select(sum(proposals::total_amount))
            .first::<Option<f64>>(&mut conn)?
            .unwrap_or(0.0);

        let rows = proposals::table
            .order(proposals::created_at.desc())
            .limit(RECENT_PROPOSALS)
            .select(DbProposal::as_select())
            .load::<DbProposal>(&mut conn)?;

        let client_ids: Vec<&str> = rows.iter().map(|row| row.client_id.as_str()).collect();
        let names: HashMap<String, String> = clients::table
            .filter(clients::id.eq_any(client_ids))
            .select((clients::id, clients::company_name))
            .load::<(String, String)>(&mut conn)?
            .into_iter()
            .collect();

        let recent_proposals = rows
            .into_iter()
            .map(|row| {
                Ok(RecentProposal {
                    id: ProposalId::parse(&row.id)?,
                    client_name: names.get(&row.client_id).cloned(),
                    status: row.status.parse()?,
                    proposal_number: row.proposal_number,
                    proposal_title: row.proposal_title,
                    total_amount: row.total_amount,
                    created_at: row.created_at,
                })
            })
            .collect::<RepositoryResult<Vec<_>>>()?;

        Ok(DashboardSummary {
            active_clients,
            active_proposals,
            active_devices,
            total_value,
            recent_proposals,
        })
    }
}
