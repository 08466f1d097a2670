//! Repository implementation for proposals and their line items.

use std::collections::HashMap;

use chrono::Utc;
use diesel::Connection;
use diesel::prelude::*;

use crate::db::DbConnection;
use crate::domain::client::Client;
use crate::domain::proposal::{
    NewProposal, ProposalStatus, ProposalWithClient, format_proposal_number,
};
use crate::domain::types::ProposalId;
use crate::models::client::Client as DbClient;
use crate::models::proposal::{
    NewProposal as DbNewProposal, NewProposalItem as DbNewProposalItem, Proposal as DbProposal,
    ProposalItem as DbProposalItem,
};
use crate::repository::errors::{RepositoryError, RepositoryResult};
use crate::repository::{DieselRepository, ProposalReader, ProposalWriter};

/// Loads items and clients for `rows`, preserving their order.
fn hydrate(
    conn: &mut DbConnection,
    rows: Vec<DbProposal>,
) -> RepositoryResult<Vec<ProposalWithClient>> {
    use crate::schema::clients;

    let items = DbProposalItem::belonging_to(&rows)
        .select(DbProposalItem::as_select())
        .load::<DbProposalItem>(conn)?
        .grouped_by(&rows);

    let client_ids: Vec<&str> = rows.iter().map(|row| row.client_id.as_str()).collect();
    let mut clients: HashMap<String, Client> = HashMap::new();
    for row in clients::table
        .filter(clients::id.eq_any(client_ids))
        .select(DbClient::as_select())
        .load::<DbClient>(conn)?
    {
        let client = Client::try_from(row)?;
        clients.insert(client.id.to_string(), client);
    }

    rows.into_iter()
        .zip(items)
        .map(|(row, items)| {
            let client = clients.get(&row.client_id).cloned();
            let proposal = row.into_domain(items)?;
            Ok(ProposalWithClient { proposal, client })
        })
        .collect()
}

fn load_one(conn: &mut DbConnection, id: ProposalId) -> RepositoryResult<Option<ProposalWithClient>> {
    use crate::schema::proposals;

    let row = proposals::table
        .find(id.to_string())
        .select(DbProposal::as_select())
        .first::<DbProposal>(conn)
        .optional()?;

    match row {
        Some(row) => Ok(hydrate(conn, vec![row])?.pop()),
        None => Ok(None),
    }
}

impl ProposalReader for DieselRepository {
    fn get_proposal_by_id(&self, id: ProposalId) -> RepositoryResult<Option<ProposalWithClient>> {
        let mut conn = self.conn()?;
        load_one(&mut conn, id)
    }

    fn list_proposals(&self) -> RepositoryResult<Vec<ProposalWithClient>> {
        use crate::schema::proposals;

        let mut conn = self.conn()?;

        let rows = proposals::table
            .order(proposals::created_at.desc())
            .select(DbProposal::as_select())
            .load::<DbProposal>(&mut conn)?;

        hydrate(&mut conn, rows)
    }
}

impl ProposalWriter for DieselRepository {
    fn create_proposal(&self, new_proposal: &NewProposal) -> RepositoryResult<ProposalWithClient> {
        use crate::schema::{proposal_items, proposal_sequence, proposals};

        let mut conn = self.conn()?;

        // Write lock is held from the sequence read onwards.
        conn.immediate_transaction::<(), diesel::result::Error, _>(|conn| {
            let sequence = proposal_sequence::table
                .find(1)
                .select(proposal_sequence::value)
                .first::<i32>(conn)?;

            diesel::update(proposal_sequence::table.find(1))
                .set(proposal_sequence::value.eq(proposal_sequence::value + 1))
                .execute(conn)?;

            let db_proposal = DbNewProposal::from_domain(
                new_proposal,
                format_proposal_number(sequence),
                Utc::now().naive_utc(),
            );
            diesel::insert_into(proposals::table)
                .values(&db_proposal)
                .execute(conn)?;

            let db_items = new_proposal
                .items
                .iter()
                .map(|item| DbNewProposalItem::from_domain(new_proposal.id, item))
                .collect::<Vec<_>>();
            diesel::insert_into(proposal_items::table)
                .values(&db_items)
                .execute(conn)?;

            Ok(())
        })?;

        load_one(&mut conn, new_proposal.id)?.ok_or(RepositoryError::NotFound)
    }

    fn update_proposal_status(
        &self,
        id: ProposalId,
        status: ProposalStatus,
    ) -> RepositoryResult<ProposalWithClient> {
        use crate::schema::proposals;

        let mut conn = self.conn()?;

        let updated = diesel::update(proposals::table.find(id.to_string()))
            .set((
                proposals::status.eq(status.as_str()),
                proposals::updated_at.eq(Utc::now().naive_utc()),
            ))
            .execute(&mut conn)?;
        if updated == 0 {
            return Err(RepositoryError::NotFound);
        }

        load_one(&mut conn, id)?.ok_or(RepositoryError::NotFound)
    }

    fn mark_proposal_previewed(&self, id: ProposalId) -> RepositoryResult<ProposalWithClient> {
        use crate::schema::proposals;

        let mut conn = self.conn()?;

        let updated = diesel::update(proposals::table.find(id.to_string()))
            .set((
                proposals::is_previewed.eq(true),
                proposals::updated_at.eq(Utc::now().naive_utc()),
            ))
            .execute(&mut conn)?;
        if updated == 0 {
            return Err(RepositoryError::NotFound);
        }

        load_one(&mut conn, id)?.ok_or(RepositoryError::NotFound)
    }

    fn delete_proposal(&self, id: ProposalId) -> RepositoryResult<()> {
        use crate::schema::{proposal_items, proposals};

        let mut conn = self.conn()?;

        let deleted = conn.immediate_transaction::<usize, diesel::result::Error, _>(|conn| {
            diesel::delete(
                proposal_items::table.filter(proposal_items::proposal_id.eq(id.to_string())),
            )
            .execute(conn)?;
            diesel::delete(proposals::table.find(id.to_string())).execute(conn)
        })?;

        if deleted == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
