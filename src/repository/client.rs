//! Repository implementation for clients.

use chrono::Utc;
use diesel::prelude::*;

use crate::domain::client::{Client, ClientDetails, NewClient};
use crate::domain::types::ClientId;
use crate::models::client::{
    Client as DbClient, NewClient as DbNewClient, UpdateClient as DbUpdateClient,
};
use crate::repository::errors::{RepositoryError, RepositoryResult};
use crate::repository::{ClientReader, ClientWriter, DieselRepository};

impl ClientReader for DieselRepository {
    fn get_client_by_id(&self, id: ClientId) -> RepositoryResult<Option<Client>> {
        use crate::schema::clients;

        let mut conn = self.conn()?;

        let client = clients::table
            .find(id.to_string())
            .select(DbClient::as_select())
            .first::<DbClient>(&mut conn)
            .optional()?;

        client
            .map(Client::try_from)
            .transpose()
            .map_err(RepositoryError::from)
    }

    fn list_active_clients(&self) -> RepositoryResult<Vec<Client>> {
        use crate::schema::clients;

        let mut conn = self.conn()?;

        let rows = clients::table
            .filter(clients::is_active.eq(true))
            .order(clients::created_at.desc())
            .select(DbClient::as_select())
            .load::<DbClient>(&mut conn)?;

        rows.into_iter()
            .map(|row| Client::try_from(row).map_err(RepositoryError::from))
            .collect()
    }
}

impl ClientWriter for DieselRepository {
    fn create_client(&self, new_client: &NewClient) -> RepositoryResult<Client> {
        use crate::schema::clients;

        let mut conn = self.conn()?;

        let db_new_client = DbNewClient::from_domain(new_client, Utc::now().naive_utc());

        let row = diesel::insert_into(clients::table)
            .values(&db_new_client)
            .returning(DbClient::as_returning())
            .get_result::<DbClient>(&mut conn)?;

        Client::try_from(row).map_err(RepositoryError::from)
    }

    fn update_client(&self, id: ClientId, details: &ClientDetails) -> RepositoryResult<Client> {
        use crate::schema::clients;

        let mut conn = self.conn()?;

        let db_updates = DbUpdateClient::from_domain(details, Utc::now().naive_utc());

        let row = diesel::update(clients::table.find(id.to_string()))
            .set(&db_updates)
            .returning(DbClient::as_returning())
            .get_result::<DbClient>(&mut conn)?;

        Client::try_from(row).map_err(RepositoryError::from)
    }

    fn deactivate_client(&self, id: ClientId) -> RepositoryResult<Client> {
        use crate::schema::clients;

        let mut conn = self.conn()?;

        let row = diesel::update(clients::table.find(id.to_string()))
            .set((
                clients::is_active.eq(false),
                clients::updated_at.eq(Utc::now().naive_utc()),
            ))
            .returning(DbClient::as_returning())
            .get_result::<DbClient>(&mut conn)?;

        Client::try_from(row).map_err(RepositoryError::from)
    }
}
