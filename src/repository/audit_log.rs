//! Repository implementation for the audit log.

use std::collections::HashMap;

use chrono::Utc;
use diesel::prelude::*;

use crate::db::DbConnection;
use crate::domain::audit_log::{AuditActor, AuditLog, AuditLogWithUser, NewAuditLog};
use crate::domain::user::User;
use crate::models::audit_log::{AuditLog as DbAuditLog, NewAuditLog as DbNewAuditLog};
use crate::models::user::User as DbUser;
use crate::repository::errors::{RepositoryError, RepositoryResult};
use crate::repository::{AuditLogQuery, AuditLogReader, AuditLogWriter, DieselRepository};

impl From<User> for AuditActor {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email.into_inner(),
            first_name: user.first_name.into_inner(),
            last_name: user.last_name.into_inner(),
            role: user.role,
            is_active: user.is_active,
        }
    }
}

/// Attaches the acting account to every log row.
fn with_users(
    conn: &mut DbConnection,
    rows: Vec<DbAuditLog>,
) -> RepositoryResult<Vec<AuditLogWithUser>> {
    use crate::schema::users;

    let user_ids: Vec<&str> = rows.iter().filter_map(|row| row.user_id.as_deref()).collect();

    let mut actors: HashMap<String, AuditActor> = HashMap::new();
    if !user_ids.is_empty() {
        for row in users::table
            .filter(users::id.eq_any(user_ids))
            .select(DbUser::as_select())
            .load::<DbUser>(conn)?
        {
            let user = User::try_from(row)?;
            actors.insert(user.id.to_string(), user.into());
        }
    }

    rows.into_iter()
        .map(|row| {
            let user = row.user_id.as_ref().and_then(|id| actors.get(id).cloned());
            let log = AuditLog::try_from(row)?;
            Ok(AuditLogWithUser { log, user })
        })
        .collect()
}

impl AuditLogReader for DieselRepository {
    fn list_audit_logs(
        &self,
        query: AuditLogQuery,
    ) -> RepositoryResult<(usize, Vec<AuditLogWithUser>)> {
        use crate::schema::audit_logs;

        let mut conn = self.conn()?;

        let query_builder = || {
            let mut items = audit_logs::table.into_boxed::<diesel::sqlite::Sqlite>();

            if let Some(entity) = &query.entity {
                items = items.filter(audit_logs::entity.eq(entity.clone()));
            }

            if let Some(record_id) = &query.record_id {
                items = items.filter(audit_logs::record_id.eq(record_id.clone()));
            }

            if let Some(user_id) = query.user_id {
                items = items.filter(audit_logs::user_id.eq(user_id.to_string()));
            }

            items
        };

        let total = query_builder()
            .count()
            .get_result::<i64>(&mut conn)? as usize;

        let rows = query_builder()
            .order(audit_logs::timestamp.desc())
            .limit(query.limit)
            .offset(query.offset)
            .load::<DbAuditLog>(&mut conn)?;

        Ok((total, with_users(&mut conn, rows)?))
    }

    fn list_audit_logs_for_record(
        &self,
        entity: &str,
        record_id: &str,
    ) -> RepositoryResult<Vec<AuditLogWithUser>> {
        use crate::schema::audit_logs;

        let mut conn = self.conn()?;

        let rows = audit_logs::table
            .filter(audit_logs::entity.eq(entity))
            .filter(audit_logs::record_id.eq(record_id))
            .order(audit_logs::timestamp.desc())
            .select(DbAuditLog::as_select())
            .load::<DbAuditLog>(&mut conn)?;

        with_users(&mut conn, rows)
    }
}

impl AuditLogWriter for DieselRepository {
    fn create_audit_log(&self, entry: &NewAuditLog) -> RepositoryResult<AuditLog> {
        use crate::schema::audit_logs;

        let mut conn = self.conn()?;

        let db_entry = DbNewAuditLog::from_domain(entry, Utc::now().naive_utc());

        let row = diesel::insert_into(audit_logs::table)
            .values(&db_entry)
            .returning(DbAuditLog::as_returning())
            .get_result::<DbAuditLog>(&mut conn)?;

        AuditLog::try_from(row).map_err(RepositoryError::from)
    }
}
