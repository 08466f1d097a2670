//! Repository implementation for accounts.

use chrono::Utc;
use diesel::prelude::*;

use crate::domain::types::{Email, UserId};
use crate::domain::user::{NewUser, Role, UpdateUser, User};
use crate::models::user::{NewUser as DbNewUser, User as DbUser, UserChanges as DbUserChanges};
use crate::repository::errors::{RepositoryError, RepositoryResult};
use crate::repository::{DieselRepository, UserReader, UserWriter};

fn into_domain(rows: Vec<DbUser>) -> RepositoryResult<Vec<User>> {
    rows.into_iter()
        .map(|row| User::try_from(row).map_err(RepositoryError::from))
        .collect()
}

impl UserReader for DieselRepository {
    fn get_user_by_id(&self, id: UserId) -> RepositoryResult<Option<User>> {
        use crate::schema::users;

        let mut conn = self.conn()?;

        let user = users::table
            .find(id.to_string())
            .select(DbUser::as_select())
            .first::<DbUser>(&mut conn)
            .optional()?;

        user.map(User::try_from)
            .transpose()
            .map_err(RepositoryError::from)
    }

    fn get_user_by_email(&self, email: &Email) -> RepositoryResult<Option<User>> {
        use crate::schema::users;

        let mut conn = self.conn()?;

        let user = users::table
            .filter(users::email.eq(email.as_str()))
            .select(DbUser::as_select())
            .first::<DbUser>(&mut conn)
            .optional()?;

        user.map(User::try_from)
            .transpose()
            .map_err(RepositoryError::from)
    }

    fn list_users(&self) -> RepositoryResult<Vec<User>> {
        use crate::schema::users;

        let mut conn = self.conn()?;

        let rows = users::table
            .order(users::created_at.desc())
            .select(DbUser::as_select())
            .load::<DbUser>(&mut conn)?;

        into_domain(rows)
    }

    fn list_active_users(&self) -> RepositoryResult<Vec<User>> {
        use crate::schema::users;

        let mut conn = self.conn()?;

        let rows = users::table
            .filter(users::is_active.eq(true))
            .select(DbUser::as_select())
            .load::<DbUser>(&mut conn)?;

        into_domain(rows)
    }

    fn list_active_users_with_roles(&self, roles: &[Role]) -> RepositoryResult<Vec<User>> {
        use crate::schema::users;

        let mut conn = self.conn()?;

        let roles: Vec<&str> = roles.iter().map(|role| role.as_str()).collect();

        let rows = users::table
            .filter(users::is_active.eq(true))
            .filter(users::role.eq_any(roles))
            .select(DbUser::as_select())
            .load::<DbUser>(&mut conn)?;

        into_domain(rows)
    }
}

impl UserWriter for DieselRepository {
    fn create_user(&self, new_user: &NewUser) -> RepositoryResult<User> {
        use crate::schema::users;

        let mut conn = self.conn()?;

        let db_new_user = DbNewUser::from_domain(new_user, Utc::now().naive_utc());

        let row = diesel::insert_into(users::table)
            .values(&db_new_user)
            .returning(DbUser::as_returning())
            .get_result::<DbUser>(&mut conn)?;

        User::try_from(row).map_err(RepositoryError::from)
    }

    fn update_user(&self, id: UserId, updates: &UpdateUser) -> RepositoryResult<User> {
        use crate::schema::users;

        let mut conn = self.conn()?;

        let changes = DbUserChanges::from_domain(updates, Utc::now().naive_utc());

        let row = diesel::update(users::table.find(id.to_string()))
            .set(&changes)
            .returning(DbUser::as_returning())
            .get_result::<DbUser>(&mut conn)?;

        User::try_from(row).map_err(RepositoryError::from)
    }

    fn delete_user(&self, id: UserId) -> RepositoryResult<()> {
        use crate::schema::users;

        let mut conn = self.conn()?;

        let deleted = diesel::delete(users::table.find(id.to_string())).execute(&mut conn)?;
        if deleted == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
