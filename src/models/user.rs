use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::types::{Email, PersonName, TypeConstraintError, UserId};
use crate::domain::user::{NewUser as DomainNewUser, Role, User as DomainUser, UpdateUser};

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::users)]
/// Diesel model for [`crate::domain::user::User`].
pub struct User {
    pub id: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub first_name: String,
    pub last_name: String,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::users)]
/// Insertable form of [`User`].
pub struct NewUser<'a> {
    pub id: String,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub role: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(AsChangeset, Default)]
#[diesel(table_name = crate::schema::users)]
/// Partial update of a [`User`] row; `None` columns are left untouched.
pub struct UserChanges<'a> {
    pub email: Option<&'a str>,
    pub password_hash: Option<&'a str>,
    pub role: Option<&'a str>,
    pub first_name: Option<&'a str>,
    pub last_name: Option<&'a str>,
    pub is_active: Option<bool>,
    pub updated_at: Option<NaiveDateTime>,
}

impl TryFrom<User> for DomainUser {
    type Error = TypeConstraintError;

    fn try_from(user: User) -> Result<Self, Self::Error> {
        Ok(Self {
            id: UserId::parse(&user.id)?,
            email: Email::new(user.email)?,
            password_hash: user.password_hash,
            role: user.role.parse::<Role>()?,
            first_name: PersonName::new(user.first_name)?,
            last_name: PersonName::new(user.last_name)?,
            is_active: user.is_active,
            created_at: user.created_at,
            updated_at: user.updated_at,
        })
    }
}

impl<'a> NewUser<'a> {
    pub fn from_domain(user: &'a DomainNewUser, now: NaiveDateTime) -> Self {
        Self {
            id: user.id.to_string(),
            email: user.email.as_str(),
            password_hash: &user.password_hash,
            role: user.role.as_str(),
            first_name: user.first_name.as_str(),
            last_name: user.last_name.as_str(),
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }
}

impl<'a> UserChanges<'a> {
    pub fn from_domain(update: &'a UpdateUser, now: NaiveDateTime) -> Self {
        Self {
            email: update.email.as_ref().map(Email::as_str),
            password_hash: update.password_hash.as_deref(),
            role: update.role.map(Role::as_str),
            first_name: update.first_name.as_ref().map(PersonName::as_str),
            last_name: update.last_name.as_ref().map(PersonName::as_str),
            is_active: update.is_active,
            updated_at: Some(now),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn row(role: &str) -> User {
        let now = Utc::now().naive_utc();
        User {
            id: UserId::new().to_string(),
            email: "Ann@Example.com".to_string(),
            password_hash: "hash".to_string(),
            role: role.to_string(),
            first_name: "Ann".to_string(),
            last_name: "Lee".to_string(),
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn row_converts_into_domain() {
        let user = DomainUser::try_from(row("ADMIN")).unwrap();
        assert_eq!(user.role, Role::Admin);
        assert_eq!(user.email.as_str(), "ann@example.com");
        assert_eq!(user.full_name(), "Ann Lee");
    }

    #[test]
    fn unknown_role_is_rejected() {
        assert!(DomainUser::try_from(row("OWNER")).is_err());
    }

    #[test]
    fn changes_keep_absent_columns_untouched() {
        let update = UpdateUser {
            role: Some(Role::User),
            ..UpdateUser::default()
        };
        let changes = UserChanges::from_domain(&update, Utc::now().naive_utc());
        assert_eq!(changes.role, Some("USER"));
        assert!(changes.email.is_none());
        assert!(changes.password_hash.is_none());
    }
}
