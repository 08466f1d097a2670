use serde::Deserialize;
use validator::Validate;

use crate::domain::types::{Email, PersonName};
use crate::domain::user::Role;
use crate::forms::FormError;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
/// Body of `POST /api/users`.
pub struct CreateUserForm {
    pub email: String,
    #[validate(length(min = 8))]
    pub password: String,
    #[validate(length(min = 1))]
    pub first_name: String,
    #[validate(length(min = 1))]
    pub last_name: String,
    #[serde(default)]
    pub role: Option<String>,
}

pub struct CreateUserPayload {
    pub email: Email,
    pub password: String,
    pub first_name: PersonName,
    pub last_name: PersonName,
    pub role: Option<Role>,
}

impl TryFrom<CreateUserForm> for CreateUserPayload {
    type Error = FormError;

    fn try_from(form: CreateUserForm) -> Result<Self, Self::Error> {
        form.validate()?;
        let role = match form.role.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(raw.parse::<Role>()?),
        };
        Ok(Self {
            email: Email::new(form.email)?,
            password: form.password,
            first_name: PersonName::new(form.first_name)?,
            last_name: PersonName::new(form.last_name)?,
            role,
        })
    }
}
