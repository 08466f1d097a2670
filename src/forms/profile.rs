use serde::Deserialize;

use crate::domain::types::{Email, PersonName};
use crate::forms::{FormError, clean};
use crate::profile_requests::ProfileField;

#[derive(Debug, Deserialize)]
/// Body of `POST /api/profile/request-change`.
pub struct RequestChangeForm {
    #[serde(default)]
    pub fields: Vec<String>,
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
/// Body of `POST /api/profile/requests/{id}/decision`.
pub struct DecisionForm {
    #[serde(default)]
    pub action: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Body of `POST /api/profile/update`.
pub struct UpdateSelfForm {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

pub struct RequestChangePayload {
    pub fields: Vec<ProfileField>,
    pub reason: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Decision {
    Approve,
    Deny,
}

#[derive(Default)]
pub struct UpdateSelfPayload {
    pub first_name: Option<PersonName>,
    pub last_name: Option<PersonName>,
    pub email: Option<Email>,
    pub password: Option<String>,
}

impl UpdateSelfPayload {
    /// Fields present in the update, for approval checks.
    pub fn fields(&self) -> Vec<ProfileField> {
        let mut fields = Vec::new();
        if self.first_name.is_some() {
            fields.push(ProfileField::FirstName);
        }
        if self.last_name.is_some() {
            fields.push(ProfileField::LastName);
        }
        if self.email.is_some() {
            fields.push(ProfileField::Email);
        }
        if self.password.is_some() {
            fields.push(ProfileField::Password);
        }
        fields
    }
}

impl TryFrom<RequestChangeForm> for RequestChangePayload {
    type Error = FormError;

    fn try_from(form: RequestChangeForm) -> Result<Self, Self::Error> {
        let mut fields: Vec<ProfileField> = Vec::new();
        for field in form.fields.iter().filter_map(|f| f.parse::<ProfileField>().ok()) {
            if !fields.contains(&field) {
                fields.push(field);
            }
        }
        if fields.is_empty() {
            return Err(FormError::Invalid("No valid fields requested".to_string()));
        }
        Ok(Self {
            fields,
            reason: clean(form.reason),
        })
    }
}

impl TryFrom<DecisionForm> for Decision {
    type Error = FormError;

    fn try_from(form: DecisionForm) -> Result<Self, Self::Error> {
        match form.action.trim().to_uppercase().as_str() {
            "APPROVE" => Ok(Decision::Approve),
            "DENY" => Ok(Decision::Deny),
            _ => Err(FormError::Invalid("Invalid action".to_string())),
        }
    }
}

impl TryFrom<UpdateSelfForm> for UpdateSelfPayload {
    type Error = FormError;

    fn try_from(form: UpdateSelfForm) -> Result<Self, Self::Error> {
        let password = match form.password {
            Some(password) if password.len() < 8 => {
                return Err(FormError::Invalid(
                    "Password must be at least 8 characters".to_string(),
                ));
            }
            other => other,
        };
        let payload = Self {
            first_name: form.first_name.map(PersonName::new).transpose()?,
            last_name: form.last_name.map(PersonName::new).transpose()?,
            email: form.email.map(Email::new).transpose()?,
            password,
        };
        if payload.fields().is_empty() {
            return Err(FormError::Invalid("No fields provided".to_string()));
        }
        Ok(payload)
    }
}
