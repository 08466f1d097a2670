use serde::Deserialize;
use validator::Validate;

use crate::domain::types::Email;
use crate::forms::FormError;

#[derive(Debug, Deserialize, Validate)]
/// Credentials posted to either login portal.
pub struct LoginForm {
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

pub struct LoginPayload {
    pub email: Email,
    pub password: String,
}

impl TryFrom<LoginForm> for LoginPayload {
    type Error = FormError;

    fn try_from(form: LoginForm) -> Result<Self, Self::Error> {
        form.validate()?;
        Ok(Self {
            email: Email::new(form.email)?,
            password: form.password,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_is_normalized() {
        let form = LoginForm {
            email: " Admin@Example.com ".to_string(),
            password: "secret".to_string(),
        };
        let payload = LoginPayload::try_from(form).unwrap();
        assert_eq!(payload.email.as_str(), "admin@example.com");
    }

    #[test]
    fn empty_password_is_rejected() {
        let form = LoginForm {
            email: "a@example.com".to_string(),
            password: String::new(),
        };
        assert!(LoginPayload::try_from(form).is_err());
    }

    #[test]
    fn malformed_email_is_rejected() {
        let form = LoginForm {
            email: "admin-at-example".to_string(),
            password: "secret".to_string(),
        };
        assert!(matches!(
            LoginPayload::try_from(form),
            Err(FormError::TypeConstraint(_))
        ));
    }
}
