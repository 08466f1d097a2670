use serde::Deserialize;
use validator::Validate;

use crate::domain::client::{ClientDetails, ClientPatch, DEFAULT_CURRENCY, DEFAULT_PAYMENT_TERMS};
use crate::domain::types::{CompanyName, Email};
use crate::forms::{FormError, clean, double_option};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
/// Body of `POST /api/clients`.
pub struct CreateClientForm {
    #[validate(length(min = 1))]
    pub company_name: String,
    #[validate(length(min = 1))]
    pub billing_address: String,
    pub shipping_address: Option<String>,
    pub tax_id: Option<String>,
    pub tax_exempt: Option<bool>,
    pub default_currency: Option<String>,
    pub payment_terms: Option<String>,
    pub contact_name: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Body of `PUT /api/clients/{id}`; absent keys keep their stored value.
pub struct UpdateClientForm {
    pub company_name: Option<String>,
    pub billing_address: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub shipping_address: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub tax_id: Option<Option<String>>,
    pub tax_exempt: Option<bool>,
    pub default_currency: Option<String>,
    pub payment_terms: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub contact_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub contact_email: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub contact_phone: Option<Option<String>>,
}

fn non_blank(value: String, field: &str) -> Result<String, FormError> {
    let value = value.trim().to_string();
    if value.is_empty() {
        return Err(FormError::Invalid(format!("{field} is required")));
    }
    Ok(value)
}

fn optional_email(value: Option<String>) -> Result<Option<Email>, FormError> {
    clean(value)
        .map(|email| Email::new(email).map_err(FormError::from))
        .transpose()
}

impl TryFrom<CreateClientForm> for ClientDetails {
    type Error = FormError;

    fn try_from(form: CreateClientForm) -> Result<Self, Self::Error> {
        form.validate()?;
        Ok(Self {
            company_name: CompanyName::new(form.company_name)?,
            billing_address: non_blank(form.billing_address, "billingAddress")?,
            shipping_address: clean(form.shipping_address),
            tax_id: clean(form.tax_id),
            tax_exempt: form.tax_exempt.unwrap_or(false),
            default_currency: clean(form.default_currency)
                .unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
            payment_terms: clean(form.payment_terms)
                .unwrap_or_else(|| DEFAULT_PAYMENT_TERMS.to_string()),
            contact_name: clean(form.contact_name),
            contact_email: optional_email(form.contact_email)?,
            contact_phone: clean(form.contact_phone),
        })
    }
}

impl TryFrom<UpdateClientForm> for ClientPatch {
    type Error = FormError;

    fn try_from(form: UpdateClientForm) -> Result<Self, Self::Error> {
        Ok(Self {
            company_name: form.company_name.map(CompanyName::new).transpose()?,
            billing_address: form
                .billing_address
                .map(|address| non_blank(address, "billingAddress"))
                .transpose()?,
            shipping_address: form.shipping_address.map(clean),
            tax_id: form.tax_id.map(clean),
            tax_exempt: form.tax_exempt,
            default_currency: clean(form.default_currency),
            payment_terms: clean(form.payment_terms),
            contact_name: form.contact_name.map(clean),
            contact_email: form.contact_email.map(optional_email).transpose()?,
            contact_phone: form.contact_phone.map(clean),
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn create_applies_defaults() {
        let form: CreateClientForm = serde_json::from_value(json!({
            "companyName": " Acme ",
            "billingAddress": "1 Main St",
            "contactEmail": " Ops@Acme.test "
        }))
        .unwrap();

        let details = ClientDetails::try_from(form).unwrap();

        assert_eq!(details.company_name.as_str(), "Acme");
        assert_eq!(details.default_currency, "INR");
        assert_eq!(details.payment_terms, "Net 30");
        assert!(!details.tax_exempt);
        assert_eq!(details.contact_email.unwrap().as_str(), "ops@acme.test");
    }

    #[test]
    fn create_rejects_bad_email() {
        let form: CreateClientForm = serde_json::from_value(json!({
            "companyName": "Acme",
            "billingAddress": "1 Main St",
            "contactEmail": "nope"
        }))
        .unwrap();

        assert!(ClientDetails::try_from(form).is_err());
    }

    #[test]
    fn update_distinguishes_null_from_absent() {
        let form: UpdateClientForm = serde_json::from_value(json!({
            "taxId": null,
            "companyName": "Acme Two"
        }))
        .unwrap();

        let patch = ClientPatch::try_from(form).unwrap();

        assert_eq!(patch.tax_id, Some(None));
        assert_eq!(patch.shipping_address, None);
        assert_eq!(patch.company_name.unwrap().as_str(), "Acme Two");
    }
}
