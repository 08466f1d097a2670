use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::client::{Client as DomainClient, ClientDetails, NewClient as DomainNewClient};
use crate::domain::types::{ClientId, CompanyName, Email, TypeConstraintError};

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::clients)]
/// Diesel model for [`crate::domain::client::Client`].
pub struct Client {
    pub id: String,
    pub company_name: String,
    pub billing_address: String,
    pub shipping_address: Option<String>,
    pub location: Option<String>,
    pub tax_id: Option<String>,
    pub tax_exempt: bool,
    pub default_currency: String,
    pub payment_terms: String,
    pub contact_name: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::clients)]
/// Insertable form of [`Client`].
pub struct NewClient<'a> {
    pub id: String,
    pub company_name: &'a str,
    pub billing_address: &'a str,
    pub shipping_address: Option<&'a str>,
    pub location: Option<&'a str>,
    pub tax_id: Option<&'a str>,
    pub tax_exempt: bool,
    pub default_currency: &'a str,
    pub payment_terms: &'a str,
    pub contact_name: Option<&'a str>,
    pub contact_email: Option<&'a str>,
    pub contact_phone: Option<&'a str>,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(AsChangeset)]
#[diesel(table_name = crate::schema::clients)]
#[diesel(treat_none_as_null = true)]
/// Data used when updating a [`Client`] record.
pub struct UpdateClient<'a> {
    pub company_name: &'a str,
    pub billing_address: &'a str,
    pub shipping_address: Option<&'a str>,
    pub location: Option<&'a str>,
    pub tax_id: Option<&'a str>,
    pub tax_exempt: bool,
    pub default_currency: &'a str,
    pub payment_terms: &'a str,
    pub contact_name: Option<&'a str>,
    pub contact_email: Option<&'a str>,
    pub contact_phone: Option<&'a str>,
    pub updated_at: NaiveDateTime,
}

impl TryFrom<Client> for DomainClient {
    type Error = TypeConstraintError;

    fn try_from(client: Client) -> Result<Self, Self::Error> {
        Ok(Self {
            id: ClientId::parse(&client.id)?,
            company_name: CompanyName::new(client.company_name)?,
            billing_address: client.billing_address,
            shipping_address: client.shipping_address,
            location: client.location,
            tax_id: client.tax_id,
            tax_exempt: client.tax_exempt,
            default_currency: client.default_currency,
            payment_terms: client.payment_terms,
            contact_name: client.contact_name,
            contact_email: client.contact_email.map(Email::new).transpose()?,
            contact_phone: client.contact_phone,
            is_active: client.is_active,
            created_at: client.created_at,
            updated_at: client.updated_at,
        })
    }
}

impl<'a> NewClient<'a> {
    pub fn from_domain(client: &'a DomainNewClient, now: NaiveDateTime) -> Self {
        let details = &client.details;
        Self {
            id: client.id.to_string(),
            company_name: details.company_name.as_str(),
            billing_address: &details.billing_address,
            shipping_address: details.shipping_address.as_deref(),
            location: Some(&details.billing_address),
            tax_id: details.tax_id.as_deref(),
            tax_exempt: details.tax_exempt,
            default_currency: &details.default_currency,
            payment_terms: &details.payment_terms,
            contact_name: details.contact_name.as_deref(),
            contact_email: details.contact_email.as_ref().map(Email::as_str),
            contact_phone: details.contact_phone.as_deref(),
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }
}

impl<'a> UpdateClient<'a> {
    pub fn from_domain(details: &'a ClientDetails, now: NaiveDateTime) -> Self {
        Self {
            company_name: details.company_name.as_str(),
            billing_address: &details.billing_address,
            shipping_address: details.shipping_address.as_deref(),
            location: Some(&details.billing_address),
            tax_id: details.tax_id.as_deref(),
            tax_exempt: details.tax_exempt,
            default_currency: &details.default_currency,
            payment_terms: &details.payment_terms,
            contact_name: details.contact_name.as_deref(),
            contact_email: details.contact_email.as_ref().map(Email::as_str),
            contact_phone: details.contact_phone.as_deref(),
            updated_at: now,
        }
    }
}
