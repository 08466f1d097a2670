use chrono::NaiveDateTime;
use serde::Serialize;

use crate::domain::types::{ClientId, CompanyName, Email};

pub const DEFAULT_CURRENCY: &str = "INR";
pub const DEFAULT_PAYMENT_TERMS: &str = "Net 30";

/// Customer receiving proposals.
#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub id: ClientId,
    pub company_name: CompanyName,
    pub billing_address: String,
    pub shipping_address: Option<String>,
    /// Mirrors the billing address.
    pub location: Option<String>,
    pub tax_id: Option<String>,
    pub tax_exempt: bool,
    pub default_currency: String,
    pub payment_terms: String,
    pub contact_name: Option<String>,
    pub contact_email: Option<Email>,
    pub contact_phone: Option<String>,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Client fields supplied on creation or carried into an update.
#[derive(Clone, Debug, PartialEq)]
pub struct ClientDetails {
    pub company_name: CompanyName,
    pub billing_address: String,
    pub shipping_address: Option<String>,
    pub tax_id: Option<String>,
    pub tax_exempt: bool,
    pub default_currency: String,
    pub payment_terms: String,
    pub contact_name: Option<String>,
    pub contact_email: Option<Email>,
    pub contact_phone: Option<String>,
}

#[derive(Clone, Debug)]
pub struct NewClient {
    pub id: ClientId,
    pub details: ClientDetails,
}

impl NewClient {
    #[must_use]
    pub fn new(details: ClientDetails) -> Self {
        Self {
            id: ClientId::new(),
            details,
        }
    }
}

/// Partial client update. `None` keeps the stored value; for optional
/// columns `Some(None)` clears it.
#[derive(Clone, Debug, Default)]
pub struct ClientPatch {
    pub company_name: Option<CompanyName>,
    pub billing_address: Option<String>,
    pub shipping_address: Option<Option<String>>,
    pub tax_id: Option<Option<String>>,
    pub tax_exempt: Option<bool>,
    pub default_currency: Option<String>,
    pub payment_terms: Option<String>,
    pub contact_name: Option<Option<String>>,
    pub contact_email: Option<Option<Email>>,
    pub contact_phone: Option<Option<String>>,
}

impl Client {
    pub fn details(&self) -> ClientDetails {
        ClientDetails {
            company_name: self.company_name.clone(),
            billing_address: self.billing_address.clone(),
            shipping_address: self.shipping_address.clone(),
            tax_id: self.tax_id.clone(),
            tax_exempt: self.tax_exempt,
            default_currency: self.default_currency.clone(),
            payment_terms: self.payment_terms.clone(),
            contact_name: self.contact_name.clone(),
            contact_email: self.contact_email.clone(),
            contact_phone: self.contact_phone.clone(),
        }
    }

    /// Applies `patch` on top of the stored details.
    pub fn patched(&self, patch: ClientPatch) -> ClientDetails {
        let current = self.details();
        ClientDetails {
            company_name: patch.company_name.unwrap_or(current.company_name),
            billing_address: patch.billing_address.unwrap_or(current.billing_address),
            shipping_address: patch.shipping_address.unwrap_or(current.shipping_address),
            tax_id: patch.tax_id.unwrap_or(current.tax_id),
            tax_exempt: patch.tax_exempt.unwrap_or(current.tax_exempt),
            default_currency: patch.default_currency.unwrap_or(current.default_currency),
            payment_terms: patch.payment_terms.unwrap_or(current.payment_terms),
            contact_name: patch.contact_name.unwrap_or(current.contact_name),
            contact_email: patch.contact_email.unwrap_or(current.contact_email),
            contact_phone: patch.contact_phone.unwrap_or(current.contact_phone),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn client() -> Client {
        let now = Utc::now().naive_utc();
        Client {
            id: ClientId::new(),
            company_name: CompanyName::new("Acme").unwrap(),
            billing_address: "1 Main St".to_string(),
            shipping_address: None,
            location: Some("1 Main St".to_string()),
            tax_id: Some("TX-1".to_string()),
            tax_exempt: false,
            default_currency: DEFAULT_CURRENCY.to_string(),
            payment_terms: DEFAULT_PAYMENT_TERMS.to_string(),
            contact_name: Some("Bob".to_string()),
            contact_email: None,
            contact_phone: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn patch_keeps_absent_fields() {
        let client = client();
        let patch = ClientPatch {
            company_name: Some(CompanyName::new("Acme Two").unwrap()),
            tax_id: Some(None),
            ..ClientPatch::default()
        };

        let details = client.patched(patch);

        assert_eq!(details.company_name.as_str(), "Acme Two");
        assert_eq!(details.billing_address, "1 Main St");
        assert_eq!(details.tax_id, None);
        assert_eq!(details.contact_name.as_deref(), Some("Bob"));
    }
}
