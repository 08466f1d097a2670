use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use validator::Validate;

use crate::domain::proposal::ProposalStatus;
use crate::domain::types::{ClientId, DeviceId, Percentage, Quantity, SanitizedText};
use crate::forms::{FormError, clean};

#[derive(Debug, Deserialize, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
/// One line of `POST /api/proposals`. A `lineTotal` key is ignored; totals
/// are always recomputed.
pub struct ProposalItemForm {
    pub inventory_item_id: Option<String>,
    pub snapshot_name: Option<String>,
    pub snapshot_make: Option<String>,
    pub snapshot_model: Option<String>,
    #[validate(range(min = 0.0))]
    pub snapshot_price: Option<f64>,
    pub snapshot_specs: Option<Value>,
    #[validate(range(min = 1))]
    pub quantity: Option<i32>,
    #[validate(range(min = 0.0, max = 100.0))]
    pub discount: Option<f64>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
/// Body of `POST /api/proposals`.
pub struct CreateProposalForm {
    #[validate(length(min = 1))]
    pub client_id: String,
    #[validate(length(min = 1), nested)]
    pub items: Vec<ProposalItemForm>,
    #[validate(range(min = 0.0, max = 100.0))]
    pub tax_rate: Option<f64>,
    pub notes: Option<String>,
    pub terms_conditions: Option<String>,
    pub valid_until: Option<String>,
    pub created_by: Option<String>,
    pub proposal_title: Option<String>,
}

#[derive(Debug, Deserialize)]
/// Body of `PATCH /api/proposals/{id}/status`.
pub struct UpdateStatusForm {
    pub status: String,
}

/// Line as requested by the caller, before catalog lookup.
#[derive(Debug, Clone)]
pub struct ProposalItemPayload {
    pub inventory_item_id: Option<DeviceId>,
    pub name: Option<String>,
    pub make: Option<String>,
    pub model: Option<String>,
    pub price: Option<f64>,
    pub specs: Option<Map<String, Value>>,
    pub quantity: Quantity,
    pub discount: Percentage,
}

#[derive(Debug, Clone)]
pub struct CreateProposalPayload {
    pub client_id: ClientId,
    pub items: Vec<ProposalItemPayload>,
    pub tax_rate: Percentage,
    pub notes: Option<SanitizedText>,
    pub terms_conditions: Option<SanitizedText>,
    pub valid_until: Option<NaiveDateTime>,
    pub created_by: Option<String>,
    pub proposal_title: Option<String>,
}

/// Accepts RFC 3339 timestamps and plain `YYYY-MM-DD` dates.
fn parse_valid_until(raw: &str) -> Result<NaiveDateTime, FormError> {
    if let Ok(datetime) = DateTime::parse_from_rfc3339(raw) {
        return Ok(datetime.naive_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .ok_or_else(|| FormError::Invalid(format!("invalid validUntil: {raw}")))
}

fn specs(value: Option<Value>) -> Result<Option<Map<String, Value>>, FormError> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Object(map)) => Ok(Some(map)),
        Some(_) => Err(FormError::Invalid(
            "snapshotSpecs must be a JSON object".to_string(),
        )),
    }
}

impl TryFrom<ProposalItemForm> for ProposalItemPayload {
    type Error = FormError;

    fn try_from(form: ProposalItemForm) -> Result<Self, Self::Error> {
        Ok(Self {
            inventory_item_id: clean(form.inventory_item_id)
                .map(|id| DeviceId::parse(&id))
                .transpose()?,
            name: clean(form.snapshot_name),
            make: clean(form.snapshot_make),
            model: clean(form.snapshot_model),
            price: form.snapshot_price,
            specs: specs(form.snapshot_specs)?,
            quantity: Quantity::new(form.quantity.unwrap_or(1))?,
            discount: Percentage::new(form.discount.unwrap_or(0.0))?,
        })
    }
}

impl TryFrom<CreateProposalForm> for CreateProposalPayload {
    type Error = FormError;

    fn try_from(form: CreateProposalForm) -> Result<Self, Self::Error> {
        form.validate()?;
        let items = form
            .items
            .into_iter()
            .map(ProposalItemPayload::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            client_id: ClientId::parse(&form.client_id)
                .map_err(|_| FormError::Invalid("Client not found".to_string()))?,
            items,
            tax_rate: Percentage::new(form.tax_rate.unwrap_or(0.0))?,
            notes: SanitizedText::optional(form.notes),
            terms_conditions: SanitizedText::optional(form.terms_conditions),
            valid_until: clean(form.valid_until)
                .map(|raw| parse_valid_until(&raw))
                .transpose()?,
            created_by: clean(form.created_by),
            proposal_title: clean(form.proposal_title),
        })
    }
}

impl TryFrom<UpdateStatusForm> for ProposalStatus {
    type Error = FormError;

    fn try_from(form: UpdateStatusForm) -> Result<Self, Self::Error> {
        Ok(form.status.parse::<ProposalStatus>()?)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn form(body: Value) -> CreateProposalForm {
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn items_are_required() {
        let body = form(json!({"clientId": ClientId::new().to_string(), "items": []}));
        assert!(CreateProposalPayload::try_from(body).is_err());
    }

    #[test]
    fn defaults_are_applied() {
        let body = form(json!({
            "clientId": ClientId::new().to_string(),
            "items": [{"snapshotName": "Laptop", "snapshotPrice": 100.0, "lineTotal": 1.0}],
            "notes": "Deliver <script>x</script>in May",
            "validUntil": "2030-01-31"
        }));

        let payload = CreateProposalPayload::try_from(body).unwrap();

        assert_eq!(payload.items[0].quantity.get(), 1);
        assert_eq!(payload.items[0].discount.get(), 0.0);
        assert_eq!(payload.tax_rate.get(), 0.0);
        assert_eq!(payload.notes.unwrap().as_str(), "Deliver in May");
        assert_eq!(
            payload.valid_until.unwrap().date(),
            NaiveDate::from_ymd_opt(2030, 1, 31).unwrap()
        );
    }

    #[test]
    fn discount_above_hundred_is_rejected() {
        let body = form(json!({
            "clientId": ClientId::new().to_string(),
            "items": [{"snapshotName": "Laptop", "discount": 120.0}]
        }));
        assert!(CreateProposalPayload::try_from(body).is_err());
    }

    #[test]
    fn rfc3339_valid_until_is_accepted() {
        assert!(parse_valid_until("2030-01-31T10:00:00Z").is_ok());
        assert!(parse_valid_until("next week").is_err());
    }

    #[test]
    fn status_form_parses() {
        let status = ProposalStatus::try_from(UpdateStatusForm {
            status: "accepted".to_string(),
        })
        .unwrap();
        assert_eq!(status, ProposalStatus::Accepted);
    }
}
