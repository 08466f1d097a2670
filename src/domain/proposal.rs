//! Proposals, their line items and the pricing arithmetic.

use std::fmt::Display;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::client::Client;
use crate::domain::types::{
    ClientId, DeviceId, Percentage, ProposalId, ProposalItemId, Quantity, SanitizedText,
    TypeConstraintError, round_money,
};

/// Prefix of every human-facing proposal number.
pub const PROPOSAL_NUMBER_PREFIX: &str = "PROP-";

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum ProposalStatus {
    Draft,
    Submitted,
    Approved,
    Sent,
    Accepted,
    Rejected,
}

impl ProposalStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ProposalStatus::Draft => "DRAFT",
            ProposalStatus::Submitted => "SUBMITTED",
            ProposalStatus::Approved => "APPROVED",
            ProposalStatus::Sent => "SENT",
            ProposalStatus::Accepted => "ACCEPTED",
            ProposalStatus::Rejected => "REJECTED",
        }
    }
}

impl Display for ProposalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProposalStatus {
    type Err = TypeConstraintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "DRAFT" => Ok(ProposalStatus::Draft),
            "SUBMITTED" => Ok(ProposalStatus::Submitted),
            "APPROVED" => Ok(ProposalStatus::Approved),
            "SENT" => Ok(ProposalStatus::Sent),
            "ACCEPTED" => Ok(ProposalStatus::Accepted),
            "REJECTED" => Ok(ProposalStatus::Rejected),
            other => Err(TypeConstraintError::InvalidValue(format!(
                "unknown proposal status: {other}"
            ))),
        }
    }
}

/// Line item with the catalog data frozen at the time of quoting.
#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProposalItem {
    pub id: ProposalItemId,
    pub inventory_item_id: Option<DeviceId>,
    pub snapshot_name: Option<String>,
    pub snapshot_make: Option<String>,
    pub snapshot_model: Option<String>,
    pub snapshot_price: Option<f64>,
    pub snapshot_specs: Option<Map<String, Value>>,
    pub quantity: i32,
    pub discount: Option<f64>,
    pub line_total: f64,
}

#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Proposal {
    pub id: ProposalId,
    pub proposal_number: String,
    pub proposal_title: Option<String>,
    pub client_id: ClientId,
    pub created_by: Option<String>,
    pub status: ProposalStatus,
    pub subtotal: f64,
    pub tax_rate: f64,
    pub tax_amount: f64,
    pub total_amount: f64,
    pub valid_until: Option<NaiveDateTime>,
    pub notes: Option<String>,
    pub terms_conditions: Option<String>,
    pub version: i32,
    pub parent_id: Option<ProposalId>,
    pub is_previewed: bool,
    pub items: Vec<ProposalItem>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Proposal together with the client it was written for.
#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProposalWithClient {
    #[serde(flatten)]
    pub proposal: Proposal,
    pub client: Option<Client>,
}

/// Snapshot values for one line, after catalog lookup.
#[derive(Clone, Debug, PartialEq)]
pub struct LineSnapshot {
    pub inventory_item_id: Option<DeviceId>,
    pub name: Option<String>,
    pub make: Option<String>,
    pub model: Option<String>,
    pub price: f64,
    pub specs: Option<Map<String, Value>>,
    pub quantity: Quantity,
    pub discount: Percentage,
}

impl LineSnapshot {
    /// `price * qty` less the percentage discount, rounded to cents.
    pub fn line_total(&self) -> f64 {
        let gross = self.price * f64::from(self.quantity.get());
        round_money(gross - gross * self.discount.get() / 100.0)
    }

    pub fn into_item(self) -> ProposalItem {
        let line_total = self.line_total();
        ProposalItem {
            id: ProposalItemId::new(),
            inventory_item_id: self.inventory_item_id,
            snapshot_name: self.name,
            snapshot_make: self.make,
            snapshot_model: self.model,
            snapshot_price: Some(self.price),
            snapshot_specs: self.specs,
            quantity: self.quantity.get(),
            discount: Some(self.discount.get()),
            line_total,
        }
    }
}

/// Derived money columns of a proposal.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Totals {
    pub subtotal: f64,
    pub tax_amount: f64,
    pub total_amount: f64,
}

impl Totals {
    pub fn compute(items: &[ProposalItem], tax_rate: Percentage) -> Self {
        let subtotal = round_money(items.iter().map(|item| item.line_total).sum());
        let tax_amount = round_money(subtotal * tax_rate.get() / 100.0);
        Self {
            subtotal,
            tax_amount,
            total_amount: round_money(subtotal + tax_amount),
        }
    }
}

/// Everything needed to persist a new proposal except its number, which is
/// allocated inside the insert transaction.
#[derive(Clone, Debug)]
pub struct NewProposal {
    pub id: ProposalId,
    pub proposal_title: Option<String>,
    pub client_id: ClientId,
    pub created_by: Option<String>,
    pub tax_rate: Percentage,
    pub totals: Totals,
    pub valid_until: Option<NaiveDateTime>,
    pub notes: Option<SanitizedText>,
    pub terms_conditions: Option<SanitizedText>,
    pub items: Vec<ProposalItem>,
}

impl NewProposal {
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub fn new(
        client_id: ClientId,
        proposal_title: Option<String>,
        created_by: Option<String>,
        lines: Vec<LineSnapshot>,
        tax_rate: Percentage,
        valid_until: Option<NaiveDateTime>,
        notes: Option<SanitizedText>,
        terms_conditions: Option<SanitizedText>,
    ) -> Self {
        let items: Vec<ProposalItem> = lines.into_iter().map(LineSnapshot::into_item).collect();
        let totals = Totals::compute(&items, tax_rate);
        Self {
            id: ProposalId::new(),
            proposal_title: proposal_title
                .map(|title| title.trim().to_string())
                .filter(|title| !title.is_empty()),
            client_id,
            created_by,
            tax_rate,
            totals,
            valid_until,
            notes,
            terms_conditions,
            items,
        }
    }
}

/// Formats a sequence value as a proposal number.
pub fn format_proposal_number(sequence: i32) -> String {
    format!("{PROPOSAL_NUMBER_PREFIX}{sequence}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(price: f64, quantity: i32, discount: f64) -> LineSnapshot {
        LineSnapshot {
            inventory_item_id: None,
            name: Some("Switch".to_string()),
            make: None,
            model: None,
            price,
            specs: None,
            quantity: Quantity::new(quantity).unwrap(),
            discount: Percentage::new(discount).unwrap(),
        }
    }

    #[test]
    fn line_total_applies_percentage_discount() {
        assert_eq!(line(100.0, 3, 10.0).line_total(), 270.0);
        assert_eq!(line(19.99, 1, 0.0).line_total(), 19.99);
    }

    #[test]
    fn totals_add_tax_on_subtotal() {
        let items = vec![line(100.0, 2, 0.0).into_item(), line(50.0, 1, 50.0).into_item()];
        let totals = Totals::compute(&items, Percentage::new(18.0).unwrap());
        assert_eq!(totals.subtotal, 225.0);
        assert_eq!(totals.tax_amount, 40.5);
        assert_eq!(totals.total_amount, 265.5);
    }

    #[test]
    fn new_proposal_blanks_empty_title() {
        let proposal = NewProposal::new(
            ClientId::new(),
            Some("   ".to_string()),
            None,
            vec![line(10.0, 1, 0.0)],
            Percentage::default(),
            None,
            None,
            None,
        );
        assert_eq!(proposal.proposal_title, None);
        assert_eq!(proposal.totals.total_amount, 10.0);
        assert_eq!(proposal.items.len(), 1);
    }

    #[test]
    fn status_parses_and_formats() {
        assert_eq!("sent".parse::<ProposalStatus>().unwrap(), ProposalStatus::Sent);
        assert_eq!(ProposalStatus::Rejected.to_string(), "REJECTED");
        assert!("LOST".parse::<ProposalStatus>().is_err());
        assert_eq!(format_proposal_number(1000), "PROP-1000");
    }
}
