use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde_json::{Map, Value};

use crate::domain::proposal::{
    NewProposal as DomainNewProposal, Proposal as DomainProposal,
    ProposalItem as DomainProposalItem, ProposalStatus,
};
use crate::domain::types::{ClientId, DeviceId, ProposalId, ProposalItemId, TypeConstraintError};
use crate::models::device::parse_json_object;

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::proposals)]
/// Diesel model for [`crate::domain::proposal::Proposal`].
pub struct Proposal {
    pub id: String,
    pub proposal_number: String,
    pub proposal_title: Option<String>,
    pub client_id: String,
    pub created_by: Option<String>,
    pub status: String,
    pub subtotal: f64,
    pub tax_rate: f64,
    pub tax_amount: f64,
    pub total_amount: f64,
    pub valid_until: Option<NaiveDateTime>,
    pub notes: Option<String>,
    pub terms_conditions: Option<String>,
    pub version: i32,
    pub parent_id: Option<String>,
    pub is_previewed: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Identifiable, Queryable, Selectable, Associations)]
#[diesel(table_name = crate::schema::proposal_items)]
#[diesel(belongs_to(Proposal, foreign_key = proposal_id))]
/// Diesel model for [`crate::domain::proposal::ProposalItem`].
pub struct ProposalItem {
    pub id: String,
    pub proposal_id: String,
    pub inventory_item_id: Option<String>,
    pub snapshot_name: Option<String>,
    pub snapshot_make: Option<String>,
    pub snapshot_model: Option<String>,
    pub snapshot_price: Option<f64>,
    pub snapshot_specs: Option<String>,
    pub quantity: i32,
    pub discount: Option<f64>,
    pub line_total: f64,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::proposals)]
/// Insertable form of [`Proposal`].
pub struct NewProposal<'a> {
    pub id: String,
    pub proposal_number: String,
    pub proposal_title: Option<&'a str>,
    pub client_id: String,
    pub created_by: Option<&'a str>,
    pub status: &'a str,
    pub subtotal: f64,
    pub tax_rate: f64,
    pub tax_amount: f64,
    pub total_amount: f64,
    pub valid_until: Option<NaiveDateTime>,
    pub notes: Option<&'a str>,
    pub terms_conditions: Option<&'a str>,
    pub version: i32,
    pub is_previewed: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::proposal_items)]
/// Insertable form of [`ProposalItem`].
pub struct NewProposalItem<'a> {
    pub id: String,
    pub proposal_id: String,
    pub inventory_item_id: Option<String>,
    pub snapshot_name: Option<&'a str>,
    pub snapshot_make: Option<&'a str>,
    pub snapshot_model: Option<&'a str>,
    pub snapshot_price: Option<f64>,
    pub snapshot_specs: Option<String>,
    pub quantity: i32,
    pub discount: Option<f64>,
    pub line_total: f64,
}

impl TryFrom<ProposalItem> for DomainProposalItem {
    type Error = TypeConstraintError;

    fn try_from(item: ProposalItem) -> Result<Self, Self::Error> {
        Ok(Self {
            id: ProposalItemId::parse(&item.id)?,
            inventory_item_id: item
                .inventory_item_id
                .as_deref()
                .map(DeviceId::parse)
                .transpose()?,
            snapshot_name: item.snapshot_name,
            snapshot_make: item.snapshot_make,
            snapshot_model: item.snapshot_model,
            snapshot_price: item.snapshot_price,
            snapshot_specs: item
                .snapshot_specs
                .as_deref()
                .map(parse_json_object)
                .transpose()?,
            quantity: item.quantity,
            discount: item.discount,
            line_total: item.line_total,
        })
    }
}

impl Proposal {
    /// Builds the domain proposal from this row and its item rows.
    pub fn into_domain(
        self,
        items: Vec<ProposalItem>,
    ) -> Result<DomainProposal, TypeConstraintError> {
        let items = items
            .into_iter()
            .map(DomainProposalItem::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(DomainProposal {
            id: ProposalId::parse(&self.id)?,
            proposal_number: self.proposal_number,
            proposal_title: self.proposal_title,
            client_id: ClientId::parse(&self.client_id)?,
            created_by: self.created_by,
            status: self.status.parse::<ProposalStatus>()?,
            subtotal: self.subtotal,
            tax_rate: self.tax_rate,
            tax_amount: self.tax_amount,
            total_amount: self.total_amount,
            valid_until: self.valid_until,
            notes: self.notes,
            terms_conditions: self.terms_conditions,
            version: self.version,
            parent_id: self
                .parent_id
                .as_deref()
                .map(ProposalId::parse)
                .transpose()?,
            is_previewed: self.is_previewed,
            items,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

fn specs_text(specs: &Map<String, Value>) -> String {
    Value::Object(specs.clone()).to_string()
}

impl<'a> NewProposal<'a> {
    pub fn from_domain(
        proposal: &'a DomainNewProposal,
        proposal_number: String,
        now: NaiveDateTime,
    ) -> Self {
        Self {
            id: proposal.id.to_string(),
            proposal_number,
            proposal_title: proposal.proposal_title.as_deref(),
            client_id: proposal.client_id.to_string(),
            created_by: proposal.created_by.as_deref(),
            status: ProposalStatus::Draft.as_str(),
            subtotal: proposal.totals.subtotal,
            tax_rate: proposal.tax_rate.get(),
            tax_amount: proposal.totals.tax_amount,
            total_amount: proposal.totals.total_amount,
            valid_until: proposal.valid_until,
            notes: proposal.notes.as_ref().map(|n| n.as_str()),
            terms_conditions: proposal.terms_conditions.as_ref().map(|t| t.as_str()),
            version: 1,
            is_previewed: false,
            created_at: now,
            updated_at: now,
        }
    }
}

impl<'a> NewProposalItem<'a> {
    pub fn from_domain(proposal_id: ProposalId, item: &'a DomainProposalItem) -> Self {
        Self {
            id: item.id.to_string(),
            proposal_id: proposal_id.to_string(),
            inventory_item_id: item.inventory_item_id.map(|id| id.to_string()),
            snapshot_name: item.snapshot_name.as_deref(),
            snapshot_make: item.snapshot_make.as_deref(),
            snapshot_model: item.snapshot_model.as_deref(),
            snapshot_price: item.snapshot_price,
            snapshot_specs: item.snapshot_specs.as_ref().map(specs_text),
            quantity: item.quantity,
            discount: item.discount,
            line_total: item.line_total,
        }
    }
}
