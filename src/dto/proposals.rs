//! Data handed to the printable proposal template.

use serde::Serialize;

use crate::domain::client::Client;
use crate::domain::proposal::{Proposal, ProposalItem};

/// One priced row of the document.
#[derive(Debug, Serialize)]
pub struct DocumentLine {
    pub position: usize,
    pub name: String,
    pub description: String,
    pub quantity: i32,
    pub unit_price: String,
    pub discount: String,
    pub line_total: String,
}

impl DocumentLine {
    pub fn new(position: usize, item: &ProposalItem) -> Self {
        let description = [item.snapshot_make.as_deref(), item.snapshot_model.as_deref()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" ");
        Self {
            position,
            name: item
                .snapshot_name
                .clone()
                .unwrap_or_else(|| "Item".to_string()),
            description,
            quantity: item.quantity,
            unit_price: money(item.snapshot_price.unwrap_or(0.0)),
            discount: format!("{}%", item.discount.unwrap_or(0.0)),
            line_total: money(item.line_total),
        }
    }
}

/// Everything the proposal template renders.
#[derive(Debug, Serialize)]
pub struct ProposalDocument {
    pub proposal: Proposal,
    pub client: Option<Client>,
    pub currency: String,
    pub lines: Vec<DocumentLine>,
    pub subtotal: String,
    pub tax_amount: String,
    pub total_amount: String,
    pub valid_until: Option<String>,
    pub issued_on: String,
}

pub fn money(value: f64) -> String {
    format!("{value:.2}")
}
