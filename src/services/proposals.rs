//! Proposal builder: snapshotting catalog lines, pricing, status changes
//! and the printable document.

use serde_json::{Map, Value, json};

use crate::domain::audit_log::{AuditAction, NewAuditLog, entity};
use crate::domain::auth::AuthenticatedUser;
use crate::domain::client::DEFAULT_CURRENCY;
use crate::domain::proposal::{LineSnapshot, NewProposal, ProposalStatus, ProposalWithClient};
use crate::domain::types::ProposalId;
use crate::dto::proposals::{DocumentLine, ProposalDocument, money};
use crate::forms::proposals::{
    CreateProposalForm, CreateProposalPayload, ProposalItemPayload, UpdateStatusForm,
};
use crate::notifications::{NotificationHub, NotificationInput, NotificationType};
use crate::repository::{
    AuditLogWriter, ClientReader, DeviceReader, ProposalReader, ProposalWriter, UserReader,
};
use crate::services::audit::{RequestMeta, record};
use crate::services::{ServiceError, ServiceResult, notify_active_users};

const PROPOSAL_NOT_FOUND: &str = "Proposal not found";

fn values(pairs: Value) -> Map<String, Value> {
    match pairs {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

fn notify<R>(
    repo: &R,
    hub: &NotificationHub,
    proposal: &ProposalWithClient,
    title: &str,
    message: String,
) where
    R: UserReader + ?Sized,
{
    let input = NotificationInput::new(NotificationType::Action, title, message)
        .record(entity::PROPOSAL, proposal.proposal.id);
    notify_active_users(repo, hub, &input);
}

fn load<R>(repo: &R, proposal_id: &str) -> ServiceResult<ProposalWithClient>
where
    R: ProposalReader + ?Sized,
{
    let id = ProposalId::parse(proposal_id)
        .map_err(|_| ServiceError::NotFound(PROPOSAL_NOT_FOUND.to_string()))?;
    repo.get_proposal_by_id(id)?
        .ok_or_else(|| ServiceError::NotFound(PROPOSAL_NOT_FOUND.to_string()))
}

/// Fills snapshot fields the caller left out from the referenced device.
fn resolve_line<R>(repo: &R, item: ProposalItemPayload) -> ServiceResult<LineSnapshot>
where
    R: DeviceReader + ?Sized,
{
    let device = match item.inventory_item_id {
        Some(id) => Some(
            repo.get_device_by_id(id)?
                .filter(|device| device.is_active)
                .ok_or_else(|| ServiceError::Form(format!("Item not found: {id}")))?,
        ),
        None => None,
    };

    Ok(LineSnapshot {
        inventory_item_id: item.inventory_item_id,
        name: item
            .name
            .or_else(|| device.as_ref().map(|d| d.name.to_string())),
        make: item.make.or_else(|| device.as_ref().map(|d| d.make.clone())),
        model: item.model.or_else(|| device.as_ref().map(|d| d.model.clone())),
        price: item
            .price
            .or_else(|| device.as_ref().map(|d| d.unit_price.get()))
            .unwrap_or(0.0),
        specs: item
            .specs
            .or_else(|| device.as_ref().map(|d| d.specifications.clone())),
        quantity: item.quantity,
        discount: item.discount,
    })
}

/// All proposals with items and client, newest first.
pub fn list_proposals<R>(repo: &R) -> ServiceResult<Vec<ProposalWithClient>>
where
    R: ProposalReader + ?Sized,
{
    repo.list_proposals().map_err(|err| {
        log::error!("Failed to list proposals: {err}");
        err.into()
    })
}

pub fn get_proposal<R>(repo: &R, proposal_id: &str) -> ServiceResult<ProposalWithClient>
where
    R: ProposalReader + ?Sized,
{
    load(repo, proposal_id)
}

pub fn create_proposal<R>(
    repo: &R,
    hub: &NotificationHub,
    user: &AuthenticatedUser,
    meta: &RequestMeta,
    form: CreateProposalForm,
) -> ServiceResult<ProposalWithClient>
where
    R: ClientReader + DeviceReader + ProposalWriter + AuditLogWriter + UserReader + ?Sized,
{
    let payload = CreateProposalPayload::try_from(form)?;

    repo.get_client_by_id(payload.client_id)?
        .filter(|client| client.is_active)
        .ok_or_else(|| ServiceError::Form("Client not found".to_string()))?;

    let lines = payload
        .items
        .into_iter()
        .map(|item| resolve_line(repo, item))
        .collect::<ServiceResult<Vec<_>>>()?;

    let created_by = payload
        .created_by
        .or_else(|| Some(user.full_name()).filter(|name| !name.is_empty()));

    let new_proposal = NewProposal::new(
        payload.client_id,
        payload.proposal_title,
        created_by,
        lines,
        payload.tax_rate,
        payload.valid_until,
        payload.notes,
        payload.terms_conditions,
    );

    let created = repo.create_proposal(&new_proposal).map_err(|err| {
        log::error!("Failed to create proposal: {err}");
        err
    })?;

    let proposal = &created.proposal;
    record(
        repo,
        user,
        meta,
        NewAuditLog::new(entity::PROPOSAL, proposal.id, AuditAction::Create).new_values(values(
            json!({
                "proposalNumber": proposal.proposal_number,
                "proposalTitle": proposal.proposal_title,
                "clientId": proposal.client_id,
                "createdBy": proposal.created_by,
                "status": proposal.status,
                "totalAmount": proposal.total_amount,
                "itemCount": proposal.items.len(),
            }),
        )),
    );
    notify(
        repo,
        hub,
        &created,
        "Proposal created",
        format!(
            "{} created proposal {}",
            user.display_name(),
            proposal.proposal_number
        ),
    );

    Ok(created)
}

pub fn update_status<R>(
    repo: &R,
    hub: &NotificationHub,
    user: &AuthenticatedUser,
    meta: &RequestMeta,
    proposal_id: &str,
    form: UpdateStatusForm,
) -> ServiceResult<ProposalWithClient>
where
    R: ProposalReader + ProposalWriter + AuditLogWriter + UserReader + ?Sized,
{
    let status = ProposalStatus::try_from(form)?;
    let existing = load(repo, proposal_id)?;

    let updated = repo
        .update_proposal_status(existing.proposal.id, status)
        .map_err(|err| {
            log::error!(
                "Failed to update status of proposal {}: {err}",
                existing.proposal.id
            );
            err
        })?;

    record(
        repo,
        user,
        meta,
        NewAuditLog::new(entity::PROPOSAL, updated.proposal.id, AuditAction::Update)
            .old_values(values(json!({ "status": existing.proposal.status })))
            .new_values(values(json!({ "status": status }))),
    );
    notify(
        repo,
        hub,
        &updated,
        "Proposal status updated",
        format!(
            "{} set proposal {} to {status}",
            user.display_name(),
            updated.proposal.proposal_number
        ),
    );

    Ok(updated)
}

pub fn mark_previewed<R>(
    repo: &R,
    user: &AuthenticatedUser,
    meta: &RequestMeta,
    proposal_id: &str,
) -> ServiceResult<ProposalWithClient>
where
    R: ProposalReader + ProposalWriter + AuditLogWriter + ?Sized,
{
    let existing = load(repo, proposal_id)?;

    let updated = repo.mark_proposal_previewed(existing.proposal.id)?;

    record(
        repo,
        user,
        meta,
        NewAuditLog::new(entity::PROPOSAL, updated.proposal.id, AuditAction::Update)
            .old_values(values(
                json!({ "isPreviewed": existing.proposal.is_previewed }),
            ))
            .new_values(values(json!({ "isPreviewed": true }))),
    );

    Ok(updated)
}

/// Removes the proposal and its items.
pub fn delete_proposal<R>(
    repo: &R,
    hub: &NotificationHub,
    user: &AuthenticatedUser,
    meta: &RequestMeta,
    proposal_id: &str,
) -> ServiceResult<()>
where
    R: ProposalReader + ProposalWriter + AuditLogWriter + UserReader + ?Sized,
{
    let existing = load(repo, proposal_id)?;
    let proposal = &existing.proposal;

    repo.delete_proposal(proposal.id).map_err(|err| {
        log::error!("Failed to delete proposal {}: {err}", proposal.id);
        err
    })?;

    record(
        repo,
        user,
        meta,
        NewAuditLog::new(entity::PROPOSAL, proposal.id, AuditAction::Delete).old_values(values(
            json!({
                "proposalNumber": proposal.proposal_number,
                "clientId": proposal.client_id,
                "status": proposal.status,
                "totalAmount": proposal.total_amount,
            }),
        )),
    );
    notify(
        repo,
        hub,
        &existing,
        "Proposal deleted",
        format!(
            "{} deleted proposal {}",
            user.display_name(),
            proposal.proposal_number
        ),
    );

    Ok(())
}

/// Data for the printable proposal document.
pub fn proposal_document<R>(repo: &R, proposal_id: &str) -> ServiceResult<ProposalDocument>
where
    R: ProposalReader + ?Sized,
{
    let ProposalWithClient { proposal, client } = load(repo, proposal_id)?;

    let lines = proposal
        .items
        .iter()
        .enumerate()
        .map(|(index, item)| DocumentLine::new(index + 1, item))
        .collect();
    let currency = client
        .as_ref()
        .map(|c| c.default_currency.clone())
        .unwrap_or_else(|| DEFAULT_CURRENCY.to_string());

    Ok(ProposalDocument {
        currency,
        lines,
        subtotal: money(proposal.subtotal),
        tax_amount: money(proposal.tax_amount),
        total_amount: money(proposal.total_amount),
        valid_until: proposal
            .valid_until
            .map(|date| date.format("%d %b %Y").to_string()),
        issued_on: proposal.created_at.format("%d %b %Y").to_string(),
        proposal,
        client,
    })
}
