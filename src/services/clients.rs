//! Client management.

use serde_json::{Map, Value, json};

use crate::domain::audit_log::{AuditAction, NewAuditLog, diff, entity};
use crate::domain::auth::AuthenticatedUser;
use crate::domain::client::{Client, ClientDetails, ClientPatch, NewClient};
use crate::domain::types::ClientId;
use crate::domain::user::Role;
use crate::forms::clients::{CreateClientForm, UpdateClientForm};
use crate::notifications::{NotificationHub, NotificationInput, NotificationType};
use crate::repository::{AuditLogWriter, ClientReader, ClientWriter, UserReader};
use crate::services::audit::{RequestMeta, record};
use crate::services::{ServiceError, ServiceResult, ensure_role, notify_active_users};

const CLIENT_NOT_FOUND: &str = "Client not found";

/// Fields copied into audit entries.
fn tracked_fields(client: &Client) -> Map<String, Value> {
    let mut fields = Map::new();
    fields.insert("companyName".into(), json!(client.company_name.as_str()));
    fields.insert("billingAddress".into(), json!(client.billing_address));
    fields.insert("taxId".into(), json!(client.tax_id));
    fields
}

fn notify<R>(
    repo: &R,
    hub: &NotificationHub,
    user: &AuthenticatedUser,
    client: &Client,
    title: &str,
    verb: &str,
) where
    R: UserReader + ?Sized,
{
    let input = NotificationInput::new(
        NotificationType::Action,
        title,
        format!("{} {verb} client {}", user.display_name(), client.company_name),
    )
    .record(entity::CLIENT, client.id);
    notify_active_users(repo, hub, &input);
}

fn load_active<R>(repo: &R, client_id: &str) -> ServiceResult<Client>
where
    R: ClientReader + ?Sized,
{
    let id = ClientId::parse(client_id)
        .map_err(|_| ServiceError::NotFound(CLIENT_NOT_FOUND.to_string()))?;
    repo.get_client_by_id(id)?
        .filter(|client| client.is_active)
        .ok_or_else(|| ServiceError::NotFound(CLIENT_NOT_FOUND.to_string()))
}

/// Active clients, newest first.
pub fn list_clients<R>(repo: &R) -> ServiceResult<Vec<Client>>
where
    R: ClientReader + ?Sized,
{
    repo.list_active_clients().map_err(|err| {
        log::error!("Failed to list clients: {err}");
        err.into()
    })
}

pub fn get_client<R>(repo: &R, client_id: &str) -> ServiceResult<Client>
where
    R: ClientReader + ?Sized,
{
    load_active(repo, client_id)
}

pub fn create_client<R>(
    repo: &R,
    hub: &NotificationHub,
    user: &AuthenticatedUser,
    meta: &RequestMeta,
    form: CreateClientForm,
) -> ServiceResult<Client>
where
    R: ClientWriter + AuditLogWriter + UserReader + ?Sized,
{
    let details = ClientDetails::try_from(form)?;

    let client = repo.create_client(&NewClient::new(details)).map_err(|err| {
        log::error!("Failed to create client: {err}");
        err
    })?;

    record(
        repo,
        user,
        meta,
        NewAuditLog::new(entity::CLIENT, client.id, AuditAction::Create)
            .new_values(tracked_fields(&client)),
    );
    notify(repo, hub, user, &client, "Client added", "added");

    Ok(client)
}

/// Applies a partial update; absent fields keep their stored values.
pub fn update_client<R>(
    repo: &R,
    hub: &NotificationHub,
    user: &AuthenticatedUser,
    meta: &RequestMeta,
    client_id: &str,
    form: UpdateClientForm,
) -> ServiceResult<Client>
where
    R: ClientReader + ClientWriter + AuditLogWriter + UserReader + ?Sized,
{
    let patch = ClientPatch::try_from(form)?;
    let existing = load_active(repo, client_id)?;

    let updated = repo
        .update_client(existing.id, &existing.patched(patch))
        .map_err(|err| {
            log::error!("Failed to update client {}: {err}", existing.id);
            err
        })?;

    let changes = diff(&tracked_fields(&existing), &tracked_fields(&updated));
    record(
        repo,
        user,
        meta,
        NewAuditLog::new(entity::CLIENT, updated.id, AuditAction::Update)
            .old_values(changes.old)
            .new_values(changes.new),
    );
    notify(repo, hub, user, &updated, "Client updated", "updated");

    Ok(updated)
}

/// Soft delete; admins only.
pub fn delete_client<R>(
    repo: &R,
    hub: &NotificationHub,
    user: &AuthenticatedUser,
    meta: &RequestMeta,
    client_id: &str,
) -> ServiceResult<()>
where
    R: ClientReader + ClientWriter + AuditLogWriter + UserReader + ?Sized,
{
    ensure_role(user, &[Role::Admin])?;

    let existing = load_active(repo, client_id)?;

    repo.deactivate_client(existing.id).map_err(|err| {
        log::error!("Failed to delete client {}: {err}", existing.id);
        err
    })?;

    record(
        repo,
        user,
        meta,
        NewAuditLog::new(entity::CLIENT, existing.id, AuditAction::Delete)
            .old_values(tracked_fields(&existing)),
    );
    notify(repo, hub, user, &existing, "Client removed", "deleted");

    Ok(())
}
