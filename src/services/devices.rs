//! Device catalog management.

use serde_json::{Map, Value, json};

use crate::domain::audit_log::{AuditAction, NewAuditLog, diff, entity};
use crate::domain::auth::AuthenticatedUser;
use crate::domain::device::{Device, DevicePatch, NewDevice};
use crate::domain::types::DeviceId;
use crate::domain::user::Role;
use crate::forms::devices::{CreateDeviceForm, CreateDevicePayload, UpdateDeviceForm};
use crate::notifications::{NotificationHub, NotificationInput, NotificationType};
use crate::repository::{AuditLogWriter, DeviceReader, DeviceWriter, UserReader};
use crate::services::audit::{RequestMeta, record};
use crate::services::{ServiceError, ServiceResult, ensure_role, notify_active_users};

const ITEM_NOT_FOUND: &str = "Item not found";
const CATALOG_ROLES: &[Role] = &[Role::Admin, Role::SuperAdmin];

fn tracked_fields(device: &Device) -> Map<String, Value> {
    let mut fields = Map::new();
    fields.insert("name".into(), json!(device.name.as_str()));
    fields.insert("category".into(), json!(device.category));
    fields.insert("make".into(), json!(device.make));
    fields.insert("model".into(), json!(device.model));
    fields.insert("unitPrice".into(), json!(device.unit_price.get()));
    fields
}

fn notify<R>(
    repo: &R,
    hub: &NotificationHub,
    user: &AuthenticatedUser,
    device: &Device,
    title: &str,
    verb: &str,
) where
    R: UserReader + ?Sized,
{
    let input = NotificationInput::new(
        NotificationType::Action,
        title,
        format!("{} {verb} device {}", user.display_name(), device.name),
    )
    .record(entity::DEVICE, device.id);
    notify_active_users(repo, hub, &input);
}

fn load_active<R>(repo: &R, device_id: &str) -> ServiceResult<Device>
where
    R: DeviceReader + ?Sized,
{
    let id = DeviceId::parse(device_id)
        .map_err(|_| ServiceError::NotFound(ITEM_NOT_FOUND.to_string()))?;
    repo.get_device_by_id(id)?
        .filter(|device| device.is_active)
        .ok_or_else(|| ServiceError::NotFound(ITEM_NOT_FOUND.to_string()))
}

pub fn list_devices<R>(repo: &R) -> ServiceResult<Vec<Device>>
where
    R: DeviceReader + ?Sized,
{
    repo.list_active_devices().map_err(|err| {
        log::error!("Failed to list devices: {err}");
        err.into()
    })
}

pub fn get_device<R>(repo: &R, device_id: &str) -> ServiceResult<Device>
where
    R: DeviceReader + ?Sized,
{
    load_active(repo, device_id)
}

pub fn create_device<R>(
    repo: &R,
    hub: &NotificationHub,
    user: &AuthenticatedUser,
    meta: &RequestMeta,
    form: CreateDeviceForm,
) -> ServiceResult<Device>
where
    R: DeviceWriter + AuditLogWriter + UserReader + ?Sized,
{
    ensure_role(user, CATALOG_ROLES)?;

    let payload = CreateDevicePayload::try_from(form)?;

    let device = repo
        .create_device(&NewDevice::new(payload.name, payload.details))
        .map_err(|err| {
            log::error!("Failed to create device: {err}");
            err
        })?;

    record(
        repo,
        user,
        meta,
        NewAuditLog::new(entity::DEVICE, device.id, AuditAction::Create)
            .new_values(tracked_fields(&device)),
    );
    notify(repo, hub, user, &device, "Device added", "added");

    Ok(device)
}

/// Partial update. The catalog name cannot be changed.
pub fn update_device<R>(
    repo: &R,
    hub: &NotificationHub,
    user: &AuthenticatedUser,
    meta: &RequestMeta,
    device_id: &str,
    form: UpdateDeviceForm,
) -> ServiceResult<Device>
where
    R: DeviceReader + DeviceWriter + AuditLogWriter + UserReader + ?Sized,
{
    ensure_role(user, CATALOG_ROLES)?;

    let patch = DevicePatch::try_from(form)?;
    let existing = load_active(repo, device_id)?;

    let updated = repo
        .update_device(existing.id, &existing.patched(patch))
        .map_err(|err| {
            log::error!("Failed to update device {}: {err}", existing.id);
            err
        })?;

    let changes = diff(&tracked_fields(&existing), &tracked_fields(&updated));
    record(
        repo,
        user,
        meta,
        NewAuditLog::new(entity::DEVICE, updated.id, AuditAction::Update)
            .old_values(changes.old)
            .new_values(changes.new),
    );
    notify(repo, hub, user, &updated, "Device updated", "updated");

    Ok(updated)
}

pub fn delete_device<R>(
    repo: &R,
    hub: &NotificationHub,
    user: &AuthenticatedUser,
    meta: &RequestMeta,
    device_id: &str,
) -> ServiceResult<()>
where
    R: DeviceReader + DeviceWriter + AuditLogWriter + UserReader + ?Sized,
{
    ensure_role(user, CATALOG_ROLES)?;

    let existing = load_active(repo, device_id)?;

    repo.deactivate_device(existing.id).map_err(|err| {
        log::error!("Failed to delete device {}: {err}", existing.id);
        err
    })?;

    record(
        repo,
        user,
        meta,
        NewAuditLog::new(entity::DEVICE, existing.id, AuditAction::Delete)
            .old_values(tracked_fields(&existing)),
    );
    notify(repo, hub, user, &existing, "Device removed", "deleted");

    Ok(())
}
