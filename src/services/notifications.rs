//! The caller's own notification inbox.

use crate::domain::auth::AuthenticatedUser;
use crate::notifications::{Notification, NotificationHub};
use crate::services::{ServiceResult, actor_id};

pub fn list_mine(hub: &NotificationHub, user: &AuthenticatedUser) -> ServiceResult<Vec<Notification>> {
    Ok(hub.list(actor_id(user)?))
}

pub fn mark_all_read(hub: &NotificationHub, user: &AuthenticatedUser) -> ServiceResult<()> {
    hub.mark_all_read(actor_id(user)?);
    Ok(())
}

pub fn clear(hub: &NotificationHub, user: &AuthenticatedUser) -> ServiceResult<()> {
    hub.clear(actor_id(user)?);
    Ok(())
}
