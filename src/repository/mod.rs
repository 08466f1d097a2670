//! Persistence traits and their Diesel implementation.

use crate::db::{DbConnection, DbPool, get_connection};
use crate::domain::audit_log::{AuditLog, AuditLogWithUser, NewAuditLog};
use crate::domain::client::{Client, ClientDetails, NewClient};
use crate::domain::dashboard::DashboardSummary;
use crate::domain::device::{Device, DeviceDetails, NewDevice};
use crate::domain::proposal::{NewProposal, ProposalStatus, ProposalWithClient};
use crate::domain::types::{ClientId, DeviceId, Email, ProposalId, UserId};
use crate::domain::user::{NewUser, Role, UpdateUser, User};
use crate::repository::errors::RepositoryResult;

pub mod audit_log;
pub mod client;
pub mod dashboard;
pub mod device;
pub mod errors;
#[cfg(any(test, feature = "test-mocks"))]
pub mod mock;
pub mod proposal;
pub mod user;

/// Default page size of the audit log listing.
pub const DEFAULT_AUDIT_LIMIT: i64 = 50;

/// Diesel-backed repository sharing one connection pool.
#[derive(Clone)]
pub struct DieselRepository {
    pool: DbPool,
}

impl DieselRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn conn(&self) -> RepositoryResult<DbConnection> {
        Ok(get_connection(&self.pool)?)
    }
}

#[derive(Debug, Clone)]
pub struct AuditLogQuery {
    pub entity: Option<String>,
    pub record_id: Option<String>,
    pub user_id: Option<UserId>,
    pub limit: i64,
    pub offset: i64,
}

impl Default for AuditLogQuery {
    fn default() -> Self {
        Self {
            entity: None,
            record_id: None,
            user_id: None,
            limit: DEFAULT_AUDIT_LIMIT,
            offset: 0,
        }
    }
}

impl AuditLogQuery {
    pub fn entity(mut self, entity: impl Into<String>) -> Self {
        self.entity = Some(entity.into());
        self
    }

    pub fn record_id(mut self, record_id: impl Into<String>) -> Self {
        self.record_id = Some(record_id.into());
        self
    }

    pub fn user_id(mut self, user_id: UserId) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn paginate(mut self, limit: i64, offset: i64) -> Self {
        self.limit = limit;
        self.offset = offset;
        self
    }
}

pub trait UserReader {
    fn get_user_by_id(&self, id: UserId) -> RepositoryResult<Option<User>>;
    fn get_user_by_email(&self, email: &Email) -> RepositoryResult<Option<User>>;
    /// All accounts, newest first.
    fn list_users(&self) -> RepositoryResult<Vec<User>>;
    fn list_active_users(&self) -> RepositoryResult<Vec<User>>;
    fn list_active_users_with_roles(&self, roles: &[Role]) -> RepositoryResult<Vec<User>>;
}

pub trait UserWriter {
    fn create_user(&self, new_user: &NewUser) -> RepositoryResult<User>;
    fn update_user(&self, id: UserId, updates: &UpdateUser) -> RepositoryResult<User>;
    fn delete_user(&self, id: UserId) -> RepositoryResult<()>;
}

pub trait ClientReader {
    fn get_client_by_id(&self, id: ClientId) -> RepositoryResult<Option<Client>>;
    /// Active clients, newest first.
    fn list_active_clients(&self) -> RepositoryResult<Vec<Client>>;
}

pub trait ClientWriter {
    fn create_client(&self, new_client: &NewClient) -> RepositoryResult<Client>;
    fn update_client(&self, id: ClientId, details: &ClientDetails) -> RepositoryResult<Client>;
    fn deactivate_client(&self, id: ClientId) -> RepositoryResult<Client>;
}

pub trait DeviceReader {
    fn get_device_by_id(&self, id: DeviceId) -> RepositoryResult<Option<Device>>;
    /// Active devices, newest first.
    fn list_active_devices(&self) -> RepositoryResult<Vec<Device>>;
}

pub trait DeviceWriter {
    fn create_device(&self, new_device: &NewDevice) -> RepositoryResult<Device>;
    fn update_device(&self, id: DeviceId, details: &DeviceDetails) -> RepositoryResult<Device>;
    fn deactivate_device(&self, id: DeviceId) -> RepositoryResult<Device>;
}

pub trait ProposalReader {
    fn get_proposal_by_id(&self, id: ProposalId) -> RepositoryResult<Option<ProposalWithClient>>;
    /// All proposals with items and client, newest first.
    fn list_proposals(&self) -> RepositoryResult<Vec<ProposalWithClient>>;
}

pub trait ProposalWriter {
    /// Allocates the next proposal number and inserts the proposal with its
    /// items in one transaction.
    fn create_proposal(&self, new_proposal: &NewProposal) -> RepositoryResult<ProposalWithClient>;
    fn update_proposal_status(
        &self,
        id: ProposalId,
        status: ProposalStatus,
    ) -> RepositoryResult<ProposalWithClient>;
    fn mark_proposal_previewed(&self, id: ProposalId) -> RepositoryResult<ProposalWithClient>;
    fn delete_proposal(&self, id: ProposalId) -> RepositoryResult<()>;
}

pub trait AuditLogReader {
    fn list_audit_logs(
        &self,
        query: AuditLogQuery,
    ) -> RepositoryResult<(usize, Vec<AuditLogWithUser>)>;
    fn list_audit_logs_for_record(
        &self,
        entity: &str,
        record_id: &str,
    ) -> RepositoryResult<Vec<AuditLogWithUser>>;
}

pub trait AuditLogWriter {
    fn create_audit_log(&self, entry: &NewAuditLog) -> RepositoryResult<AuditLog>;
}

pub trait DashboardReader {
    fn dashboard_summary(&self) -> RepositoryResult<DashboardSummary>;
}
