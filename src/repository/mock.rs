//! Mock repository implementations for isolating services in tests.

use mockall::mock;

use crate::domain::audit_log::{AuditLog, AuditLogWithUser, NewAuditLog};
use crate::domain::client::{Client, ClientDetails, NewClient};
use crate::domain::dashboard::DashboardSummary;
use crate::domain::device::{Device, DeviceDetails, NewDevice};
use crate::domain::proposal::{NewProposal, ProposalStatus, ProposalWithClient};
use crate::domain::types::{ClientId, DeviceId, Email, ProposalId, UserId};
use crate::domain::user::{NewUser, Role, UpdateUser, User};
use crate::repository::errors::RepositoryResult;
use crate::repository::{
    AuditLogQuery, AuditLogReader, AuditLogWriter, ClientReader, ClientWriter, DashboardReader,
    DeviceReader, DeviceWriter, ProposalReader, ProposalWriter, UserReader, UserWriter,
};

mock! {
    pub Repository {}

    impl UserReader for Repository {
        fn get_user_by_id(&self, id: UserId) -> RepositoryResult<Option<User>>;
        fn get_user_by_email(&self, email: &Email) -> RepositoryResult<Option<User>>;
        fn list_users(&self) -> RepositoryResult<Vec<User>>;
        fn list_active_users(&self) -> RepositoryResult<Vec<User>>;
        fn list_active_users_with_roles(&self, roles: &[Role]) -> RepositoryResult<Vec<User>>;
    }

    impl UserWriter for Repository {
        fn create_user(&self, new_user: &NewUser) -> RepositoryResult<User>;
        fn update_user(&self, id: UserId, updates: &UpdateUser) -> RepositoryResult<User>;
        fn delete_user(&self, id: UserId) -> RepositoryResult<()>;
    }

    impl ClientReader for Repository {
        fn get_client_by_id(&self, id: ClientId) -> RepositoryResult<Option<Client>>;
        fn list_active_clients(&self) -> RepositoryResult<Vec<Client>>;
    }

    impl ClientWriter for Repository {
        fn create_client(&self, new_client: &NewClient) -> RepositoryResult<Client>;
        fn update_client(&self, id: ClientId, details: &ClientDetails) -> RepositoryResult<Client>;
        fn deactivate_client(&self, id: ClientId) -> RepositoryResult<Client>;
    }

    impl DeviceReader for Repository {
        fn get_device_by_id(&self, id: DeviceId) -> RepositoryResult<Option<Device>>;
        fn list_active_devices(&self) -> RepositoryResult<Vec<Device>>;
    }

    impl DeviceWriter for Repository {
        fn create_device(&self, new_device: &NewDevice) -> RepositoryResult<Device>;
        fn update_device(&self, id: DeviceId, details: &DeviceDetails) -> RepositoryResult<Device>;
        fn deactivate_device(&self, id: DeviceId) -> RepositoryResult<Device>;
    }

    impl ProposalReader for Repository {
        fn get_proposal_by_id(&self, id: ProposalId) -> RepositoryResult<Option<ProposalWithClient>>;
        fn list_proposals(&self) -> RepositoryResult<Vec<ProposalWithClient>>;
    }

    impl ProposalWriter for Repository {
        fn create_proposal(&self, new_proposal: &NewProposal) -> RepositoryResult<ProposalWithClient>;
        fn update_proposal_status(
            &self,
            id: ProposalId,
            status: ProposalStatus,
        ) -> RepositoryResult<ProposalWithClient>;
        fn mark_proposal_previewed(&self, id: ProposalId) -> RepositoryResult<ProposalWithClient>;
        fn delete_proposal(&self, id: ProposalId) -> RepositoryResult<()>;
    }

    impl AuditLogReader for Repository {
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

    impl AuditLogWriter for Repository {
        fn create_audit_log(&self, entry: &NewAuditLog) -> RepositoryResult<AuditLog>;
    }

    impl DashboardReader for Repository {
        fn dashboard_summary(&self) -> RepositoryResult<DashboardSummary>;
    }
}
