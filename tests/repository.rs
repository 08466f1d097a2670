use std::collections::HashSet;
use std::sync::{Arc, Barrier};
use std::thread;

use proposal_crm::domain::audit_log::{AuditAction, NewAuditLog};
use proposal_crm::domain::client::{ClientDetails, NewClient};
use proposal_crm::domain::device::{DeviceDetails, NewDevice};
use proposal_crm::domain::proposal::{LineSnapshot, NewProposal, ProposalStatus};
use proposal_crm::domain::types::{
    Amount, CompanyName, DeviceName, Email, Percentage, PersonName, Quantity, UserId,
};
use proposal_crm::domain::user::{NewUser, Role, UpdateUser};
use proposal_crm::repository::errors::RepositoryError;
use proposal_crm::repository::{
    AuditLogQuery, AuditLogReader, AuditLogWriter, ClientReader, ClientWriter, DashboardReader,
    DeviceReader, DeviceWriter, DieselRepository, ProposalReader, ProposalWriter, UserReader,
    UserWriter,
};
use serde_json::{Map, json};

mod common;

fn client_details(name: &str) -> ClientDetails {
    ClientDetails {
        company_name: CompanyName::new(name).unwrap(),
        billing_address: "1 Main St".to_string(),
        shipping_address: None,
        tax_id: Some("GST-1".to_string()),
        tax_exempt: false,
        default_currency: "INR".to_string(),
        payment_terms: "Net 30".to_string(),
        contact_name: Some("Priya".to_string()),
        contact_email: Some(Email::new("priya@acme.test").unwrap()),
        contact_phone: None,
    }
}

fn device_details(price: f64) -> DeviceDetails {
    DeviceDetails {
        description: "Business laptop".to_string(),
        unit: "pcs".to_string(),
        category: "Laptops".to_string(),
        make: "Lenovo".to_string(),
        model: "T14".to_string(),
        unit_cost: Amount::new(price * 0.8).unwrap(),
        unit_price: Amount::new(price).unwrap(),
        specifications: Map::new(),
    }
}

fn line(price: f64, quantity: i32) -> LineSnapshot {
    LineSnapshot {
        inventory_item_id: None,
        name: Some("Laptop".to_string()),
        make: Some("Lenovo".to_string()),
        model: Some("T14".to_string()),
        price,
        specs: None,
        quantity: Quantity::new(quantity).unwrap(),
        discount: Percentage::new(0.0).unwrap(),
    }
}

fn new_user(email: &str, role: Role) -> NewUser {
    NewUser::new(
        Email::new(email).unwrap(),
        "hash".to_string(),
        role,
        PersonName::new("Sam").unwrap(),
        PersonName::new("Lee").unwrap(),
    )
}

#[test]
fn test_user_repository_crud() {
    let test_db = common::TestDb::new("test_user_repository_crud.db");
    let repo = DieselRepository::new(test_db.pool());

    let admin = repo.create_user(&new_user("admin@example.com", Role::Admin)).unwrap();
    let user = repo.create_user(&new_user("user@example.com", Role::User)).unwrap();

    let duplicate = repo.create_user(&new_user("user@example.com", Role::User));
    assert!(matches!(
        duplicate,
        Err(RepositoryError::ConstraintViolation(_))
    ));

    let found = repo
        .get_user_by_email(&Email::new("USER@example.com").unwrap())
        .unwrap()
        .unwrap();
    assert_eq!(found.id, user.id);

    let admins = repo
        .list_active_users_with_roles(&[Role::Admin, Role::SuperAdmin])
        .unwrap();
    assert_eq!(admins.len(), 1);
    assert_eq!(admins[0].id, admin.id);

    let promoted = repo
        .update_user(
            user.id,
            &UpdateUser {
                role: Some(Role::Admin),
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(promoted.role, Role::Admin);
    assert_eq!(promoted.first_name.as_str(), "Sam");

    repo.delete_user(admin.id).unwrap();
    assert!(repo.get_user_by_id(admin.id).unwrap().is_none());
    assert_eq!(repo.list_users().unwrap().len(), 1);
}

#[test]
fn test_client_repository_crud() {
    let test_db = common::TestDb::new("test_client_repository_crud.db");
    let repo = DieselRepository::new(test_db.pool());

    let client = repo
        .create_client(&NewClient::new(client_details("Acme")))
        .unwrap();
    assert!(client.is_active);
    assert_eq!(client.location.as_deref(), Some("1 Main St"));

    let mut details = client_details("Acme Corp");
    details.billing_address = "2 Side St".to_string();
    let updated = repo.update_client(client.id, &details).unwrap();
    assert_eq!(updated.company_name.as_str(), "Acme Corp");
    assert_eq!(updated.location.as_deref(), Some("2 Side St"));

    assert_eq!(repo.list_active_clients().unwrap().len(), 1);
    repo.deactivate_client(client.id).unwrap();
    assert!(repo.list_active_clients().unwrap().is_empty());
    assert!(!repo.get_client_by_id(client.id).unwrap().unwrap().is_active);
}

#[test]
fn test_device_repository_crud() {
    let test_db = common::TestDb::new("test_device_repository_crud.db");
    let repo = DieselRepository::new(test_db.pool());

    let device = repo
        .create_device(&NewDevice::new(
            DeviceName::new("ThinkPad").unwrap(),
            device_details(1000.0),
        ))
        .unwrap();
    assert_eq!(device.unit_price.get(), 1000.0);

    let updated = repo
        .update_device(device.id, &device_details(1200.0))
        .unwrap();
    assert_eq!(updated.unit_price.get(), 1200.0);
    assert_eq!(updated.name.as_str(), "ThinkPad");

    repo.deactivate_device(device.id).unwrap();
    assert!(repo.list_active_devices().unwrap().is_empty());
}

#[test]
fn test_proposal_numbers_follow_sequence() {
    let test_db = common::TestDb::new("test_proposal_numbers_follow_sequence.db");
    let repo = DieselRepository::new(test_db.pool());
    let client = repo
        .create_client(&NewClient::new(client_details("Acme")))
        .unwrap();

    let first = repo
        .create_proposal(&NewProposal::new(
            client.id,
            Some("Laptops".to_string()),
            Some("Alex Doe".to_string()),
            vec![line(100.0, 2), line(50.0, 1)],
            Percentage::new(18.0).unwrap(),
            None,
            None,
            None,
        ))
        .unwrap();
    let second = repo
        .create_proposal(&NewProposal::new(
            client.id,
            None,
            None,
            vec![line(10.0, 1)],
            Percentage::new(0.0).unwrap(),
            None,
            None,
            None,
        ))
        .unwrap();

    assert_eq!(first.proposal.proposal_number, "PROP-1000");
    assert_eq!(second.proposal.proposal_number, "PROP-1001");
    assert_eq!(first.proposal.status, ProposalStatus::Draft);
    assert_eq!(first.proposal.items.len(), 2);
    assert_eq!(first.proposal.subtotal, 250.0);
    assert_eq!(first.proposal.tax_amount, 45.0);
    assert_eq!(first.proposal.total_amount, 295.0);
    assert_eq!(
        first.client.as_ref().map(|c| c.company_name.as_str()),
        Some("Acme")
    );

    let sent = repo
        .update_proposal_status(first.proposal.id, ProposalStatus::Sent)
        .unwrap();
    assert_eq!(sent.proposal.status, ProposalStatus::Sent);

    let previewed = repo.mark_proposal_previewed(first.proposal.id).unwrap();
    assert!(previewed.proposal.is_previewed);

    repo.delete_proposal(second.proposal.id).unwrap();
    assert!(repo.get_proposal_by_id(second.proposal.id).unwrap().is_none());
    assert_eq!(repo.list_proposals().unwrap().len(), 1);
}

#[test]
fn test_dashboard_excludes_rejected_proposals() {
    let test_db = common::TestDb::new("test_dashboard_summary.db");
    let repo = DieselRepository::new(test_db.pool());
    let client = repo
        .create_client(&NewClient::new(client_details("Acme")))
        .unwrap();
    repo.create_device(&NewDevice::new(
        DeviceName::new("ThinkPad").unwrap(),
        device_details(1000.0),
    ))
    .unwrap();

    let kept = repo
        .create_proposal(&NewProposal::new(
            client.id,
            None,
            None,
            vec![line(100.0, 1)],
            Percentage::new(0.0).unwrap(),
            None,
            None,
            None,
        ))
        .unwrap();
    let rejected = repo
        .create_proposal(&NewProposal::new(
            client.id,
            None,
            None,
            vec![line(500.0, 1)],
            Percentage::new(0.0).unwrap(),
            None,
            None,
            None,
        ))
        .unwrap();
    repo.update_proposal_status(rejected.proposal.id, ProposalStatus::Rejected)
        .unwrap();

    let summary = repo.dashboard_summary().unwrap();
    assert_eq!(summary.active_clients, 1);
    assert_eq!(summary.active_devices, 1);
    assert_eq!(summary.active_proposals, 1);
    assert_eq!(summary.total_value, 100.0);
    assert_eq!(summary.recent_proposals.len(), 2);
    assert!(
        summary
            .recent_proposals
            .iter()
            .any(|p| p.id == kept.proposal.id && p.client_name.as_deref() == Some("Acme"))
    );
}

#[test]
fn test_audit_log_filters_and_hydration() {
    let test_db = common::TestDb::new("test_audit_log_filters.db");
    let repo = DieselRepository::new(test_db.pool());
    let actor = repo.create_user(&new_user("actor@example.com", Role::User)).unwrap();

    let mut values = Map::new();
    values.insert("companyName".to_string(), json!("Acme"));
    repo.create_audit_log(
        &NewAuditLog::new("Client", "c-1", AuditAction::Create)
            .new_values(values)
            .actor(Some(actor.id), Some("10.0.0.1".to_string()), None),
    )
    .unwrap();
    repo.create_audit_log(&NewAuditLog::new("Client", "c-2", AuditAction::Delete))
        .unwrap();
    repo.create_audit_log(
        &NewAuditLog::new("Device", "d-1", AuditAction::Create).actor(
            Some(UserId::new()),
            None,
            None,
        ),
    )
    .unwrap();

    let (total, logs) = repo
        .list_audit_logs(AuditLogQuery::default().entity("Client"))
        .unwrap();
    assert_eq!(total, 2);
    assert_eq!(logs.len(), 2);

    let (total, logs) = repo
        .list_audit_logs(AuditLogQuery::default().user_id(actor.id))
        .unwrap();
    assert_eq!(total, 1);
    let actor_view = logs[0].user.as_ref().unwrap();
    assert_eq!(actor_view.email, "actor@example.com");
    assert_eq!(logs[0].log.ip_address.as_deref(), Some("10.0.0.1"));

    let (total, logs) = repo
        .list_audit_logs(AuditLogQuery::default().paginate(1, 0))
        .unwrap();
    assert_eq!(total, 3);
    assert_eq!(logs.len(), 1);

    let history = repo.list_audit_logs_for_record("Device", "d-1").unwrap();
    assert_eq!(history.len(), 1);
    assert!(history[0].user.is_none());
}

#[test]
fn test_concurrent_proposal_creates_get_distinct_numbers() {
    let test_db = common::TestDb::new("test_concurrent_proposal_creates.db");
    let repo = DieselRepository::new(test_db.pool());
    let client = repo
        .create_client(&NewClient::new(client_details("Acme")))
        .unwrap();
    let client_id = client.id;

    let threads = 8;
    let per_thread = 10;
    let barrier = Arc::new(Barrier::new(threads));
    let handles: Vec<_> = (0..threads)
        .map(|_| {
            let repo = repo.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                (0..per_thread)
                    .map(|_| {
                        repo.create_proposal(&NewProposal::new(
                            client_id,
                            None,
                            None,
                            vec![line(10.0, 1)],
                            Percentage::new(0.0).unwrap(),
                            None,
                            None,
                            None,
                        ))
                        .map(|created| created.proposal.proposal_number)
                    })
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let mut numbers = Vec::new();
    for handle in handles {
        for result in handle.join().unwrap() {
            numbers.push(result.expect("concurrent create succeeds"));
        }
    }

    let unique: HashSet<_> = numbers.iter().cloned().collect();
    assert_eq!(numbers.len(), threads * per_thread);
    assert_eq!(unique.len(), numbers.len());
    assert_eq!(repo.list_proposals().unwrap().len(), threads * per_thread);
}
