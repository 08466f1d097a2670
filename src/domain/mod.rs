//! Domain aggregates exposed by the proposal CRM service layer.

pub mod audit_log;
pub mod auth;
pub mod client;
pub mod dashboard;
pub mod device;
pub mod proposal;
pub mod types;
pub mod user;
