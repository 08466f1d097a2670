//! Database models shared across the proposal CRM repository.

pub mod audit_log;
pub mod client;
pub mod config;
pub mod device;
pub mod proposal;
pub mod user;
