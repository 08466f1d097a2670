//! Configuration model loaded from external sources.

use serde::Deserialize;

/// Account created or repaired at startup with the SUPERADMIN role.
#[derive(Clone, Debug, Deserialize)]
pub struct SuperadminConfig {
    pub email: String,
    pub password: String,
    #[serde(default = "default_superadmin_first_name")]
    pub first_name: String,
    #[serde(default = "default_superadmin_last_name")]
    pub last_name: String,
}

/// Per-IP request budget for the `/api` scope.
#[derive(Clone, Copy, Debug, Deserialize)]
pub struct RateLimitConfig {
    pub max_requests: u32,
    pub window_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 100,
            window_secs: 15 * 60,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
/// Settings shared across handlers.
pub struct ServerConfig {
    pub address: String,
    pub port: u16,
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_refresh_secret: String,
    #[serde(default = "default_access_token_ttl_minutes")]
    pub access_token_ttl_minutes: i64,
    #[serde(default = "default_refresh_token_ttl_days")]
    pub refresh_token_ttl_days: i64,
    #[serde(default)]
    pub cors_origins: Vec<String>,
    #[serde(default)]
    pub cookie_secure: bool,
    #[serde(default)]
    pub production: bool,
    pub templates_dir: String,
    #[serde(default)]
    pub static_dir: Option<String>,
    #[serde(default = "default_company_name")]
    pub company_name: String,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    pub superadmin: SuperadminConfig,
}

fn default_access_token_ttl_minutes() -> i64 {
    15
}

fn default_refresh_token_ttl_days() -> i64 {
    7
}

fn default_company_name() -> String {
    "Proposal CRM".to_string()
}

fn default_superadmin_first_name() -> String {
    "Super".to_string()
}

fn default_superadmin_last_name() -> String {
    "Admin".to_string()
}
