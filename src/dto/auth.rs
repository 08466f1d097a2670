use serde::Serialize;

use crate::dto::users::UserView;

/// Result of a successful sign-in. The refresh token travels separately
/// in a cookie.
#[derive(Debug)]
pub struct LoginOutcome {
    pub access_token: String,
    pub refresh_token: String,
    pub user: UserView,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub access_token: String,
    pub user: UserView,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessTokenResponse {
    pub access_token: String,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user: Option<UserView>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}
