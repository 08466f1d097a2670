//! Sign-in, token issuing and password hashing.

use argon2::password_hash::{SaltString, rand_core::OsRng};
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::domain::auth::AuthenticatedUser;
use crate::domain::types::{Email, PersonName, UserId};
use crate::domain::user::{NewUser, Role, UpdateUser, User};
use crate::dto::auth::{AccessTokenResponse, LoginOutcome, MeResponse};
use crate::dto::users::UserView;
use crate::forms::auth::{LoginForm, LoginPayload};
use crate::models::config::{ServerConfig, SuperadminConfig};
use crate::repository::{UserReader, UserWriter};
use crate::services::{ServiceError, ServiceResult, actor_id};

pub const INVALID_CREDENTIALS: &str = "Invalid credentials";
pub const INVALID_TOKEN: &str = "Invalid or expired token";
pub const INVALID_REFRESH_TOKEN: &str = "Invalid refresh token";
pub const REFRESH_TOKEN_REQUIRED: &str = "Refresh token required";

/// Which login endpoint the credentials were posted to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Portal {
    User,
    Admin,
}

impl Portal {
    fn admits(self, role: Role) -> bool {
        match self {
            Portal::User => role == Role::User,
            Portal::Admin => role.is_admin(),
        }
    }
}

/// Claims of a refresh token; only the subject is trusted on refresh.
#[derive(Debug, Serialize, Deserialize)]
struct RefreshClaims {
    sub: String,
    exp: usize,
}

/// Signing material and lifetimes for both token kinds.
#[derive(Clone)]
pub struct JwtKeys {
    access_encoding: EncodingKey,
    access_decoding: DecodingKey,
    refresh_encoding: EncodingKey,
    refresh_decoding: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
    validation: Validation,
}

impl JwtKeys {
    pub fn new(
        access_secret: &str,
        refresh_secret: &str,
        access_ttl: Duration,
        refresh_ttl: Duration,
    ) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        Self {
            access_encoding: EncodingKey::from_secret(access_secret.as_bytes()),
            access_decoding: DecodingKey::from_secret(access_secret.as_bytes()),
            refresh_encoding: EncodingKey::from_secret(refresh_secret.as_bytes()),
            refresh_decoding: DecodingKey::from_secret(refresh_secret.as_bytes()),
            access_ttl,
            refresh_ttl,
            validation,
        }
    }

    pub fn from_config(config: &ServerConfig) -> Self {
        Self::new(
            &config.jwt_secret,
            &config.jwt_refresh_secret,
            Duration::minutes(config.access_token_ttl_minutes),
            Duration::days(config.refresh_token_ttl_days),
        )
    }

    /// Lifetime of the refresh cookie.
    pub fn refresh_ttl(&self) -> Duration {
        self.refresh_ttl
    }

    fn expiry(ttl: Duration) -> usize {
        usize::try_from((Utc::now() + ttl).timestamp()).unwrap_or_default()
    }

    pub fn issue_access_token(&self, user: &User) -> ServiceResult<String> {
        let claims = AuthenticatedUser::from_user(user, Self::expiry(self.access_ttl));
        encode(&Header::default(), &claims, &self.access_encoding).map_err(|err| {
            log::error!("Failed to sign access token: {err}");
            ServiceError::Internal("Failed to sign token".to_string())
        })
    }

    pub fn issue_refresh_token(&self, user: &User) -> ServiceResult<String> {
        let claims = RefreshClaims {
            sub: user.id.to_string(),
            exp: Self::expiry(self.refresh_ttl),
        };
        encode(&Header::default(), &claims, &self.refresh_encoding).map_err(|err| {
            log::error!("Failed to sign refresh token: {err}");
            ServiceError::Internal("Failed to sign token".to_string())
        })
    }

    /// Decodes a bearer token into the caller's claims.
    pub fn verify_access_token(&self, token: &str) -> ServiceResult<AuthenticatedUser> {
        decode::<AuthenticatedUser>(token, &self.access_decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|_| ServiceError::Unauthorized(INVALID_TOKEN.to_string()))
    }

    fn verify_refresh_token(&self, token: &str) -> ServiceResult<UserId> {
        let claims = decode::<RefreshClaims>(token, &self.refresh_decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|_| ServiceError::Unauthorized(INVALID_REFRESH_TOKEN.to_string()))?;
        UserId::parse(&claims.sub)
            .map_err(|_| ServiceError::Unauthorized(INVALID_REFRESH_TOKEN.to_string()))
    }
}

/// Hashes `password` into an Argon2id PHC string.
pub fn hash_password(password: &str) -> ServiceResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| {
            log::error!("Failed to hash password: {err}");
            ServiceError::Internal("Failed to hash password".to_string())
        })
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    PasswordHash::new(hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

fn authenticate<R>(repo: &R, keys: &JwtKeys, form: LoginForm, portal: Portal) -> ServiceResult<LoginOutcome>
where
    R: UserReader + ?Sized,
{
    let payload = LoginPayload::try_from(form)?;

    let user = repo
        .get_user_by_email(&payload.email)?
        .filter(|user| user.is_active && portal.admits(user.role))
        .ok_or_else(|| ServiceError::Unauthorized(INVALID_CREDENTIALS.to_string()))?;

    if !verify_password(&payload.password, &user.password_hash) {
        return Err(ServiceError::Unauthorized(INVALID_CREDENTIALS.to_string()));
    }

    Ok(LoginOutcome {
        access_token: keys.issue_access_token(&user)?,
        refresh_token: keys.issue_refresh_token(&user)?,
        user: UserView::from(&user),
    })
}

/// Sign-in for the user portal; only USER accounts are admitted.
pub fn login<R>(repo: &R, keys: &JwtKeys, form: LoginForm) -> ServiceResult<LoginOutcome>
where
    R: UserReader + ?Sized,
{
    authenticate(repo, keys, form, Portal::User)
}

/// Sign-in for the admin portal; ADMIN and SUPERADMIN accounts only.
pub fn admin_login<R>(repo: &R, keys: &JwtKeys, form: LoginForm) -> ServiceResult<LoginOutcome>
where
    R: UserReader + ?Sized,
{
    authenticate(repo, keys, form, Portal::Admin)
}

/// Issues a new access token from a refresh token, reloading the account
/// so role and name changes are picked up.
pub fn refresh<R>(repo: &R, keys: &JwtKeys, token: Option<&str>) -> ServiceResult<AccessTokenResponse>
where
    R: UserReader + ?Sized,
{
    let token = token
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ServiceError::Unauthorized(REFRESH_TOKEN_REQUIRED.to_string()))?;
    let user_id = keys.verify_refresh_token(token)?;

    let user = repo
        .get_user_by_id(user_id)?
        .filter(|user| user.is_active)
        .ok_or_else(|| ServiceError::Unauthorized(INVALID_REFRESH_TOKEN.to_string()))?;

    Ok(AccessTokenResponse {
        access_token: keys.issue_access_token(&user)?,
    })
}

pub fn me<R>(repo: &R, user: &AuthenticatedUser) -> ServiceResult<MeResponse>
where
    R: UserReader + ?Sized,
{
    let account = repo.get_user_by_id(actor_id(user)?)?;
    Ok(MeResponse {
        user: account.as_ref().map(UserView::from),
    })
}

/// Creates the configured superadmin, or restores its role, active flag,
/// password and names when the account already exists.
pub fn ensure_superadmin<R>(repo: &R, config: &SuperadminConfig) -> ServiceResult<User>
where
    R: UserReader + UserWriter + ?Sized,
{
    let email = Email::new(config.email.as_str())?;
    let first_name = PersonName::new(config.first_name.as_str())?;
    let last_name = PersonName::new(config.last_name.as_str())?;
    let password_hash = hash_password(&config.password)?;

    match repo.get_user_by_email(&email)? {
        Some(existing) => {
            let updates = UpdateUser {
                password_hash: Some(password_hash),
                role: Some(Role::SuperAdmin),
                first_name: Some(first_name),
                last_name: Some(last_name),
                is_active: Some(true),
                ..UpdateUser::default()
            };
            let user = repo.update_user(existing.id, &updates)?;
            log::info!("Superadmin account {email} verified");
            Ok(user)
        }
        None => {
            let new_user = NewUser::new(
                email.clone(),
                password_hash,
                Role::SuperAdmin,
                first_name,
                last_name,
            );
            let user = repo.create_user(&new_user)?;
            log::info!("Superadmin account {email} created");
            Ok(user)
        }
    }
}
