use actix_web::cookie::{Cookie, SameSite, time::Duration as CookieDuration};
use actix_web::{HttpRequest, HttpResponse, get, post, web};

use crate::domain::auth::AuthenticatedUser;
use crate::dto::auth::{LoginOutcome, LoginResponse, MessageResponse};
use crate::forms::auth::LoginForm;
use crate::models::config::ServerConfig;
use crate::repository::DieselRepository;
use crate::routes::error_response;
use crate::services::auth::{self as auth_service, JwtKeys};

pub const REFRESH_COOKIE: &str = "refreshToken";

fn refresh_cookie(token: String, keys: &JwtKeys, config: &ServerConfig) -> Cookie<'static> {
    Cookie::build(REFRESH_COOKIE, token)
        .path("/")
        .http_only(true)
        .same_site(SameSite::Strict)
        .secure(config.cookie_secure)
        .max_age(CookieDuration::seconds(keys.refresh_ttl().num_seconds()))
        .finish()
}

fn signed_in(outcome: LoginOutcome, keys: &JwtKeys, config: &ServerConfig) -> HttpResponse {
    HttpResponse::Ok()
        .cookie(refresh_cookie(outcome.refresh_token, keys, config))
        .json(LoginResponse {
            access_token: outcome.access_token,
            user: outcome.user,
        })
}

#[post("/auth/login")]
pub async fn login(
    repo: web::Data<DieselRepository>,
    keys: web::Data<JwtKeys>,
    config: web::Data<ServerConfig>,
    web::Json(form): web::Json<LoginForm>,
) -> HttpResponse {
    match auth_service::login(repo.get_ref(), &keys, form) {
        Ok(outcome) => signed_in(outcome, &keys, &config),
        Err(err) => error_response(&err, &config),
    }
}

#[post("/auth/admin/login")]
pub async fn admin_login(
    repo: web::Data<DieselRepository>,
    keys: web::Data<JwtKeys>,
    config: web::Data<ServerConfig>,
    web::Json(form): web::Json<LoginForm>,
) -> HttpResponse {
    match auth_service::admin_login(repo.get_ref(), &keys, form) {
        Ok(outcome) => signed_in(outcome, &keys, &config),
        Err(err) => error_response(&err, &config),
    }
}

#[post("/auth/refresh")]
pub async fn refresh(
    req: HttpRequest,
    repo: web::Data<DieselRepository>,
    keys: web::Data<JwtKeys>,
    config: web::Data<ServerConfig>,
) -> HttpResponse {
    let token = req.cookie(REFRESH_COOKIE).map(|c| c.value().to_string());
    match auth_service::refresh(repo.get_ref(), &keys, token.as_deref()) {
        Ok(response) => HttpResponse::Ok().json(response),
        Err(err) => error_response(&err, &config),
    }
}

#[post("/auth/logout")]
pub async fn logout() -> HttpResponse {
    let mut cookie = Cookie::build(REFRESH_COOKIE, "").path("/").finish();
    cookie.make_removal();
    HttpResponse::Ok().cookie(cookie).json(MessageResponse {
        message: "Logged out successfully".to_string(),
    })
}

#[get("/auth/me")]
pub async fn me(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    config: web::Data<ServerConfig>,
) -> HttpResponse {
    match auth_service::me(repo.get_ref(), &user) {
        Ok(response) => HttpResponse::Ok().json(response),
        Err(err) => error_response(&err, &config),
    }
}
