use actix_web::{App, HttpResponse, http::StatusCode, test, web};
use chrono::{Duration, Utc};
use serde_json::Value;

use proposal_crm::domain::auth::AuthenticatedUser;
use proposal_crm::domain::types::{Email, PersonName, UserId};
use proposal_crm::domain::user::{Role, User};
use proposal_crm::services::audit::RequestMeta;
use proposal_crm::services::auth::JwtKeys;

fn keys() -> JwtKeys {
    JwtKeys::new("access", "refresh", Duration::minutes(5), Duration::days(1))
}

fn user() -> User {
    let now = Utc::now().naive_utc();
    User {
        id: UserId::new(),
        email: Email::new("user@example.com").unwrap(),
        password_hash: String::new(),
        role: Role::User,
        first_name: PersonName::new("Sam").unwrap(),
        last_name: PersonName::new("Lee").unwrap(),
        is_active: true,
        created_at: now,
        updated_at: now,
    }
}

async fn whoami(user: AuthenticatedUser) -> HttpResponse {
    HttpResponse::Ok().body(user.email)
}

async fn meta(meta: RequestMeta) -> HttpResponse {
    HttpResponse::Ok().body(format!(
        "{}|{}",
        meta.ip_address.unwrap_or_default(),
        meta.user_agent.unwrap_or_default()
    ))
}

#[actix_web::test]
async fn missing_token_is_unauthorized() {
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(keys()))
            .route("/", web::get().to(whoami)),
    )
    .await;

    let req = test::TestRequest::get().uri("/").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Access token required");
}

#[actix_web::test]
async fn token_signed_with_other_secret_is_rejected() {
    let foreign = JwtKeys::new("other", "refresh", Duration::minutes(5), Duration::days(1))
        .issue_access_token(&user())
        .unwrap();
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(keys()))
            .route("/", web::get().to(whoami)),
    )
    .await;

    let req = test::TestRequest::get()
        .uri("/")
        .insert_header(("Authorization", format!("Bearer {foreign}")))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Invalid or expired token");
}

#[actix_web::test]
async fn valid_token_reaches_handler() {
    let keys = keys();
    let token = keys.issue_access_token(&user()).unwrap();
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(keys))
            .route("/", web::get().to(whoami)),
    )
    .await;

    let req = test::TestRequest::get()
        .uri("/")
        .insert_header(("Authorization", format!("Bearer {token}")))
        .to_request();
    let body = test::call_and_read_body(&app, req).await;
    assert_eq!(body, "user@example.com");
}

#[actix_web::test]
async fn request_meta_prefers_forwarded_address() {
    let app = test::init_service(App::new().route("/", web::get().to(meta))).await;

    let req = test::TestRequest::get()
        .uri("/")
        .insert_header(("X-Forwarded-For", "203.0.113.7, 10.0.0.1"))
        .insert_header(("User-Agent", "curl/8"))
        .to_request();
    let body = test::call_and_read_body(&app, req).await;
    assert_eq!(body, "203.0.113.7|curl/8");
}
