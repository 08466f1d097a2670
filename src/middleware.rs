//! Request extractors for the bearer identity and audit metadata, plus
//! the response-shaping middleware shared by the server and its tests.

use std::future::{Ready, ready};
use std::time::Duration;

use actix_web::body::{EitherBody, MessageBody};
use actix_web::dev::{Payload, ServiceRequest, ServiceResponse};
use actix_web::error::InternalError;
use actix_web::http::{Method, StatusCode, header};
use actix_web::middleware::{DefaultHeaders, Next};
use actix_web::{FromRequest, HttpRequest, HttpResponse, web};

use crate::domain::auth::AuthenticatedUser;
use crate::dto::ErrorResponse;
use crate::models::config::RateLimitConfig;
use crate::services::audit::RequestMeta;
use crate::services::auth::JwtKeys;

pub const ACCESS_TOKEN_REQUIRED: &str = "Access token required";
pub const TOO_MANY_REQUESTS: &str = "Too many requests from this IP, please try again later.";

pub fn unauthorized(message: &str) -> actix_web::Error {
    InternalError::from_response(
        message.to_string(),
        HttpResponse::Unauthorized().json(ErrorResponse::new(message)),
    )
    .into()
}

/// Token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Verifies `token` against the keys registered as app data.
pub fn authenticate(req: &HttpRequest, token: &str) -> Result<AuthenticatedUser, actix_web::Error> {
    let keys = req.app_data::<web::Data<JwtKeys>>().ok_or_else(|| {
        log::error!("JwtKeys are not registered as app data");
        actix_web::error::ErrorInternalServerError("Internal server error")
    })?;
    keys.verify_access_token(token)
        .map_err(|err| unauthorized(&err.to_string()))
}

impl FromRequest for AuthenticatedUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(match bearer_token(req) {
            Some(token) => authenticate(req, token),
            None => Err(unauthorized(ACCESS_TOKEN_REQUIRED)),
        })
    }
}

/// Client address: first `X-Forwarded-For` hop, else the peer address.
fn client_ip(req: &HttpRequest) -> Option<String> {
    req.headers()
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(|hop| hop.trim().to_string())
        .filter(|hop| !hop.is_empty())
        .or_else(|| req.peer_addr().map(|addr| addr.ip().to_string()))
}

impl FromRequest for RequestMeta {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(Ok(RequestMeta {
            ip_address: client_ip(req),
            user_agent: req
                .headers()
                .get(header::USER_AGENT)
                .and_then(|value| value.to_str().ok())
                .map(str::to_string),
        }))
    }
}

/// Hardening headers added to every response that does not set them itself.
pub fn security_headers() -> DefaultHeaders {
    DefaultHeaders::new()
        .add((
            header::CONTENT_SECURITY_POLICY,
            "default-src 'self';base-uri 'self';font-src 'self' https: data:;\
             form-action 'self';frame-ancestors 'self';img-src 'self' data:;\
             object-src 'none';script-src 'self';script-src-attr 'none';\
             style-src 'self' https: 'unsafe-inline';upgrade-insecure-requests",
        ))
        .add(("Cross-Origin-Opener-Policy", "same-origin"))
        .add(("Cross-Origin-Resource-Policy", "same-origin"))
        .add(("Origin-Agent-Cluster", "?1"))
        .add((header::REFERRER_POLICY, "no-referrer"))
        .add((
            header::STRICT_TRANSPORT_SECURITY,
            "max-age=15552000; includeSubDomains",
        ))
        .add((header::X_CONTENT_TYPE_OPTIONS, "nosniff"))
        .add((header::X_DNS_PREFETCH_CONTROL, "off"))
        .add(("X-Download-Options", "noopen"))
        .add((header::X_FRAME_OPTIONS, "SAMEORIGIN"))
        .add(("X-Permitted-Cross-Domain-Policies", "none"))
        .add((header::X_XSS_PROTECTION, "0"))
}

/// Methods counted against the `/api` budget; preflight `OPTIONS` is free.
pub fn rate_limited_methods() -> Vec<Method> {
    vec![
        Method::GET,
        Method::HEAD,
        Method::POST,
        Method::PUT,
        Method::PATCH,
        Method::DELETE,
    ]
}

/// Interval after which one more request is allowed, so that a full
/// burst of `max_requests` refills over `window_secs`.
pub fn replenish_period(config: &RateLimitConfig) -> Duration {
    Duration::from_secs(config.window_secs.max(1)) / config.max_requests.max(1)
}

fn too_many_requests<B>(req: HttpRequest) -> ServiceResponse<EitherBody<B>> {
    ServiceResponse::new(
        req,
        HttpResponse::TooManyRequests().json(ErrorResponse::new(TOO_MANY_REQUESTS)),
    )
    .map_into_right_body()
}

/// Renders limiter rejections from the wrapped service as the JSON error body.
pub async fn rate_limit_response<B: MessageBody>(
    req: ServiceRequest,
    next: Next<B>,
) -> Result<ServiceResponse<EitherBody<B>>, actix_web::Error> {
    let http_req = req.request().clone();
    match next.call(req).await {
        Ok(res) if res.status() == StatusCode::TOO_MANY_REQUESTS => {
            Ok(too_many_requests(http_req))
        }
        Ok(res) => Ok(res.map_into_left_body()),
        Err(err) if err.as_response_error().status_code() == StatusCode::TOO_MANY_REQUESTS => {
            Ok(too_many_requests(http_req))
        }
        Err(err) => Err(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_budget_refills_every_nine_seconds() {
        assert_eq!(
            replenish_period(&RateLimitConfig::default()),
            Duration::from_secs(9)
        );
    }

    #[test]
    fn zero_budget_does_not_divide_by_zero() {
        let config = RateLimitConfig {
            max_requests: 0,
            window_secs: 0,
        };
        assert_eq!(replenish_period(&config), Duration::from_secs(1));
    }

    #[test]
    fn options_is_never_counted() {
        assert!(!rate_limited_methods().contains(&Method::OPTIONS));
    }
}
