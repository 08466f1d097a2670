use std::time::Instant;

use actix_web::{HttpResponse, get, web};
use chrono::Utc;

use crate::dto::health::HealthResponse;

/// Moment the server process began accepting requests.
#[derive(Clone, Copy, Debug)]
pub struct ServerStartedAt(pub Instant);

impl ServerStartedAt {
    pub fn now() -> Self {
        Self(Instant::now())
    }
}

#[get("/health")]
pub async fn health(started_at: web::Data<ServerStartedAt>) -> HttpResponse {
    HttpResponse::Ok().json(HealthResponse {
        status: "ok",
        timestamp: Utc::now(),
        uptime: started_at.0.elapsed().as_secs(),
    })
}
