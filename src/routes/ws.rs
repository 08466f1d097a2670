//! Live notification channel.

use actix_web::http::header::{self, HeaderValue};
use actix_web::{HttpRequest, HttpResponse, get, web};
use actix_ws::Message;
use futures_util::StreamExt;
use serde::Deserialize;

use crate::middleware::{ACCESS_TOKEN_REQUIRED, authenticate, unauthorized};
use crate::notifications::NotificationHub;

#[derive(Debug, Default, Deserialize)]
struct SocketQuery {
    token: Option<String>,
}

/// First `Sec-WebSocket-Protocol` entry; browsers cannot set headers on
/// a WebSocket so the token travels as a subprotocol.
fn protocol_token(req: &HttpRequest) -> Option<String> {
    req.headers()
        .get(header::SEC_WEBSOCKET_PROTOCOL)?
        .to_str()
        .ok()?
        .split(',')
        .next()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn query_token(req: &HttpRequest) -> Option<String> {
    web::Query::<SocketQuery>::from_query(req.query_string())
        .ok()
        .and_then(|query| query.into_inner().token)
        .filter(|token| !token.is_empty())
}

#[get("/ws")]
pub async fn socket(
    req: HttpRequest,
    body: web::Payload,
    hub: web::Data<NotificationHub>,
) -> Result<HttpResponse, actix_web::Error> {
    let protocol = protocol_token(&req);
    let token = protocol
        .clone()
        .or_else(|| query_token(&req))
        .ok_or_else(|| unauthorized(ACCESS_TOKEN_REQUIRED))?;
    let user = authenticate(&req, &token)?;
    let user_id = user
        .user_id()
        .map_err(|_| unauthorized(crate::services::auth::INVALID_TOKEN))?;

    let (mut response, mut session, mut stream) = actix_ws::handle(&req, body)?;
    if let Some(value) = protocol.and_then(|p| HeaderValue::from_str(&p).ok()) {
        response
            .headers_mut()
            .insert(header::SEC_WEBSOCKET_PROTOCOL, value);
    }

    let hub = hub.into_inner();
    let (socket_id, mut rx) = hub.attach(user_id);
    log::info!("WebSocket attached for user {user_id}");

    actix_web::rt::spawn(async move {
        loop {
            tokio::select! {
                outgoing = rx.recv() => {
                    let Some(text) = outgoing else { break };
                    if session.text(text).await.is_err() {
                        break;
                    }
                }
                incoming = stream.next() => {
                    match incoming {
                        Some(Ok(Message::Ping(bytes))) => {
                            if session.pong(&bytes).await.is_err() {
                                break;
                            }
                        }
                        Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                        Some(Ok(_)) => {}
                    }
                }
            }
        }

        hub.detach(user_id, socket_id);
        let _ = session.close(None).await;
        log::info!("WebSocket detached for user {user_id}");
    });

    Ok(response)
}
