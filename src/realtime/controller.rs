use actix::Addr;
use actix_web::{HttpRequest, HttpResponse, web};
use actix_web_actors::ws;

use crate::middleware::auth::decode_token;
use crate::realtime::server::{FanoutServer, ListViewers};
use crate::realtime::session::WsSession;
use crate::utils::error::CustomError;

#[derive(serde::Deserialize)]
pub struct TokenQuery {
    pub token: String,
}

#[derive(serde::Deserialize)]
pub struct ViewersQuery {
    pub file_id: String,
}

/// WebSocket connection handler, token in query parameter since websocket
/// clients cannot reliably set headers.
/// GET /ws?token=<jwt_token>
///
/// Unauthenticated upgrades are rejected; channel membership is only granted
/// to verified users.
pub async fn ws_connect(
    req: HttpRequest,
    stream: web::Payload,
    server: web::Data<Addr<FanoutServer>>,
    query: web::Query<TokenQuery>,
) -> Result<HttpResponse, actix_web::Error> {
    let claims = decode_token(&query.token)?;

    log::info!("WebSocket connection request from user: {}", claims.id);

    let session = WsSession::new(claims.id, server.get_ref().clone());

    ws::start(session, &req, stream)
}

/// Snapshot of the connections currently viewing a file
/// GET /presence/viewers?file_id=<id>
pub async fn list_viewers(
    server: web::Data<Addr<FanoutServer>>,
    query: web::Query<ViewersQuery>,
) -> Result<HttpResponse, CustomError> {
    let viewers = server
        .send(ListViewers {
            file_id: query.file_id.clone(),
        })
        .await
        .map_err(|e| CustomError::InternalServerError(format!("Fanout unavailable: {}", e)))?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Viewers fetched successfully",
        "httpStatusCode": 200,
        "service": std::env::var("SERVICE_NAME").unwrap_or_else(|_| "Unknown".to_string()),
        "file_id": query.file_id.clone(),
        "viewers": viewers,
    })))
}
