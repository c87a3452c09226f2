use super::controller::{list_viewers, ws_connect};
use crate::middleware::auth::verify_token;
use actix_web::web;
use actix_web_httpauth::middleware::HttpAuthentication;

pub fn realtime_routes(cfg: &mut web::ServiceConfig) {
    // The websocket upgrade authenticates itself via the token query param
    cfg.service(web::scope("/ws").route("", web::get().to(ws_connect)));
    cfg.service(
        web::scope("/presence")
            .wrap(HttpAuthentication::bearer(verify_token))
            .route("/viewers", web::get().to(list_viewers)),
    );
}
