use super::controller::{create_room, delete_room, get_rooms, rename_room};
use crate::middleware::auth::verify_token;
use actix_web::web;
use actix_web_httpauth::middleware::HttpAuthentication;

pub fn room_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/rooms")
            .wrap(HttpAuthentication::bearer(verify_token))
            .route("", web::post().to(create_room))
            .route("", web::get().to(get_rooms))
            .route("", web::delete().to(delete_room))
            .route("/name", web::put().to(rename_room)),
    );
}
