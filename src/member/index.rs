use super::controller::{change_member_role, get_members, invite_member, remove_member};
use crate::middleware::auth::verify_token;
use actix_web::web;
use actix_web_httpauth::middleware::HttpAuthentication;

pub fn member_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/members")
            .wrap(HttpAuthentication::bearer(verify_token))
            .route("", web::post().to(invite_member))
            .route("", web::get().to(get_members))
            .route("", web::put().to(change_member_role))
            .route("", web::delete().to(remove_member)),
    );
}
