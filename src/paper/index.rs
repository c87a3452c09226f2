use super::controller::{
    add_paper, delete_paper, get_papers, insert_paper, replace_drawing, replace_text, swap_paper,
};
use crate::middleware::auth::verify_token;
use actix_web::web;
use actix_web_httpauth::middleware::HttpAuthentication;

pub fn paper_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/papers")
            .wrap(HttpAuthentication::bearer(verify_token))
            .route("", web::post().to(add_paper))
            .route("", web::get().to(get_papers))
            .route("", web::delete().to(delete_paper))
            .route("/insert", web::post().to(insert_paper))
            .route("/swap", web::put().to(swap_paper))
            .route("/drawing", web::put().to(replace_drawing))
            .route("/text", web::put().to(replace_text)),
    );
}
