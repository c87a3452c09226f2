use super::controller::{add_file, delete_file, get_files, rename_file};
use crate::middleware::auth::verify_token;
use actix_web::web;
use actix_web_httpauth::middleware::HttpAuthentication;

pub fn file_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/files")
            .wrap(HttpAuthentication::bearer(verify_token))
            .route("", web::post().to(add_file))
            .route("", web::get().to(get_files))
            .route("", web::delete().to(delete_file))
            .route("/name", web::put().to(rename_file)),
    );
}
