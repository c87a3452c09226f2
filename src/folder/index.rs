use super::controller::{add_folder, delete_folder, get_folders, rename_folder};
use crate::middleware::auth::verify_token;
use actix_web::web;
use actix_web_httpauth::middleware::HttpAuthentication;

pub fn folder_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/folders")
            .wrap(HttpAuthentication::bearer(verify_token))
            .route("", web::post().to(add_folder))
            .route("", web::get().to(get_folders))
            .route("", web::delete().to(delete_folder))
            .route("/name", web::put().to(rename_folder)),
    );
}
