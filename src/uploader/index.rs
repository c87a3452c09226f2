use super::controller::upload_image;
use crate::middleware::auth::verify_token;
use actix_web::web;
use actix_web_httpauth::middleware::HttpAuthentication;

pub fn upload_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/upload")
            .wrap(HttpAuthentication::bearer(verify_token))
            .route("/image", web::post().to(upload_image)),
    );
}
