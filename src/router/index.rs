use crate::file::index::file_routes;
use crate::folder::index::folder_routes;
use crate::member::index::member_routes;
use crate::paper::index::paper_routes;
use crate::realtime::index::realtime_routes;
use crate::room::index::room_routes;
use crate::uploader::index::upload_routes;
use actix_web::web;

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.configure(room_routes);
    cfg.configure(folder_routes);
    cfg.configure(file_routes);
    cfg.configure(paper_routes);
    cfg.configure(member_routes);
    cfg.configure(upload_routes);
    cfg.configure(realtime_routes);
}
