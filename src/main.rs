use actix::Actor;
use actix_web::http::StatusCode;
use actix_web::middleware::{ErrorHandlers, Logger};
use actix_web::{App, HttpResponse, HttpServer, Responder, get, web};
use dotenv::dotenv;
use env_logger::Env;
use log::info;

mod database;
mod file;
mod folder;
mod member;
mod middleware;
mod paper;
mod realtime;
mod room;
mod router;
mod uploader;
mod utils;

use file::service::FileService;
use folder::service::FolderService;
use member::service::MemberService;
use middleware::not_found::not_found;
use paper::service::PaperService;
use realtime::server::FanoutServer;
use room::service::RoomService;
use router::index::routes;
use serde_json::json;
use utils::uploads::UploadService;

#[get("/")]
async fn default() -> impl Responder {
    HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Welcome to the drawspace workspace server",
        "httpStatusCode": StatusCode::OK.as_u16(),
        "service": std::env::var("SERVICE_NAME").unwrap_or_else(|_| "Unknown".to_string()),
    }))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load environment variables from .env file
    dotenv().ok();

    // Initialize logger with environment variable support
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8000);

    info!("Starting server on http://0.0.0.0:{}", port);

    let mongo_client = database::connect_to_mongo()
        .await
        .expect("Failed to connect to MongoDB");

    // Blob store is optional; structural deletes degrade to leaving assets
    let blob = match UploadService::from_env() {
        Ok(service) => Some(service),
        Err(e) => {
            log::warn!("Blob store disabled: {}", e);
            None
        }
    };

    // Single fanout actor owns channel membership and presence
    let fanout = FanoutServer::new().start();

    let room_service = web::Data::new(RoomService::new(&mongo_client, blob.clone()));
    let folder_service = web::Data::new(FolderService::new(
        &mongo_client,
        blob.clone(),
        fanout.clone(),
    ));
    let file_service = web::Data::new(FileService::new(
        &mongo_client,
        blob.clone(),
        fanout.clone(),
    ));
    let paper_service = web::Data::new(PaperService::new(
        &mongo_client,
        blob.clone(),
        fanout.clone(),
    ));
    let member_service = web::Data::new(MemberService::new(&mongo_client, fanout.clone()));
    let blob_data = web::Data::new(blob);
    let fanout_data = web::Data::new(fanout);

    // Start the HTTP server
    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(room_service.clone())
            .app_data(folder_service.clone())
            .app_data(file_service.clone())
            .app_data(paper_service.clone())
            .app_data(member_service.clone())
            .app_data(blob_data.clone())
            .app_data(fanout_data.clone())
            .configure(routes)
            .wrap(ErrorHandlers::new().handler(StatusCode::NOT_FOUND, not_found))
            .service(default)
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await?;

    info!("Server has stopped");

    Ok(())
}
