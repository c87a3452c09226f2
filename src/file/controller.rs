use crate::file::model::{CreateFileRequest, DeleteFileRequest, FileListQuery, RenameFileRequest};
use crate::file::service::FileService;
use crate::utils::error::CustomError;
use actix_web::{HttpResponse, web};

pub async fn add_file(
    file_service: web::Data<FileService>,
    request: web::Json<CreateFileRequest>,
) -> Result<HttpResponse, CustomError> {
    let request = request.into_inner();
    let file = file_service
        .add_file(&request.room_id, request.sub_folder_id, &request.name)
        .await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "File added successfully",
        "httpStatusCode": 200,
        "service": std::env::var("SERVICE_NAME").unwrap_or_else(|_| "Unknown".to_string()),
        "file_id": file.id.to_hex(),
    })))
}

pub async fn get_files(
    file_service: web::Data<FileService>,
    query: web::Query<FileListQuery>,
) -> Result<HttpResponse, CustomError> {
    let files = file_service.files_in_room(&query.room_id).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Files fetched successfully",
        "httpStatusCode": 200,
        "service": std::env::var("SERVICE_NAME").unwrap_or_else(|_| "Unknown".to_string()),
        "files": files,
    })))
}

pub async fn rename_file(
    file_service: web::Data<FileService>,
    request: web::Json<RenameFileRequest>,
) -> Result<HttpResponse, CustomError> {
    let request = request.into_inner();
    let file = file_service
        .rename_file(&request.file_id, &request.name)
        .await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "File renamed successfully",
        "httpStatusCode": 200,
        "service": std::env::var("SERVICE_NAME").unwrap_or_else(|_| "Unknown".to_string()),
        "file_id": file.id.to_hex(),
    })))
}

pub async fn delete_file(
    file_service: web::Data<FileService>,
    request: web::Json<DeleteFileRequest>,
) -> Result<HttpResponse, CustomError> {
    let stats = file_service.delete_file(&request.file_id).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "File and all its contents deleted successfully",
        "httpStatusCode": 200,
        "service": std::env::var("SERVICE_NAME").unwrap_or_else(|_| "Unknown".to_string()),
        "stats": stats,
    })))
}
