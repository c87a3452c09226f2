use crate::folder::model::{
    CreateFolderRequest, DeleteFolderRequest, FolderListQuery, RenameFolderRequest,
};
use crate::folder::service::FolderService;
use crate::utils::error::CustomError;
use actix_web::{HttpResponse, web};

pub async fn add_folder(
    folder_service: web::Data<FolderService>,
    request: web::Json<CreateFolderRequest>,
) -> Result<HttpResponse, CustomError> {
    let request = request.into_inner();
    let folder = folder_service
        .add_folder(
            &request.room_id,
            request.sub_folder_id,
            &request.name,
            request.color,
        )
        .await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Folder added successfully",
        "httpStatusCode": 200,
        "service": std::env::var("SERVICE_NAME").unwrap_or_else(|_| "Unknown".to_string()),
        "folder_id": folder.id.to_hex(),
    })))
}

pub async fn get_folders(
    folder_service: web::Data<FolderService>,
    query: web::Query<FolderListQuery>,
) -> Result<HttpResponse, CustomError> {
    let folders = folder_service.folders_in_room(&query.room_id).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Folders fetched successfully",
        "httpStatusCode": 200,
        "service": std::env::var("SERVICE_NAME").unwrap_or_else(|_| "Unknown".to_string()),
        "folders": folders,
    })))
}

pub async fn rename_folder(
    folder_service: web::Data<FolderService>,
    request: web::Json<RenameFolderRequest>,
) -> Result<HttpResponse, CustomError> {
    let request = request.into_inner();
    let folder = folder_service
        .rename_folder(&request.folder_id, &request.name)
        .await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Folder renamed successfully",
        "httpStatusCode": 200,
        "service": std::env::var("SERVICE_NAME").unwrap_or_else(|_| "Unknown".to_string()),
        "folder_id": folder.id.to_hex(),
    })))
}

pub async fn delete_folder(
    folder_service: web::Data<FolderService>,
    request: web::Json<DeleteFolderRequest>,
) -> Result<HttpResponse, CustomError> {
    let stats = folder_service.delete_folder(&request.folder_id).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Folder and all its contents deleted successfully",
        "httpStatusCode": 200,
        "service": std::env::var("SERVICE_NAME").unwrap_or_else(|_| "Unknown".to_string()),
        "stats": stats,
    })))
}
