use crate::middleware::auth::get_user_id_from_request;
use crate::room::model::{CreateRoomRequest, DeleteRoomRequest, RenameRoomRequest};
use crate::room::service::RoomService;
use crate::utils::error::CustomError;
use actix_web::{HttpRequest, HttpResponse, web};

fn caller_id(req: &HttpRequest) -> Result<String, CustomError> {
    get_user_id_from_request(req)
        .ok_or_else(|| CustomError::UnauthorizedError("No claims found".into()))
}

pub async fn create_room(
    room_service: web::Data<RoomService>,
    request: web::Json<CreateRoomRequest>,
    req: HttpRequest,
) -> Result<HttpResponse, CustomError> {
    let owner_id = caller_id(&req)?;
    let room = room_service
        .create_room(&owner_id, &request.name, request.color)
        .await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Room created successfully",
        "httpStatusCode": 200,
        "service": std::env::var("SERVICE_NAME").unwrap_or_else(|_| "Unknown".to_string()),
        "room_id": room.id.to_hex(),
    })))
}

pub async fn get_rooms(
    room_service: web::Data<RoomService>,
    req: HttpRequest,
) -> Result<HttpResponse, CustomError> {
    let user_id = caller_id(&req)?;
    let rooms = room_service.rooms_for_user(&user_id).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Rooms fetched successfully",
        "httpStatusCode": 200,
        "service": std::env::var("SERVICE_NAME").unwrap_or_else(|_| "Unknown".to_string()),
        "rooms": rooms,
    })))
}

pub async fn rename_room(
    room_service: web::Data<RoomService>,
    request: web::Json<RenameRoomRequest>,
) -> Result<HttpResponse, CustomError> {
    let room = room_service
        .rename_room(&request.room_id, &request.name)
        .await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Room renamed successfully",
        "httpStatusCode": 200,
        "service": std::env::var("SERVICE_NAME").unwrap_or_else(|_| "Unknown".to_string()),
        "room_id": room.id.to_hex(),
    })))
}

pub async fn delete_room(
    room_service: web::Data<RoomService>,
    request: web::Json<DeleteRoomRequest>,
    req: HttpRequest,
) -> Result<HttpResponse, CustomError> {
    let user_id = caller_id(&req)?;
    let stats = room_service.delete_room(&request.room_id, &user_id).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Room and all its contents deleted successfully",
        "httpStatusCode": 200,
        "service": std::env::var("SERVICE_NAME").unwrap_or_else(|_| "Unknown".to_string()),
        "stats": stats,
    })))
}
