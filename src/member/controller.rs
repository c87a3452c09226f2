use crate::member::model::{
    ChangeRoleRequest, InviteMemberRequest, MemberListQuery, RemoveMemberRequest,
};
use crate::member::service::MemberService;
use crate::middleware::auth::get_user_id_from_request;
use crate::utils::error::CustomError;
use actix_web::{HttpRequest, HttpResponse, web};

pub async fn invite_member(
    member_service: web::Data<MemberService>,
    request: web::Json<InviteMemberRequest>,
    req: HttpRequest,
) -> Result<HttpResponse, CustomError> {
    let inviter_id = get_user_id_from_request(&req)
        .ok_or_else(|| CustomError::UnauthorizedError("No claims found".into()))?;

    let request = request.into_inner();
    let member = member_service
        .invite(&inviter_id, &request.room_id, &request.member_id, request.role)
        .await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Room shared successfully",
        "httpStatusCode": 200,
        "service": std::env::var("SERVICE_NAME").unwrap_or_else(|_| "Unknown".to_string()),
        "member_id": member.id.to_hex(),
    })))
}

pub async fn get_members(
    member_service: web::Data<MemberService>,
    query: web::Query<MemberListQuery>,
) -> Result<HttpResponse, CustomError> {
    let members = member_service.members_in_room(&query.room_id).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Members fetched successfully",
        "httpStatusCode": 200,
        "service": std::env::var("SERVICE_NAME").unwrap_or_else(|_| "Unknown".to_string()),
        "members": members,
    })))
}

pub async fn change_member_role(
    member_service: web::Data<MemberService>,
    request: web::Json<ChangeRoleRequest>,
) -> Result<HttpResponse, CustomError> {
    let request = request.into_inner();
    member_service
        .change_role(&request.room_id, &request.member_id, request.role)
        .await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Member role updated successfully",
        "httpStatusCode": 200,
        "service": std::env::var("SERVICE_NAME").unwrap_or_else(|_| "Unknown".to_string()),
    })))
}

pub async fn remove_member(
    member_service: web::Data<MemberService>,
    request: web::Json<RemoveMemberRequest>,
) -> Result<HttpResponse, CustomError> {
    member_service
        .remove(&request.room_id, &request.member_id)
        .await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Member removed successfully",
        "httpStatusCode": 200,
        "service": std::env::var("SERVICE_NAME").unwrap_or_else(|_| "Unknown".to_string()),
    })))
}
