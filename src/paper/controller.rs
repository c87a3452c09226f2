use crate::paper::model::{
    AddPaperRequest, DeletePaperRequest, InsertPaperRequest, PaperAttrs, PaperListQuery,
    ReplaceDrawingRequest, ReplaceTextRequest, SwapPaperRequest,
};
use crate::paper::service::PaperService;
use crate::utils::error::CustomError;
use actix_web::{HttpResponse, web};

pub async fn add_paper(
    paper_service: web::Data<PaperService>,
    request: web::Json<AddPaperRequest>,
) -> Result<HttpResponse, CustomError> {
    let request = request.into_inner();
    let attrs = PaperAttrs {
        width: request.width,
        height: request.height,
        background_image: request.background_image,
    };

    let paper = paper_service
        .add_paper(&request.room_id, &request.file_id, attrs)
        .await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Paper added successfully",
        "httpStatusCode": 200,
        "service": std::env::var("SERVICE_NAME").unwrap_or_else(|_| "Unknown".to_string()),
        "paper_id": paper.id.to_hex(),
        "page_number": paper.page_number,
    })))
}

pub async fn insert_paper(
    paper_service: web::Data<PaperService>,
    request: web::Json<InsertPaperRequest>,
) -> Result<HttpResponse, CustomError> {
    let request = request.into_inner();
    let attrs = PaperAttrs {
        width: request.width,
        height: request.height,
        background_image: request.background_image,
    };

    let paper = paper_service
        .insert_at(
            &request.room_id,
            &request.file_id,
            request.insert_position,
            attrs,
        )
        .await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Paper inserted successfully",
        "httpStatusCode": 200,
        "service": std::env::var("SERVICE_NAME").unwrap_or_else(|_| "Unknown".to_string()),
        "paper_id": paper.id.to_hex(),
        "position": paper.page_number,
    })))
}

pub async fn get_papers(
    paper_service: web::Data<PaperService>,
    query: web::Query<PaperListQuery>,
) -> Result<HttpResponse, CustomError> {
    let papers = match (&query.file_id, &query.room_id) {
        (Some(file_id), _) => paper_service.papers_in_file(file_id).await?,
        (None, Some(room_id)) => paper_service.papers_in_room(room_id).await?,
        (None, None) => {
            return Err(CustomError::BadRequestError(
                "Missing room_id or file_id parameter".into(),
            ));
        }
    };

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Papers fetched successfully",
        "httpStatusCode": 200,
        "service": std::env::var("SERVICE_NAME").unwrap_or_else(|_| "Unknown".to_string()),
        "papers": papers,
    })))
}

pub async fn swap_paper(
    paper_service: web::Data<PaperService>,
    request: web::Json<SwapPaperRequest>,
) -> Result<HttpResponse, CustomError> {
    let request = request.into_inner();
    let reordered = paper_service
        .swap(&request.file_id, request.from_index, request.to_index)
        .await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Paper pages swapped successfully",
        "httpStatusCode": 200,
        "service": std::env::var("SERVICE_NAME").unwrap_or_else(|_| "Unknown".to_string()),
        "file_id": request.file_id,
        "from_index": request.from_index,
        "to_index": request.to_index,
        "reordered": reordered,
    })))
}

pub async fn delete_paper(
    paper_service: web::Data<PaperService>,
    request: web::Json<DeletePaperRequest>,
) -> Result<HttpResponse, CustomError> {
    let request = request.into_inner();
    let page_number = paper_service.delete_at(&request.paper_id).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Paper deleted successfully",
        "httpStatusCode": 200,
        "service": std::env::var("SERVICE_NAME").unwrap_or_else(|_| "Unknown".to_string()),
        "paper_id": request.paper_id,
        "page_number": page_number,
    })))
}

pub async fn replace_drawing(
    paper_service: web::Data<PaperService>,
    request: web::Json<ReplaceDrawingRequest>,
) -> Result<HttpResponse, CustomError> {
    let request = request.into_inner();
    let paper = paper_service
        .replace_drawing_data(&request.paper_id, request.drawing_data)
        .await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Drawing data replaced successfully",
        "httpStatusCode": 200,
        "service": std::env::var("SERVICE_NAME").unwrap_or_else(|_| "Unknown".to_string()),
        "paper_id": request.paper_id,
        "room_id": paper.room_id,
        "file_id": paper.file_id,
    })))
}

pub async fn replace_text(
    paper_service: web::Data<PaperService>,
    request: web::Json<ReplaceTextRequest>,
) -> Result<HttpResponse, CustomError> {
    let request = request.into_inner();
    let paper = paper_service
        .replace_text_data(&request.paper_id, request.text_data)
        .await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Text data replaced successfully",
        "httpStatusCode": 200,
        "service": std::env::var("SERVICE_NAME").unwrap_or_else(|_| "Unknown".to_string()),
        "paper_id": request.paper_id,
        "room_id": paper.room_id,
        "file_id": paper.file_id,
    })))
}
