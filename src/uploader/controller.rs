use actix_multipart::Multipart;
use actix_web::{HttpResponse, web};
use futures_util::StreamExt;

use crate::utils::error::CustomError;
use crate::utils::uploads::UploadService;

/// Pull the first file field out of a multipart form
async fn extract_file(mut payload: Multipart) -> Result<(String, Vec<u8>), CustomError> {
    while let Some(item) = payload.next().await {
        let mut field = item.map_err(|e| {
            CustomError::BadRequestError(format!("Error reading multipart field: {}", e))
        })?;

        let content_disposition = match field.content_disposition() {
            Some(cd) => cd,
            None => continue,
        };

        if content_disposition.get_name().unwrap_or("") != "file" {
            continue;
        }

        let file_name = content_disposition
            .get_filename()
            .map(|f| f.to_string())
            .unwrap_or_else(|| "unknown".to_string());

        let mut data = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk = chunk.map_err(|e| {
                CustomError::BadRequestError(format!("Error reading file chunk: {}", e))
            })?;
            data.extend_from_slice(&chunk);
        }

        if !data.is_empty() {
            return Ok((file_name, data));
        }
    }

    Err(CustomError::BadRequestError("No file provided".into()))
}

/// Upload a background image for a paper
/// POST /upload/image
pub async fn upload_image(
    payload: Multipart,
    blob: web::Data<Option<UploadService>>,
) -> Result<HttpResponse, CustomError> {
    let (file_name, data) = extract_file(payload).await?;

    let blob = blob
        .get_ref()
        .as_ref()
        .ok_or_else(|| CustomError::InternalServerError("Blob store not configured".into()))?;

    let uploaded = blob
        .upload_image(data, &file_name)
        .await
        .map_err(CustomError::InternalServerError)?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Image saved successfully",
        "httpStatusCode": 200,
        "service": std::env::var("SERVICE_NAME").unwrap_or_else(|_| "Unknown".to_string()),
        "link": uploaded.secure_url,
        "public_id": uploaded.public_id,
        "bytes": uploaded.bytes,
    })))
}
