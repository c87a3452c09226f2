use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use sha1::{Digest, Sha1};
use std::env;

/// Cloudinary configuration loaded from environment variables
#[derive(Clone)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
}

impl CloudinaryConfig {
    /// Load Cloudinary configuration from environment variables
    pub fn from_env() -> Result<Self, String> {
        Ok(Self {
            cloud_name: env::var("CLOUDINARY_CLOUD_NAME")
                .map_err(|_| "CLOUDINARY_CLOUD_NAME is required")?,
            api_key: env::var("CLOUDINARY_API_KEY")
                .map_err(|_| "CLOUDINARY_API_KEY is required")?,
            api_secret: env::var("CLOUDINARY_API_SECRET")
                .map_err(|_| "CLOUDINARY_API_SECRET is required")?,
        })
    }

    /// Get the upload URL for Cloudinary
    pub fn upload_url(&self) -> String {
        format!(
            "https://api.cloudinary.com/v1_1/{}/image/upload",
            self.cloud_name
        )
    }

    /// Get the destroy URL for Cloudinary
    pub fn destroy_url(&self) -> String {
        format!(
            "https://api.cloudinary.com/v1_1/{}/image/destroy",
            self.cloud_name
        )
    }

    /// Generate a signature for authenticated requests
    pub fn generate_signature(&self, params: &str, timestamp: i64) -> String {
        let to_sign = if params.is_empty() {
            format!("timestamp={}{}", timestamp, self.api_secret)
        } else {
            format!("{}&timestamp={}{}", params, timestamp, self.api_secret)
        };
        let mut hasher = Sha1::new();
        hasher.update(to_sign.as_bytes());
        format!("{:x}", hasher.finalize())
    }
}

/// Response from Cloudinary upload API
#[derive(Debug, Deserialize)]
pub struct CloudinaryUploadResponse {
    pub public_id: String,
    pub secure_url: String,
    pub bytes: u64,
}

#[derive(Debug, Deserialize)]
struct CloudinaryDestroyResponse {
    result: String,
}

#[derive(Debug, Deserialize)]
struct CloudinaryError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct CloudinaryErrorResponse {
    error: CloudinaryError,
}

/// Blob-store client for background-image assets.
#[derive(Clone)]
pub struct UploadService {
    config: CloudinaryConfig,
    client: reqwest::Client,
}

impl UploadService {
    /// Create a new UploadService from the environment
    pub fn from_env() -> Result<Self, String> {
        let config = CloudinaryConfig::from_env()?;
        let client = reqwest::Client::new();
        Ok(Self { config, client })
    }

    /// Upload an image, returning its public URL
    pub async fn upload_image(
        &self,
        file_data: Vec<u8>,
        file_name: &str,
    ) -> Result<CloudinaryUploadResponse, String> {
        let timestamp = chrono::Utc::now().timestamp();
        let signature = self.config.generate_signature("", timestamp);

        let file_part = Part::bytes(file_data)
            .file_name(file_name.to_string())
            .mime_str("application/octet-stream")
            .map_err(|e| format!("Failed to create file part: {}", e))?;

        let form = Form::new()
            .part("file", file_part)
            .text("api_key", self.config.api_key.clone())
            .text("timestamp", timestamp.to_string())
            .text("signature", signature);

        let response = self
            .client
            .post(self.config.upload_url())
            .multipart(form)
            .send()
            .await
            .map_err(|e| format!("Failed to send upload request: {}", e))?;

        if response.status().is_success() {
            response
                .json::<CloudinaryUploadResponse>()
                .await
                .map_err(|e| format!("Failed to parse upload response: {}", e))
        } else {
            let error_response = response
                .json::<CloudinaryErrorResponse>()
                .await
                .map_err(|e| format!("Failed to parse error response: {}", e))?;
            Err(format!("Upload failed: {}", error_response.error.message))
        }
    }

    /// Delete a stored asset by its public URL.
    ///
    /// Idempotent: destroying an already-absent asset is not an error.
    pub async fn delete_by_url(&self, url: &str) -> Result<(), String> {
        let public_id = public_id_from_url(url)
            .ok_or_else(|| format!("not a recognised asset URL: {}", url))?;

        let timestamp = chrono::Utc::now().timestamp();
        let params = format!("public_id={}", public_id);
        let signature = self.config.generate_signature(&params, timestamp);

        let form = Form::new()
            .text("public_id", public_id)
            .text("api_key", self.config.api_key.clone())
            .text("timestamp", timestamp.to_string())
            .text("signature", signature);

        let response = self
            .client
            .post(self.config.destroy_url())
            .multipart(form)
            .send()
            .await
            .map_err(|e| format!("Failed to send destroy request: {}", e))?;

        if !response.status().is_success() {
            return Err(format!("Destroy request failed: {}", response.status()));
        }

        let destroy = response
            .json::<CloudinaryDestroyResponse>()
            .await
            .map_err(|e| format!("Failed to parse destroy response: {}", e))?;

        match destroy.result.as_str() {
            "ok" | "not found" => Ok(()),
            other => Err(format!("Destroy rejected: {}", other)),
        }
    }
}

/// Best-effort release of a stored asset during a structural delete.
/// Failures are logged, never propagated.
pub async fn release_asset(blob: &Option<UploadService>, url: &str) {
    match blob {
        Some(service) => {
            if let Err(e) = service.delete_by_url(url).await {
                log::warn!("Failed to release asset {}: {}", url, e);
            }
        }
        None => log::warn!("Blob store not configured; leaving asset {}", url),
    }
}

/// Extract the Cloudinary public id from a delivery URL.
///
/// URLs look like
/// `https://res.cloudinary.com/<cloud>/image/upload/v1700000000/folder/name.png`;
/// the public id is the path after the version segment, minus the extension.
pub fn public_id_from_url(url: &str) -> Option<String> {
    let (_, after) = url.split_once("/upload/")?;
    let after = after.split(['?', '#']).next().unwrap_or(after);

    let mut segments: Vec<&str> = after.split('/').filter(|s| !s.is_empty()).collect();
    if segments.is_empty() {
        return None;
    }

    // Drop the version segment (v<digits>) if present
    if segments[0].starts_with('v') && segments[0][1..].chars().all(|c| c.is_ascii_digit()) {
        segments.remove(0);
    }
    if segments.is_empty() {
        return None;
    }

    let mut public_id = segments.join("/");
    if let Some(dot) = public_id.rfind('.') {
        if dot > public_id.rfind('/').map_or(0, |s| s + 1) {
            public_id.truncate(dot);
        }
    }

    if public_id.is_empty() {
        None
    } else {
        Some(public_id)
    }
}

#[cfg(test)]
mod tests {
    use super::public_id_from_url;

    #[test]
    fn extracts_public_id_with_version_and_extension() {
        let url = "https://res.cloudinary.com/demo/image/upload/v1700000000/backgrounds/grid.png";
        assert_eq!(
            public_id_from_url(url),
            Some("backgrounds/grid".to_string())
        );
    }

    #[test]
    fn extracts_public_id_without_version() {
        let url = "https://res.cloudinary.com/demo/image/upload/grid.png";
        assert_eq!(public_id_from_url(url), Some("grid".to_string()));
    }

    #[test]
    fn strips_query_string() {
        let url = "https://res.cloudinary.com/demo/image/upload/v1/a/b.jpg?_a=1";
        assert_eq!(public_id_from_url(url), Some("a/b".to_string()));
    }

    #[test]
    fn rejects_unrelated_url() {
        assert_eq!(public_id_from_url("https://example.com/image.png"), None);
        assert_eq!(public_id_from_url("https://res.cloudinary.com/demo/image/upload/"), None);
    }
}
