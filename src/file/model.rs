use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct File {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub room_id: String,
    /// Parent folder id; `None` means the file sits at the room root.
    pub sub_folder_id: Option<String>,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateFileRequest {
    pub room_id: String,
    pub sub_folder_id: Option<String>,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct RenameFileRequest {
    pub file_id: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct DeleteFileRequest {
    pub file_id: String,
}

#[derive(Debug, Deserialize)]
pub struct FileListQuery {
    pub room_id: String,
}

/// Counts reported by a file deletion for observability
#[derive(Debug, Default, Serialize)]
pub struct FileDeleteStats {
    pub files: i64,
    pub papers: i64,
}
