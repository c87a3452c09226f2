use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

/// Lifecycle marker for a folder record. A folder switches to `Deleting`
/// when a cascade starts, so an interrupted walk can be detected and the
/// delete retried instead of leaving a silently half-removed subtree.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum FolderStatus {
    #[default]
    Active,
    Deleting,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Folder {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub room_id: String,
    /// Parent folder id; `None` means the folder sits at the room root.
    pub sub_folder_id: Option<String>,
    pub name: String,
    pub color: i32,
    #[serde(default)]
    pub status: FolderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateFolderRequest {
    pub room_id: String,
    pub sub_folder_id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub color: i32,
}

#[derive(Debug, Deserialize)]
pub struct RenameFolderRequest {
    pub folder_id: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct DeleteFolderRequest {
    pub folder_id: String,
}

#[derive(Debug, Deserialize)]
pub struct FolderListQuery {
    pub room_id: String,
}

/// Counts accumulated by a folder cascade
#[derive(Debug, Default, Serialize)]
pub struct DeletionStats {
    pub folders: i64,
    pub files: i64,
    pub papers: i64,
}
