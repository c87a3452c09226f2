use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Room {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub owner_id: String,
    pub name: String,
    pub color: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateRoomRequest {
    pub name: String,
    #[serde(default)]
    pub color: i32,
}

#[derive(Debug, Deserialize)]
pub struct RenameRoomRequest {
    pub room_id: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct DeleteRoomRequest {
    pub room_id: String,
}

/// Counts reported by a room cascade for observability
#[derive(Debug, Default, Serialize)]
pub struct RoomDeleteStats {
    pub folders: i64,
    pub files: i64,
    pub papers: i64,
    pub members: i64,
}
