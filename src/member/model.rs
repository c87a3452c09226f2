use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum MemberRole {
    Owner,
    Write,
    Read,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RoomMember {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub inviter_id: String,
    pub room_id: String,
    pub member_id: String,
    pub role: MemberRole,
    pub joined_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct InviteMemberRequest {
    pub room_id: String,
    pub member_id: String,
    pub role: MemberRole,
}

#[derive(Debug, Deserialize)]
pub struct ChangeRoleRequest {
    pub room_id: String,
    pub member_id: String,
    pub role: MemberRole,
}

#[derive(Debug, Deserialize)]
pub struct RemoveMemberRequest {
    pub room_id: String,
    pub member_id: String,
}

#[derive(Debug, Deserialize)]
pub struct MemberListQuery {
    pub room_id: String,
}
