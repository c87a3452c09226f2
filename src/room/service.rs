use crate::database::db::DB_NAME;
use crate::database::retry::with_read_retry;
use crate::file::model::File;
use crate::folder::model::Folder;
use crate::member::model::RoomMember;
use crate::paper::model::Paper;
use crate::room::model::{Room, RoomDeleteStats};
use crate::utils::error::CustomError;
use crate::utils::uploads::{UploadService, release_asset};
use chrono::Utc;
use futures_util::TryStreamExt;
use mongodb::{
    Client, Collection,
    bson::{doc, oid::ObjectId},
};

pub struct RoomService {
    rooms: Collection<Room>,
    members: Collection<RoomMember>,
    folders: Collection<Folder>,
    files: Collection<File>,
    papers: Collection<Paper>,
    blob: Option<UploadService>,
}

impl RoomService {
    pub fn new(client: &Client, blob: Option<UploadService>) -> Self {
        let db = client.database(DB_NAME);
        RoomService {
            rooms: db.collection::<Room>("rooms"),
            members: db.collection::<RoomMember>("room_members"),
            folders: db.collection::<Folder>("folders"),
            files: db.collection::<File>("files"),
            papers: db.collection::<Paper>("papers"),
            blob,
        }
    }

    pub async fn create_room(
        &self,
        owner_id: &str,
        name: &str,
        color: i32,
    ) -> Result<Room, CustomError> {
        let room = Room {
            id: ObjectId::new(),
            owner_id: owner_id.to_string(),
            name: name.to_string(),
            color,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        self.rooms
            .insert_one(&room)
            .await
            .map_err(|e| CustomError::StoreUnavailable(format!("Failed to create room: {}", e)))?;

        Ok(room)
    }

    /// Rooms the user owns or has been invited into
    pub async fn rooms_for_user(&self, user_id: &str) -> Result<Vec<Room>, CustomError> {
        let memberships: Vec<RoomMember> = with_read_retry(|| async move {
            self.members
                .find(doc! { "member_id": user_id })
                .await?
                .try_collect()
                .await
        })
        .await?;

        let member_room_ids: Vec<ObjectId> = memberships
            .iter()
            .filter_map(|m| ObjectId::parse_str(&m.room_id).ok())
            .collect();

        with_read_retry(|| {
            let member_room_ids = member_room_ids.clone();
            async move {
                self.rooms
                    .find(doc! { "$or": [
                        { "owner_id": user_id },
                        { "_id": { "$in": member_room_ids } },
                    ] })
                    .sort(doc! { "name": 1 })
                    .await?
                    .try_collect()
                    .await
            }
        })
        .await
    }

    pub async fn rename_room(&self, room_id: &str, name: &str) -> Result<Room, CustomError> {
        let object_id = ObjectId::parse_str(room_id)
            .map_err(|_| CustomError::BadRequestError("Invalid room ID".into()))?;

        self.rooms
            .find_one_and_update(
                doc! { "_id": object_id },
                doc! { "$set": { "name": name, "updated_at": Utc::now().to_rfc3339() } },
            )
            .await
            .map_err(|e| CustomError::StoreUnavailable(format!("Failed to rename room: {}", e)))?
            .ok_or_else(|| CustomError::NotFoundError("Room not found".into()))
    }

    /// Delete a room and everything in it: folders, files, papers (with a
    /// best-effort blob sweep), and membership rows. Only the owner may
    /// delete a room.
    pub async fn delete_room(
        &self,
        room_id: &str,
        caller_id: &str,
    ) -> Result<RoomDeleteStats, CustomError> {
        let object_id = ObjectId::parse_str(room_id)
            .map_err(|_| CustomError::BadRequestError("Invalid room ID".into()))?;

        let room = self
            .rooms
            .find_one(doc! { "_id": object_id })
            .await
            .map_err(|e| CustomError::StoreUnavailable(format!("Failed to fetch room: {}", e)))?
            .ok_or_else(|| CustomError::NotFoundError("Room not found".into()))?;

        if room.owner_id != caller_id {
            return Err(CustomError::UnauthorizedError(
                "Only the room owner can delete a room".into(),
            ));
        }

        let papers: Vec<Paper> = with_read_retry(|| async move {
            self.papers
                .find(doc! { "room_id": room_id })
                .await?
                .try_collect()
                .await
        })
        .await?;
        for paper in &papers {
            if let Some(url) = paper.background_image.as_deref().filter(|u| !u.is_empty()) {
                release_asset(&self.blob, url).await;
            }
        }

        let mut stats = RoomDeleteStats::default();
        stats.papers = self
            .papers
            .delete_many(doc! { "room_id": room_id })
            .await
            .map_err(|e| CustomError::StoreUnavailable(format!("Failed to delete papers: {}", e)))?
            .deleted_count as i64;
        stats.files = self
            .files
            .delete_many(doc! { "room_id": room_id })
            .await
            .map_err(|e| CustomError::StoreUnavailable(format!("Failed to delete files: {}", e)))?
            .deleted_count as i64;
        stats.folders = self
            .folders
            .delete_many(doc! { "room_id": room_id })
            .await
            .map_err(|e| {
                CustomError::StoreUnavailable(format!("Failed to delete folders: {}", e))
            })?
            .deleted_count as i64;
        stats.members = self
            .members
            .delete_many(doc! { "room_id": room_id })
            .await
            .map_err(|e| {
                CustomError::StoreUnavailable(format!("Failed to delete members: {}", e))
            })?
            .deleted_count as i64;

        let result = self
            .rooms
            .delete_one(doc! { "_id": object_id })
            .await
            .map_err(|e| CustomError::StoreUnavailable(format!("Failed to delete room: {}", e)))?;
        if result.deleted_count == 0 {
            return Err(CustomError::NotFoundError("Room not found".into()));
        }

        log::info!(
            "Deleted room {} ({} folders, {} files, {} papers)",
            room_id,
            stats.folders,
            stats.files,
            stats.papers
        );
        Ok(stats)
    }
}
