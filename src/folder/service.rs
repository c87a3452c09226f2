use crate::database::db::DB_NAME;
use crate::database::retry::with_read_retry;
use crate::file::service::FileService;
use crate::folder::model::{DeletionStats, Folder, FolderStatus};
use crate::realtime::model::ServerMessage;
use crate::realtime::server::{FanoutServer, RoomEvent};
use crate::utils::error::CustomError;
use crate::utils::uploads::UploadService;
use actix::Addr;
use chrono::Utc;
use futures_util::TryStreamExt;
use mongodb::{
    Client, Collection,
    bson::{doc, oid::ObjectId},
};

pub struct FolderService {
    folders: Collection<Folder>,
    file_service: FileService,
    fanout: Addr<FanoutServer>,
}

impl FolderService {
    pub fn new(client: &Client, blob: Option<UploadService>, fanout: Addr<FanoutServer>) -> Self {
        let folders = client.database(DB_NAME).collection::<Folder>("folders");
        FolderService {
            folders,
            file_service: FileService::new(client, blob, fanout.clone()),
            fanout,
        }
    }

    pub async fn add_folder(
        &self,
        room_id: &str,
        sub_folder_id: Option<String>,
        name: &str,
        color: i32,
    ) -> Result<Folder, CustomError> {
        let folder = Folder {
            id: ObjectId::new(),
            room_id: room_id.to_string(),
            sub_folder_id,
            name: name.to_string(),
            color,
            status: FolderStatus::Active,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        self.folders
            .insert_one(&folder)
            .await
            .map_err(|e| CustomError::StoreUnavailable(format!("Failed to add folder: {}", e)))?;

        self.publish_folder_list(room_id).await;
        Ok(folder)
    }

    pub async fn folders_in_room(&self, room_id: &str) -> Result<Vec<Folder>, CustomError> {
        with_read_retry(|| async move {
            self.folders
                .find(doc! { "room_id": room_id })
                .sort(doc! { "name": 1 })
                .await?
                .try_collect()
                .await
        })
        .await
    }

    pub async fn rename_folder(&self, folder_id: &str, name: &str) -> Result<Folder, CustomError> {
        let object_id = ObjectId::parse_str(folder_id)
            .map_err(|_| CustomError::BadRequestError("Invalid folder ID".into()))?;

        let folder = self
            .folders
            .find_one_and_update(
                doc! { "_id": object_id },
                doc! { "$set": { "name": name, "updated_at": Utc::now().to_rfc3339() } },
            )
            .await
            .map_err(|e| CustomError::StoreUnavailable(format!("Failed to rename folder: {}", e)))?
            .ok_or_else(|| CustomError::NotFoundError("Folder not found".into()))?;

        self.publish_folder_list(&folder.room_id).await;
        Ok(folder)
    }

    /// Delete a folder and everything it transitively owns: sub-folders,
    /// files, papers, and their stored assets.
    ///
    /// The subtree is walked with an explicit worklist rather than recursion,
    /// and the root is marked `deleting` before the walk starts. A failure
    /// mid-walk surfaces as an error and the marker stays behind, so the
    /// operation can be retried; every step is idempotent, already-removed
    /// descendants simply no longer turn up.
    pub async fn delete_folder(&self, folder_id: &str) -> Result<DeletionStats, CustomError> {
        let object_id = ObjectId::parse_str(folder_id)
            .map_err(|_| CustomError::BadRequestError("Invalid folder ID".into()))?;

        let root = self
            .folders
            .find_one(doc! { "_id": object_id })
            .await
            .map_err(|e| CustomError::StoreUnavailable(format!("Failed to fetch folder: {}", e)))?
            .ok_or_else(|| CustomError::NotFoundError("Folder not found".into()))?;

        self.folders
            .update_one(
                doc! { "_id": object_id },
                doc! { "$set": { "status": "deleting" } },
            )
            .await
            .map_err(|e| {
                CustomError::StoreUnavailable(format!("Failed to mark folder deleting: {}", e))
            })?;

        // Collect the whole subtree breadth-first
        let mut subtree: Vec<Folder> = vec![root.clone()];
        let mut frontier: Vec<String> = vec![root.id.to_hex()];
        while let Some(parent_id) = frontier.pop() {
            let parent_key = parent_id.as_str();
            let children: Vec<Folder> = with_read_retry(|| async move {
                self.folders
                    .find(doc! { "sub_folder_id": parent_key })
                    .await?
                    .try_collect()
                    .await
            })
            .await?;

            for child in children {
                frontier.push(child.id.to_hex());
                subtree.push(child);
            }
        }

        log::info!(
            "Deleting folder {} with {} descendant folder(s)",
            root.id.to_hex(),
            subtree.len() - 1
        );

        // Delete children before parents so an interrupted walk never strands
        // an unreachable subtree
        let mut stats = DeletionStats::default();
        for folder in subtree.iter().rev() {
            let file_stats = self
                .file_service
                .delete_files_in_folder(&folder.id.to_hex())
                .await?;
            stats.files += file_stats.files;
            stats.papers += file_stats.papers;

            let result = self
                .folders
                .delete_one(doc! { "_id": folder.id })
                .await
                .map_err(|e| {
                    CustomError::StoreUnavailable(format!("Failed to delete folder: {}", e))
                })?;
            stats.folders += result.deleted_count as i64;
        }

        self.publish_folder_list(&root.room_id).await;
        Ok(stats)
    }

    async fn publish_folder_list(&self, room_id: &str) {
        match self.folders_in_room(room_id).await {
            Ok(folders) => {
                self.fanout.do_send(RoomEvent {
                    room_id: room_id.to_string(),
                    message: ServerMessage::FolderListUpdated {
                        room_id: room_id.to_string(),
                        folders,
                    },
                    exclude: None,
                });
            }
            Err(e) => log::warn!(
                "Failed to fetch folders of room {} for broadcast: {}",
                room_id,
                e
            ),
        }
    }
}
