use crate::database::db::DB_NAME;
use crate::database::retry::with_read_retry;
use crate::file::model::{File, FileDeleteStats};
use crate::paper::model::Paper;
use crate::realtime::model::ServerMessage;
use crate::realtime::server::{FanoutServer, RoomEvent};
use crate::utils::error::CustomError;
use crate::utils::uploads::{UploadService, release_asset};
use actix::Addr;
use chrono::Utc;
use futures_util::TryStreamExt;
use mongodb::{
    Client, Collection,
    bson::{doc, oid::ObjectId},
};

pub struct FileService {
    files: Collection<File>,
    papers: Collection<Paper>,
    blob: Option<UploadService>,
    fanout: Addr<FanoutServer>,
}

impl FileService {
    pub fn new(client: &Client, blob: Option<UploadService>, fanout: Addr<FanoutServer>) -> Self {
        let db = client.database(DB_NAME);
        FileService {
            files: db.collection::<File>("files"),
            papers: db.collection::<Paper>("papers"),
            blob,
            fanout,
        }
    }

    pub async fn add_file(
        &self,
        room_id: &str,
        sub_folder_id: Option<String>,
        name: &str,
    ) -> Result<File, CustomError> {
        let file = File {
            id: ObjectId::new(),
            room_id: room_id.to_string(),
            sub_folder_id,
            name: name.to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        self.files
            .insert_one(&file)
            .await
            .map_err(|e| CustomError::StoreUnavailable(format!("Failed to add file: {}", e)))?;

        self.publish_file_list(room_id).await;
        Ok(file)
    }

    pub async fn files_in_room(&self, room_id: &str) -> Result<Vec<File>, CustomError> {
        with_read_retry(|| async move {
            self.files
                .find(doc! { "room_id": room_id })
                .sort(doc! { "name": 1 })
                .await?
                .try_collect()
                .await
        })
        .await
    }

    pub async fn rename_file(&self, file_id: &str, name: &str) -> Result<File, CustomError> {
        let object_id = ObjectId::parse_str(file_id)
            .map_err(|_| CustomError::BadRequestError("Invalid file ID".into()))?;

        let file = self
            .files
            .find_one_and_update(
                doc! { "_id": object_id },
                doc! { "$set": { "name": name, "updated_at": Utc::now().to_rfc3339() } },
            )
            .await
            .map_err(|e| CustomError::StoreUnavailable(format!("Failed to rename file: {}", e)))?
            .ok_or_else(|| CustomError::NotFoundError("File not found".into()))?;

        self.publish_file_list(&file.room_id).await;
        Ok(file)
    }

    /// Delete a file together with every paper it owns.
    ///
    /// Stored background images get a best-effort destroy before the papers
    /// go; a blob failure is logged and the structural delete proceeds.
    pub async fn delete_file(&self, file_id: &str) -> Result<FileDeleteStats, CustomError> {
        let object_id = ObjectId::parse_str(file_id)
            .map_err(|_| CustomError::BadRequestError("Invalid file ID".into()))?;

        let file = self
            .files
            .find_one(doc! { "_id": object_id })
            .await
            .map_err(|e| CustomError::StoreUnavailable(format!("Failed to fetch file: {}", e)))?
            .ok_or_else(|| CustomError::NotFoundError("File not found".into()))?;

        let stats = self.delete_contents(&file).await?;

        self.publish_file_list(&file.room_id).await;
        Ok(stats)
    }

    /// Remove the papers and record of one file, accumulating counts.
    /// Absent records count zero instead of failing, so cascade retries
    /// converge.
    pub(crate) async fn delete_contents(&self, file: &File) -> Result<FileDeleteStats, CustomError> {
        let mut stats = FileDeleteStats::default();
        let file_hex = file.id.to_hex();
        let file_key = file_hex.as_str();

        let papers: Vec<Paper> = with_read_retry(|| async move {
            self.papers
                .find(doc! { "file_id": file_key })
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

        let paper_result = self
            .papers
            .delete_many(doc! { "file_id": file_hex.as_str() })
            .await
            .map_err(|e| {
                CustomError::StoreUnavailable(format!(
                    "Failed to delete papers of file {}: {}",
                    file_hex, e
                ))
            })?;
        stats.papers += paper_result.deleted_count as i64;

        let file_result = self
            .files
            .delete_one(doc! { "_id": file.id })
            .await
            .map_err(|e| CustomError::StoreUnavailable(format!("Failed to delete file: {}", e)))?;
        stats.files += file_result.deleted_count as i64;

        log::info!(
            "Deleted file {} ({} papers)",
            file_hex,
            stats.papers
        );
        Ok(stats)
    }

    /// Delete every file that lives directly in a folder. Used by the folder
    /// cascade; does not broadcast.
    pub(crate) async fn delete_files_in_folder(
        &self,
        folder_id: &str,
    ) -> Result<FileDeleteStats, CustomError> {
        let files: Vec<File> = with_read_retry(|| async move {
            self.files
                .find(doc! { "sub_folder_id": folder_id })
                .await?
                .try_collect()
                .await
        })
        .await?;

        let mut stats = FileDeleteStats::default();
        for file in &files {
            let file_stats = self.delete_contents(file).await?;
            stats.files += file_stats.files;
            stats.papers += file_stats.papers;
        }
        Ok(stats)
    }

    async fn publish_file_list(&self, room_id: &str) {
        match self.files_in_room(room_id).await {
            Ok(files) => {
                self.fanout.do_send(RoomEvent {
                    room_id: room_id.to_string(),
                    message: ServerMessage::FileListUpdated {
                        room_id: room_id.to_string(),
                        files,
                    },
                    exclude: None,
                });
            }
            Err(e) => log::warn!(
                "Failed to fetch files of room {} for broadcast: {}",
                room_id,
                e
            ),
        }
    }
}
