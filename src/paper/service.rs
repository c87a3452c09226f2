use crate::database::db::DB_NAME;
use crate::database::retry::with_read_retry;
use crate::paper::model::{Paper, PaperAttrs};
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
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Per-file locks serializing the read-modify-write sequence operations.
///
/// Two concurrent structural mutations on the same file would otherwise race
/// between the count/shift/insert steps and corrupt the page ordering.
#[derive(Clone, Default)]
pub struct FileLocks {
    inner: Arc<Mutex<HashMap<String, Arc<Mutex<()>>>>>,
}

impl FileLocks {
    pub async fn lock_for(&self, file_id: &str) -> Arc<Mutex<()>> {
        let mut map = self.inner.lock().await;
        map.entry(file_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

/// One relabel step of a swap: move the paper from its current page to a new
/// one. The current page doubles as an optimistic guard on the write.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct PageMove {
    pub paper_id: ObjectId,
    pub from_page: i32,
    pub to_page: i32,
}

/// Compute the relabel plan for moving the paper at `from_index` to
/// `to_index`: every paper strictly between them shifts one position toward
/// the vacated slot, and the moved paper takes the destination index.
pub(crate) fn swap_plan(
    papers: &[Paper],
    from_index: i32,
    to_index: i32,
) -> Result<Vec<PageMove>, CustomError> {
    let count = papers.len() as i32;
    if from_index < 0 || from_index >= count || to_index < 0 || to_index >= count {
        return Err(CustomError::ValidationError(format!(
            "swap indices ({}, {}) out of range 0..{}",
            from_index, to_index, count
        )));
    }

    let from_paper = papers
        .iter()
        .find(|p| p.page_number == from_index)
        .ok_or_else(|| {
            CustomError::NotFoundError(format!("No paper at page {}", from_index))
        })?;

    let mut plan = Vec::new();
    if from_index < to_index {
        // Moving forward: papers in (from, to] slide back by one
        for paper in papers {
            if paper.page_number > from_index && paper.page_number <= to_index {
                plan.push(PageMove {
                    paper_id: paper.id,
                    from_page: paper.page_number,
                    to_page: paper.page_number - 1,
                });
            }
        }
    } else {
        // Moving backward: papers in [to, from) slide forward by one
        for paper in papers {
            if paper.page_number >= to_index && paper.page_number < from_index {
                plan.push(PageMove {
                    paper_id: paper.id,
                    from_page: paper.page_number,
                    to_page: paper.page_number + 1,
                });
            }
        }
    }
    plan.push(PageMove {
        paper_id: from_paper.id,
        from_page: from_index,
        to_page: to_index,
    });

    Ok(plan)
}

pub struct PaperService {
    collection: Collection<Paper>,
    locks: FileLocks,
    blob: Option<UploadService>,
    fanout: Addr<FanoutServer>,
}

impl PaperService {
    pub fn new(client: &Client, blob: Option<UploadService>, fanout: Addr<FanoutServer>) -> Self {
        let collection = client.database(DB_NAME).collection::<Paper>("papers");
        PaperService {
            collection,
            locks: FileLocks::default(),
            blob,
            fanout,
        }
    }

    /// Papers of a file, in page order
    pub async fn papers_in_file(&self, file_id: &str) -> Result<Vec<Paper>, CustomError> {
        with_read_retry(|| async move {
            self.collection
                .find(doc! { "file_id": file_id })
                .sort(doc! { "page_number": 1 })
                .await?
                .try_collect()
                .await
        })
        .await
    }

    /// Papers of a room, in file/page order
    pub async fn papers_in_room(&self, room_id: &str) -> Result<Vec<Paper>, CustomError> {
        with_read_retry(|| async move {
            self.collection
                .find(doc! { "room_id": room_id })
                .sort(doc! { "file_id": 1, "page_number": 1 })
                .await?
                .try_collect()
                .await
        })
        .await
    }

    /// Append a paper at the end of a file's page sequence
    pub async fn add_paper(
        &self,
        room_id: &str,
        file_id: &str,
        attrs: PaperAttrs,
    ) -> Result<Paper, CustomError> {
        let lock = self.locks.lock_for(file_id).await;
        let _guard = lock.lock().await;

        let count = self.page_count(file_id).await?;
        let paper = self.build_paper(room_id, file_id, count, attrs);

        self.collection
            .insert_one(&paper)
            .await
            .map_err(|e| CustomError::StoreUnavailable(format!("Failed to add paper: {}", e)))?;

        self.publish_paper_list(room_id, file_id).await;
        Ok(paper)
    }

    /// Insert a paper at `position`, shifting every page at or after it up
    /// by one. Position must be within `0..=N` for a file of N pages.
    pub async fn insert_at(
        &self,
        room_id: &str,
        file_id: &str,
        position: i32,
        attrs: PaperAttrs,
    ) -> Result<Paper, CustomError> {
        let lock = self.locks.lock_for(file_id).await;
        let _guard = lock.lock().await;

        let count = self.page_count(file_id).await?;
        if position < 0 || position > count {
            return Err(CustomError::ValidationError(format!(
                "insert position {} out of range 0..={}",
                position, count
            )));
        }

        // Open the slot with a single batch update, then occupy it
        self.collection
            .update_many(
                doc! { "file_id": file_id, "page_number": { "$gte": position } },
                doc! { "$inc": { "page_number": 1 } },
            )
            .await
            .map_err(|e| {
                CustomError::StoreUnavailable(format!("Failed to renumber pages: {}", e))
            })?;

        let paper = self.build_paper(room_id, file_id, position, attrs);
        if let Err(e) = self.collection.insert_one(&paper).await {
            // Close the slot again so the sequence stays contiguous
            if let Err(undo) = self
                .collection
                .update_many(
                    doc! { "file_id": file_id, "page_number": { "$gt": position } },
                    doc! { "$inc": { "page_number": -1 } },
                )
                .await
            {
                log::error!(
                    "Failed to restore page numbers for file {} after aborted insert: {}",
                    file_id,
                    undo
                );
            }
            return Err(CustomError::StoreUnavailable(format!(
                "Failed to insert paper: {}",
                e
            )));
        }

        self.publish_paper_list(room_id, file_id).await;
        Ok(paper)
    }

    /// Move the paper at `from_index` to `to_index`, sliding the papers in
    /// between one position toward the vacated slot.
    /// Returns the number of papers relabeled.
    pub async fn swap(
        &self,
        file_id: &str,
        from_index: i32,
        to_index: i32,
    ) -> Result<usize, CustomError> {
        if from_index == to_index {
            return Ok(0);
        }

        let lock = self.locks.lock_for(file_id).await;
        let _guard = lock.lock().await;

        let papers = self.papers_in_file(file_id).await?;
        let plan = swap_plan(&papers, from_index, to_index)?;

        // Each write is conditioned on the page number from the snapshot.
        // The per-file lock serializes this process; the guard catches a
        // second server instance mutating the same file underneath us.
        for step in &plan {
            let result = self
                .collection
                .update_one(
                    doc! { "_id": step.paper_id, "page_number": step.from_page },
                    doc! { "$set": { "page_number": step.to_page } },
                )
                .await
                .map_err(|e| {
                    CustomError::StoreUnavailable(format!(
                        "Failed to update paper positions: {}",
                        e
                    ))
                })?;
            if result.matched_count == 0 {
                return Err(CustomError::ConcurrencyConflict(format!(
                    "Paper {} moved while swapping; retry the operation",
                    step.paper_id.to_hex()
                )));
            }
        }

        if let Some(first) = papers.first() {
            let room_id = first.room_id.clone();
            self.publish_paper_list(&room_id, file_id).await;
        }
        Ok(plan.len())
    }

    /// Delete a paper, release its background asset, and close the gap by
    /// decrementing every higher page number.
    /// Returns the deleted paper's page number.
    pub async fn delete_at(&self, paper_id: &str) -> Result<i32, CustomError> {
        let object_id = ObjectId::parse_str(paper_id)
            .map_err(|_| CustomError::BadRequestError("Invalid paper ID".into()))?;

        // Resolve the owning file first so the right lock can be taken
        let paper = self
            .collection
            .find_one(doc! { "_id": object_id })
            .await
            .map_err(|e| CustomError::StoreUnavailable(format!("Failed to fetch paper: {}", e)))?
            .ok_or_else(|| CustomError::NotFoundError("Paper not found".into()))?;

        let lock = self.locks.lock_for(&paper.file_id).await;
        let _guard = lock.lock().await;

        // Best-effort asset release; never blocks the structural delete
        if let Some(url) = paper.background_image.as_deref().filter(|u| !u.is_empty()) {
            crate::utils::uploads::release_asset(&self.blob, url).await;
        }

        let result = self
            .collection
            .delete_one(doc! { "_id": object_id })
            .await
            .map_err(|e| CustomError::StoreUnavailable(format!("Failed to delete paper: {}", e)))?;
        if result.deleted_count == 0 {
            return Err(CustomError::NotFoundError("Paper not found".into()));
        }

        self.collection
            .update_many(
                doc! { "file_id": paper.file_id.as_str(), "page_number": { "$gt": paper.page_number } },
                doc! { "$inc": { "page_number": -1 } },
            )
            .await
            .map_err(|e| {
                CustomError::StoreUnavailable(format!("Failed to renumber pages: {}", e))
            })?;

        self.publish_paper_list(&paper.room_id, &paper.file_id).await;
        Ok(paper.page_number)
    }

    /// Replace a paper's stroke list. Last write wins.
    pub async fn replace_drawing_data(
        &self,
        paper_id: &str,
        drawing_data: Vec<crate::paper::model::DrawingPoint>,
    ) -> Result<Paper, CustomError> {
        let object_id = ObjectId::parse_str(paper_id)
            .map_err(|_| CustomError::BadRequestError("Invalid paper ID".into()))?;

        let points = mongodb::bson::to_bson(&drawing_data).map_err(|e| {
            CustomError::InternalServerError(format!("Failed to encode drawing data: {}", e))
        })?;

        let paper = self
            .collection
            .find_one_and_update(
                doc! { "_id": object_id },
                doc! { "$set": {
                    "drawing_data": points,
                    "updated_at": Utc::now().to_rfc3339(),
                } },
            )
            .await
            .map_err(|e| CustomError::StoreUnavailable(format!("Failed to update paper: {}", e)))?
            .ok_or_else(|| CustomError::NotFoundError("Paper not found".into()))?;

        self.publish_paper_list(&paper.room_id, &paper.file_id).await;
        Ok(paper)
    }

    /// Replace a paper's text annotations. Last write wins.
    pub async fn replace_text_data(
        &self,
        paper_id: &str,
        text_data: Vec<crate::paper::model::TextAnnotation>,
    ) -> Result<Paper, CustomError> {
        let object_id = ObjectId::parse_str(paper_id)
            .map_err(|_| CustomError::BadRequestError("Invalid paper ID".into()))?;

        let annotations = mongodb::bson::to_bson(&text_data).map_err(|e| {
            CustomError::InternalServerError(format!("Failed to encode text data: {}", e))
        })?;

        let paper = self
            .collection
            .find_one_and_update(
                doc! { "_id": object_id },
                doc! { "$set": {
                    "text_data": annotations,
                    "updated_at": Utc::now().to_rfc3339(),
                } },
            )
            .await
            .map_err(|e| CustomError::StoreUnavailable(format!("Failed to update paper: {}", e)))?
            .ok_or_else(|| CustomError::NotFoundError("Paper not found".into()))?;

        self.publish_paper_list(&paper.room_id, &paper.file_id).await;
        Ok(paper)
    }

    async fn page_count(&self, file_id: &str) -> Result<i32, CustomError> {
        let count = self
            .collection
            .count_documents(doc! { "file_id": file_id })
            .await
            .map_err(|e| CustomError::StoreUnavailable(format!("Failed to count pages: {}", e)))?;
        Ok(count as i32)
    }

    fn build_paper(
        &self,
        room_id: &str,
        file_id: &str,
        page_number: i32,
        attrs: PaperAttrs,
    ) -> Paper {
        Paper {
            id: ObjectId::new(),
            room_id: room_id.to_string(),
            file_id: file_id.to_string(),
            page_number,
            width: attrs.width,
            height: attrs.height,
            background_image: attrs.background_image,
            drawing_data: Vec::new(),
            text_data: Vec::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    /// Push the file's full ordered paper list to its room channel
    async fn publish_paper_list(&self, room_id: &str, file_id: &str) {
        match self.papers_in_file(file_id).await {
            Ok(papers) => {
                self.fanout.do_send(RoomEvent {
                    room_id: room_id.to_string(),
                    message: ServerMessage::PaperListUpdated {
                        room_id: room_id.to_string(),
                        papers,
                    },
                    exclude: None,
                });
            }
            Err(e) => log::warn!(
                "Failed to fetch papers of file {} for broadcast: {}",
                file_id,
                e
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paper::model::Paper;
    use std::collections::{BTreeSet, HashMap};

    fn paper(page_number: i32) -> Paper {
        Paper {
            id: ObjectId::new(),
            room_id: "room1".to_string(),
            file_id: "file1".to_string(),
            page_number,
            width: 210.0,
            height: 297.0,
            background_image: None,
            drawing_data: Vec::new(),
            text_data: Vec::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    /// Apply a relabel plan to a set of papers and return ids in page order.
    /// Checks that every step's guard matches the snapshot it was planned from.
    fn apply(papers: &[Paper], plan: &[PageMove]) -> Vec<(ObjectId, i32)> {
        let mut pages: HashMap<ObjectId, i32> =
            papers.iter().map(|p| (p.id, p.page_number)).collect();
        for step in plan {
            assert_eq!(pages.get(&step.paper_id), Some(&step.from_page));
            pages.insert(step.paper_id, step.to_page);
        }
        let mut result: Vec<(ObjectId, i32)> = pages.into_iter().collect();
        result.sort_by_key(|(_, page)| *page);
        result
    }

    #[test]
    fn forward_move_slides_intermediates_back() {
        let papers: Vec<Paper> = (0..4).map(paper).collect();
        let plan = swap_plan(&papers, 0, 3).expect("valid swap");

        let result = apply(&papers, &plan);
        let ids: Vec<ObjectId> = result.iter().map(|(id, _)| *id).collect();
        assert_eq!(
            ids,
            vec![papers[1].id, papers[2].id, papers[3].id, papers[0].id]
        );

        let pages: BTreeSet<i32> = result.iter().map(|(_, page)| *page).collect();
        assert_eq!(pages, BTreeSet::from([0, 1, 2, 3]));
    }

    #[test]
    fn backward_move_slides_intermediates_forward() {
        let papers: Vec<Paper> = (0..4).map(paper).collect();
        let plan = swap_plan(&papers, 3, 1).expect("valid swap");

        let result = apply(&papers, &plan);
        let ids: Vec<ObjectId> = result.iter().map(|(id, _)| *id).collect();
        assert_eq!(
            ids,
            vec![papers[0].id, papers[3].id, papers[1].id, papers[2].id]
        );
    }

    #[test]
    fn adjacent_swap_touches_exactly_two_papers() {
        let papers: Vec<Paper> = (0..3).map(paper).collect();
        let plan = swap_plan(&papers, 1, 2).expect("valid swap");
        assert_eq!(plan.len(), 2);

        let result = apply(&papers, &plan);
        let ids: Vec<ObjectId> = result.iter().map(|(id, _)| *id).collect();
        assert_eq!(ids, vec![papers[0].id, papers[2].id, papers[1].id]);
    }

    #[test]
    fn unaffected_papers_keep_their_relative_order() {
        let papers: Vec<Paper> = (0..6).map(paper).collect();
        let plan = swap_plan(&papers, 1, 4).expect("valid swap");

        let result = apply(&papers, &plan);
        let ids: Vec<ObjectId> = result.iter().map(|(id, _)| *id).collect();
        // Papers 0 and 5 never move; 2, 3, 4 slide back by one
        assert_eq!(
            ids,
            vec![
                papers[0].id,
                papers[2].id,
                papers[3].id,
                papers[4].id,
                papers[1].id,
                papers[5].id
            ]
        );
    }

    #[test]
    fn rejects_out_of_range_indices() {
        let papers: Vec<Paper> = (0..3).map(paper).collect();
        assert!(matches!(
            swap_plan(&papers, 0, 3),
            Err(CustomError::ValidationError(..))
        ));
        assert!(matches!(
            swap_plan(&papers, -1, 1),
            Err(CustomError::ValidationError(..))
        ));
    }

    #[test]
    fn missing_resident_paper_is_not_found() {
        // Gapped sequence: no paper carries page 1
        let papers = vec![paper(0), paper(2), paper(3)];
        assert!(matches!(
            swap_plan(&papers, 1, 2),
            Err(CustomError::NotFoundError(..))
        ));
    }

    #[test]
    fn insert_then_swap_scenario_end_to_end() {
        // File starts at pages [0, 1, 2] with ids [p0, p1, p2]; inserting at 1
        // yields [p0, new, p1, p2], and moving page 0 to 3 must end at
        // [new, p1, p2, p0] with pages {0, 1, 2, 3}.
        let p0 = paper(0);
        let mut p1 = paper(1);
        let mut p2 = paper(2);
        let new = paper(1);
        p1.page_number = 2;
        p2.page_number = 3;
        let papers = vec![p0.clone(), new.clone(), p1.clone(), p2.clone()];

        let plan = swap_plan(&papers, 0, 3).expect("valid swap");
        let result = apply(&papers, &plan);
        let ids: Vec<ObjectId> = result.iter().map(|(id, _)| *id).collect();
        assert_eq!(ids, vec![new.id, p1.id, p2.id, p0.id]);

        let pages: Vec<i32> = result.iter().map(|(_, page)| *page).collect();
        assert_eq!(pages, vec![0, 1, 2, 3]);
    }

    #[actix_web::test]
    async fn file_locks_serialize_same_file_and_not_others() {
        let locks = FileLocks::default();

        let lock_a = locks.lock_for("file1").await;
        let lock_b = locks.lock_for("file1").await;
        let lock_c = locks.lock_for("file2").await;

        let guard = lock_a.lock().await;
        // Same file: second take must not be available while held
        assert!(lock_b.try_lock().is_err());
        // Different file: independent
        assert!(lock_c.try_lock().is_ok());
        drop(guard);
        assert!(lock_b.try_lock().is_ok());
    }
}
