use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Offset {
    pub x: f64,
    pub y: f64,
}

/// One freehand stroke on a paper
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DrawingPoint {
    pub id: i64,
    pub offsets: Vec<Offset>,
    pub color: i32,
    pub width: f64,
    pub tool: String,
}

/// One text annotation placed on a paper
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TextAnnotation {
    pub id: i64,
    pub x: f64,
    pub y: f64,
    pub content: String,
    pub font_size: f64,
    pub color: i32,
}

/// One page of a file. `page_number` values within a file are always the
/// contiguous range `0..N`; the sequence operations in the service keep it so.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Paper {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub room_id: String,
    pub file_id: String,
    pub page_number: i32,
    pub width: f64,
    pub height: f64,
    pub background_image: Option<String>,
    pub drawing_data: Vec<DrawingPoint>,
    pub text_data: Vec<TextAnnotation>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Attributes supplied when creating a paper; the service assigns the id,
/// the page number, and the timestamps.
#[derive(Debug, Clone, Deserialize)]
pub struct PaperAttrs {
    pub width: f64,
    pub height: f64,
    pub background_image: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AddPaperRequest {
    pub room_id: String,
    pub file_id: String,
    pub width: f64,
    pub height: f64,
    #[serde(rename = "image")]
    pub background_image: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct InsertPaperRequest {
    pub room_id: String,
    pub file_id: String,
    pub insert_position: i32,
    pub width: f64,
    pub height: f64,
    #[serde(rename = "image")]
    pub background_image: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SwapPaperRequest {
    pub file_id: String,
    pub from_index: i32,
    pub to_index: i32,
}

#[derive(Debug, Deserialize)]
pub struct DeletePaperRequest {
    pub paper_id: String,
}

#[derive(Debug, Deserialize)]
pub struct PaperListQuery {
    pub room_id: Option<String>,
    pub file_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ReplaceDrawingRequest {
    pub paper_id: String,
    pub drawing_data: Vec<DrawingPoint>,
}

#[derive(Debug, Deserialize)]
pub struct ReplaceTextRequest {
    pub paper_id: String,
    pub text_data: Vec<TextAnnotation>,
}
