use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::file::model::File;
use crate::folder::model::Folder;
use crate::member::model::RoomMember;
use crate::paper::model::Paper;

/// Message from a client over the websocket.
///
/// Live-editing variants carry an opaque `payload` chosen by the client
/// application; the server relays it without interpreting or merging it.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Subscribe to a room channel
    JoinRoom { room_id: String },
    /// Unsubscribe from a room channel
    LeaveRoom { room_id: String },
    /// Open a file: subscribes the file channel and registers presence
    JoinFile { file_id: String },
    /// Close a file
    LeaveFile { file_id: String },
    Drawing { file_id: String, payload: Value },
    Eraser { file_id: String, payload: Value },
    Text { file_id: String, payload: Value },
    Updatetext { file_id: String, payload: Value },
    Deletetext { file_id: String, payload: Value },
    CanvasState { file_id: String, payload: Value },
    RequestCanvasState { file_id: String },
    Undo { file_id: String, payload: Value },
    Redo { file_id: String, payload: Value },
    /// Ping to keep connection alive
    Ping,
}

/// Message to a client.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Connection established
    Connected { conn_id: String, user_id: String },
    RoomJoined { room_id: String },
    RoomLeft { room_id: String },
    FileJoined { file_id: String },
    FileLeft { file_id: String },
    /// Structural change: the room's folder tree was modified
    FolderListUpdated {
        #[serde(rename = "roomID")]
        room_id: String,
        folders: Vec<Folder>,
    },
    /// Structural change: the room's file set was modified
    FileListUpdated {
        #[serde(rename = "roomID")]
        room_id: String,
        files: Vec<File>,
    },
    /// Structural change: a file's page sequence was modified
    PaperListUpdated {
        #[serde(rename = "roomID")]
        room_id: String,
        papers: Vec<Paper>,
    },
    /// Structural change: the room's membership was modified
    RoomMembersUpdated {
        #[serde(rename = "roomID")]
        room_id: String,
        members: Vec<RoomMember>,
    },
    /// Presence change: who is currently viewing a file
    FileUsersUpdate { users: Vec<String> },
    Drawing { file_id: String, payload: Value },
    Eraser { file_id: String, payload: Value },
    Text { file_id: String, payload: Value },
    Updatetext { file_id: String, payload: Value },
    Deletetext { file_id: String, payload: Value },
    CanvasState { file_id: String, payload: Value },
    RequestCanvasState { file_id: String },
    Undo { file_id: String, payload: Value },
    Redo { file_id: String, payload: Value },
    /// Error message
    Error { message: String },
    /// Pong response
    Pong,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn client_live_topics_use_wire_names() {
        let msg: ClientMessage = serde_json::from_value(json!({
            "type": "updatetext",
            "file_id": "f1",
            "payload": {"id": 3, "content": "hi"},
        }))
        .expect("updatetext should parse");
        assert!(matches!(msg, ClientMessage::Updatetext { .. }));

        let msg: ClientMessage = serde_json::from_value(json!({
            "type": "request_canvas_state",
            "file_id": "f1",
        }))
        .expect("request_canvas_state should parse");
        assert!(matches!(msg, ClientMessage::RequestCanvasState { .. }));
    }

    #[test]
    fn structural_topics_serialize_with_room_id_key() {
        let msg = ServerMessage::PaperListUpdated {
            room_id: "r1".to_string(),
            papers: vec![],
        };
        let value = serde_json::to_value(&msg).expect("serialize");
        assert_eq!(value["type"], "paper_list_updated");
        assert_eq!(value["roomID"], "r1");
        assert!(value["papers"].is_array());
    }

    #[test]
    fn presence_topic_carries_users() {
        let msg = ServerMessage::FileUsersUpdate {
            users: vec!["u1".to_string(), "u2".to_string()],
        };
        let value = serde_json::to_value(&msg).expect("serialize");
        assert_eq!(value["type"], "file_users_update");
        assert_eq!(value["users"], json!(["u1", "u2"]));
    }

    #[test]
    fn relayed_payload_survives_verbatim() {
        let payload = json!({"points": [[0, 1], [2, 3]], "tool": "pen"});
        let msg = ServerMessage::Drawing {
            file_id: "f1".to_string(),
            payload: payload.clone(),
        };
        let value = serde_json::to_value(&msg).expect("serialize");
        assert_eq!(value["type"], "drawing");
        assert_eq!(value["payload"], payload);
    }
}
