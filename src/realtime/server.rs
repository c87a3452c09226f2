use crate::realtime::model::ServerMessage;
use crate::realtime::presence::PresenceRegistry;
use actix::prelude::*;
use std::collections::{HashMap, HashSet};

/// Message sent to the fanout server to connect a session
#[derive(Message)]
#[rtype(result = "()")]
pub struct Connect {
    pub conn_id: String,
    pub user_id: String,
    pub addr: Recipient<WsMessage>,
}

/// Message sent to the fanout server when a session disconnects
#[derive(Message)]
#[rtype(result = "()")]
pub struct Disconnect {
    pub conn_id: String,
}

/// Subscribe a connection to a room channel
#[derive(Message)]
#[rtype(result = "()")]
pub struct JoinRoom {
    pub conn_id: String,
    pub room_id: String,
}

#[derive(Message)]
#[rtype(result = "()")]
pub struct LeaveRoom {
    pub conn_id: String,
    pub room_id: String,
}

/// Subscribe a connection to a file channel and register its presence
#[derive(Message)]
#[rtype(result = "()")]
pub struct JoinFile {
    pub conn_id: String,
    pub file_id: String,
}

#[derive(Message)]
#[rtype(result = "()")]
pub struct LeaveFile {
    pub conn_id: String,
    pub file_id: String,
}

/// Broadcast an event to every subscriber of a room channel
#[derive(Message)]
#[rtype(result = "()")]
pub struct RoomEvent {
    pub room_id: String,
    pub message: ServerMessage,
    pub exclude: Option<String>,
}

/// Broadcast an event to every subscriber of a file channel
#[derive(Message)]
#[rtype(result = "()")]
pub struct FileEvent {
    pub file_id: String,
    pub message: ServerMessage,
    pub exclude: Option<String>,
}

/// Snapshot of the connections currently viewing a file
#[derive(Message)]
#[rtype(result = "Vec<String>")]
pub struct ListViewers {
    pub file_id: String,
}

/// WebSocket message wrapper
#[derive(Message)]
#[rtype(result = "()")]
pub struct WsMessage(pub String);

/// Session info
#[derive(Clone)]
pub struct SessionInfo {
    pub user_id: String,
    pub addr: Recipient<WsMessage>,
}

/// Fanout server actor. Single owner of channel membership and presence,
/// so every join/leave/broadcast is serialized through its mailbox.
pub struct FanoutServer {
    /// Map of conn_id -> session info
    sessions: HashMap<String, SessionInfo>,
    /// Map of room_id -> set of conn_ids subscribed to the room channel
    rooms: HashMap<String, HashSet<String>>,
    /// Map of file_id -> set of conn_ids subscribed to the file channel
    files: HashMap<String, HashSet<String>>,
    /// Who is viewing which file
    presence: PresenceRegistry,
}

impl FanoutServer {
    pub fn new() -> Self {
        FanoutServer {
            sessions: HashMap::new(),
            rooms: HashMap::new(),
            files: HashMap::new(),
            presence: PresenceRegistry::new(),
        }
    }

    /// Send a message to all sessions subscribed to a room channel
    fn send_to_room(&self, room_id: &str, message: &ServerMessage, skip_conn: Option<&str>) {
        if let Some(conns) = self.rooms.get(room_id) {
            let msg_json = serde_json::to_string(message).unwrap_or_default();
            for conn_id in conns {
                if skip_conn.map_or(true, |s| s != conn_id) {
                    if let Some(session) = self.sessions.get(conn_id) {
                        let _ = session.addr.do_send(WsMessage(msg_json.clone()));
                    }
                }
            }
        }
    }

    /// Send a message to all sessions subscribed to a file channel
    fn send_to_file(&self, file_id: &str, message: &ServerMessage, skip_conn: Option<&str>) {
        if let Some(conns) = self.files.get(file_id) {
            let msg_json = serde_json::to_string(message).unwrap_or_default();
            for conn_id in conns {
                if skip_conn.map_or(true, |s| s != conn_id) {
                    if let Some(session) = self.sessions.get(conn_id) {
                        let _ = session.addr.do_send(WsMessage(msg_json.clone()));
                    }
                }
            }
        }
    }

    /// Send a message to a specific session
    fn send_to_conn(&self, conn_id: &str, message: &ServerMessage) {
        if let Some(session) = self.sessions.get(conn_id) {
            let msg_json = serde_json::to_string(message).unwrap_or_default();
            let _ = session.addr.do_send(WsMessage(msg_json));
        }
    }

    /// Resolve the viewer connections of a file to user ids, deduplicated
    fn viewer_users(&self, file_id: &str) -> Vec<String> {
        let mut users: Vec<String> = self
            .presence
            .viewers(file_id)
            .iter()
            .filter_map(|conn_id| self.sessions.get(conn_id))
            .map(|s| s.user_id.clone())
            .collect();
        users.sort();
        users.dedup();
        users
    }

    /// Push the current viewer list of a file to its channel
    fn broadcast_file_users(&self, file_id: &str) {
        let users = self.viewer_users(file_id);
        self.send_to_file(file_id, &ServerMessage::FileUsersUpdate { users }, None);
    }
}

impl Default for FanoutServer {
    fn default() -> Self {
        Self::new()
    }
}

impl Actor for FanoutServer {
    type Context = Context<Self>;
}

impl Handler<Connect> for FanoutServer {
    type Result = ();

    fn handle(&mut self, msg: Connect, _: &mut Context<Self>) {
        log::info!("User {} connected with conn {}", msg.user_id, msg.conn_id);

        self.sessions.insert(
            msg.conn_id.clone(),
            SessionInfo {
                user_id: msg.user_id.clone(),
                addr: msg.addr,
            },
        );

        self.send_to_conn(
            &msg.conn_id,
            &ServerMessage::Connected {
                conn_id: msg.conn_id.clone(),
                user_id: msg.user_id,
            },
        );
    }
}

impl Handler<Disconnect> for FanoutServer {
    type Result = ();

    fn handle(&mut self, msg: Disconnect, _: &mut Context<Self>) {
        log::info!("Conn {} disconnected", msg.conn_id);

        // Drop the session first so re-broadcast viewer lists exclude it
        self.sessions.remove(&msg.conn_id);

        for conns in self.rooms.values_mut() {
            conns.remove(&msg.conn_id);
        }
        self.rooms.retain(|_, conns| !conns.is_empty());

        // The inverted index hands back only the files this connection joined
        let affected = self.presence.drop_connection(&msg.conn_id);
        for file_id in affected {
            if let Some(conns) = self.files.get_mut(&file_id) {
                conns.remove(&msg.conn_id);
            }
            if self.files.get(&file_id).is_some_and(|c| c.is_empty()) {
                self.files.remove(&file_id);
            }
            self.broadcast_file_users(&file_id);
        }
    }
}

impl Handler<JoinRoom> for FanoutServer {
    type Result = ();

    fn handle(&mut self, msg: JoinRoom, _: &mut Context<Self>) {
        log::info!("Conn {} joining room {}", msg.conn_id, msg.room_id);

        self.rooms
            .entry(msg.room_id.clone())
            .or_default()
            .insert(msg.conn_id.clone());

        self.send_to_conn(
            &msg.conn_id,
            &ServerMessage::RoomJoined {
                room_id: msg.room_id,
            },
        );
    }
}

impl Handler<LeaveRoom> for FanoutServer {
    type Result = ();

    fn handle(&mut self, msg: LeaveRoom, _: &mut Context<Self>) {
        if let Some(conns) = self.rooms.get_mut(&msg.room_id) {
            conns.remove(&msg.conn_id);
        }
        if self.rooms.get(&msg.room_id).is_some_and(|c| c.is_empty()) {
            self.rooms.remove(&msg.room_id);
        }

        self.send_to_conn(
            &msg.conn_id,
            &ServerMessage::RoomLeft {
                room_id: msg.room_id,
            },
        );
    }
}

impl Handler<JoinFile> for FanoutServer {
    type Result = ();

    fn handle(&mut self, msg: JoinFile, _: &mut Context<Self>) {
        log::info!("Conn {} joining file {}", msg.conn_id, msg.file_id);

        self.files
            .entry(msg.file_id.clone())
            .or_default()
            .insert(msg.conn_id.clone());
        self.presence.join(&msg.file_id, &msg.conn_id);

        self.send_to_conn(
            &msg.conn_id,
            &ServerMessage::FileJoined {
                file_id: msg.file_id.clone(),
            },
        );
        self.broadcast_file_users(&msg.file_id);
    }
}

impl Handler<LeaveFile> for FanoutServer {
    type Result = ();

    fn handle(&mut self, msg: LeaveFile, _: &mut Context<Self>) {
        if let Some(conns) = self.files.get_mut(&msg.file_id) {
            conns.remove(&msg.conn_id);
        }
        if self.files.get(&msg.file_id).is_some_and(|c| c.is_empty()) {
            self.files.remove(&msg.file_id);
        }
        self.presence.leave(&msg.file_id, &msg.conn_id);

        self.send_to_conn(
            &msg.conn_id,
            &ServerMessage::FileLeft {
                file_id: msg.file_id.clone(),
            },
        );
        self.broadcast_file_users(&msg.file_id);
    }
}

impl Handler<RoomEvent> for FanoutServer {
    type Result = ();

    fn handle(&mut self, msg: RoomEvent, _: &mut Context<Self>) {
        self.send_to_room(&msg.room_id, &msg.message, msg.exclude.as_deref());
    }
}

impl Handler<FileEvent> for FanoutServer {
    type Result = ();

    fn handle(&mut self, msg: FileEvent, _: &mut Context<Self>) {
        self.send_to_file(&msg.file_id, &msg.message, msg.exclude.as_deref());
    }
}

impl Handler<ListViewers> for FanoutServer {
    type Result = MessageResult<ListViewers>;

    fn handle(&mut self, msg: ListViewers, _: &mut Context<Self>) -> Self::Result {
        MessageResult(self.presence.viewers(&msg.file_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    struct Collector {
        received: Arc<Mutex<Vec<String>>>,
    }

    impl Actor for Collector {
        type Context = Context<Self>;
    }

    impl Handler<WsMessage> for Collector {
        type Result = ();

        fn handle(&mut self, msg: WsMessage, _: &mut Context<Self>) {
            self.received.lock().unwrap().push(msg.0);
        }
    }

    fn spawn_collector() -> (Recipient<WsMessage>, Arc<Mutex<Vec<String>>>) {
        let received = Arc::new(Mutex::new(Vec::new()));
        let addr = Collector {
            received: received.clone(),
        }
        .start();
        (addr.recipient(), received)
    }

    fn topics(received: &Arc<Mutex<Vec<String>>>) -> Vec<String> {
        received
            .lock()
            .unwrap()
            .iter()
            .filter_map(|raw| {
                serde_json::from_str::<serde_json::Value>(raw)
                    .ok()
                    .and_then(|v| v["type"].as_str().map(|s| s.to_string()))
            })
            .collect()
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    #[actix_web::test]
    async fn presence_follows_join_and_disconnect() {
        let server = FanoutServer::new().start();
        let (addr_a, _) = spawn_collector();
        let (addr_b, _) = spawn_collector();

        server.do_send(Connect {
            conn_id: "a".into(),
            user_id: "alice".into(),
            addr: addr_a,
        });
        server.do_send(Connect {
            conn_id: "b".into(),
            user_id: "bob".into(),
            addr: addr_b,
        });
        server.do_send(JoinFile {
            conn_id: "a".into(),
            file_id: "file1".into(),
        });
        server.do_send(JoinFile {
            conn_id: "b".into(),
            file_id: "file1".into(),
        });

        let mut viewers = server
            .send(ListViewers {
                file_id: "file1".into(),
            })
            .await
            .unwrap();
        viewers.sort();
        assert_eq!(viewers, vec!["a".to_string(), "b".to_string()]);

        server.do_send(Disconnect {
            conn_id: "a".into(),
        });

        let viewers = server
            .send(ListViewers {
                file_id: "file1".into(),
            })
            .await
            .unwrap();
        assert_eq!(viewers, vec!["b".to_string()]);
    }

    #[actix_web::test]
    async fn room_broadcast_skips_the_excluded_origin() {
        let server = FanoutServer::new().start();
        let (addr_a, recv_a) = spawn_collector();
        let (addr_b, recv_b) = spawn_collector();

        server.do_send(Connect {
            conn_id: "a".into(),
            user_id: "alice".into(),
            addr: addr_a,
        });
        server.do_send(Connect {
            conn_id: "b".into(),
            user_id: "bob".into(),
            addr: addr_b,
        });
        server.do_send(JoinRoom {
            conn_id: "a".into(),
            room_id: "room1".into(),
        });
        server.do_send(JoinRoom {
            conn_id: "b".into(),
            room_id: "room1".into(),
        });

        server.do_send(RoomEvent {
            room_id: "room1".into(),
            message: ServerMessage::PaperListUpdated {
                room_id: "room1".into(),
                papers: vec![],
            },
            exclude: Some("a".into()),
        });
        settle().await;

        assert!(!topics(&recv_a).contains(&"paper_list_updated".to_string()));
        assert!(topics(&recv_b).contains(&"paper_list_updated".to_string()));
    }

    #[actix_web::test]
    async fn live_event_relays_payload_to_file_channel() {
        let server = FanoutServer::new().start();
        let (addr_a, _recv_a) = spawn_collector();
        let (addr_b, recv_b) = spawn_collector();

        server.do_send(Connect {
            conn_id: "a".into(),
            user_id: "alice".into(),
            addr: addr_a,
        });
        server.do_send(Connect {
            conn_id: "b".into(),
            user_id: "bob".into(),
            addr: addr_b,
        });
        server.do_send(JoinFile {
            conn_id: "a".into(),
            file_id: "file1".into(),
        });
        server.do_send(JoinFile {
            conn_id: "b".into(),
            file_id: "file1".into(),
        });

        let payload = json!({"stroke": [1, 2, 3]});
        server.do_send(FileEvent {
            file_id: "file1".into(),
            message: ServerMessage::Drawing {
                file_id: "file1".into(),
                payload: payload.clone(),
            },
            exclude: Some("a".into()),
        });
        settle().await;

        let raw = recv_b.lock().unwrap().clone();
        let drawing = raw
            .iter()
            .filter_map(|m| serde_json::from_str::<serde_json::Value>(m).ok())
            .find(|v| v["type"] == "drawing")
            .expect("drawing event should reach the other viewer");
        assert_eq!(drawing["payload"], payload);
    }

    #[actix_web::test]
    async fn file_users_update_follows_presence_changes() {
        let server = FanoutServer::new().start();
        let (addr_a, recv_a) = spawn_collector();
        let (addr_b, _recv_b) = spawn_collector();

        server.do_send(Connect {
            conn_id: "a".into(),
            user_id: "alice".into(),
            addr: addr_a,
        });
        server.do_send(Connect {
            conn_id: "b".into(),
            user_id: "bob".into(),
            addr: addr_b,
        });
        server.do_send(JoinFile {
            conn_id: "a".into(),
            file_id: "file1".into(),
        });
        server.do_send(JoinFile {
            conn_id: "b".into(),
            file_id: "file1".into(),
        });
        server.do_send(Disconnect {
            conn_id: "b".into(),
        });
        settle().await;

        let raw = recv_a.lock().unwrap().clone();
        let updates: Vec<Vec<String>> = raw
            .iter()
            .filter_map(|m| serde_json::from_str::<serde_json::Value>(m).ok())
            .filter(|v| v["type"] == "file_users_update")
            .map(|v| {
                v["users"]
                    .as_array()
                    .map(|a| {
                        a.iter()
                            .filter_map(|u| u.as_str().map(|s| s.to_string()))
                            .collect()
                    })
                    .unwrap_or_default()
            })
            .collect();

        // Last update after bob's disconnect lists alice alone
        assert_eq!(updates.last(), Some(&vec!["alice".to_string()]));
        // And at some point both were listed
        assert!(updates.contains(&vec!["alice".to_string(), "bob".to_string()]));
    }
}
