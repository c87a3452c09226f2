use actix::{Actor, ActorContext, Addr, AsyncContext, Handler, Running, StreamHandler};
use actix_web_actors::ws;
use std::time::{Duration, Instant};
use uuid::Uuid;

use crate::realtime::model::{ClientMessage, ServerMessage};
use crate::realtime::server::{
    Connect, Disconnect, FanoutServer, FileEvent, JoinFile, JoinRoom, LeaveFile, LeaveRoom,
    WsMessage,
};

/// How often heartbeat pings are sent
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(5);
/// How long before lack of client response causes a timeout
const CLIENT_TIMEOUT: Duration = Duration::from_secs(10);

/// WebSocket session actor
pub struct WsSession {
    /// Unique connection id
    pub conn_id: String,
    /// User id (from the verified bearer token)
    pub user_id: String,
    /// Fanout server address
    pub server_addr: Addr<FanoutServer>,
    /// Last heartbeat timestamp
    pub last_heartbeat: Instant,
}

impl WsSession {
    pub fn new(user_id: String, server_addr: Addr<FanoutServer>) -> Self {
        WsSession {
            conn_id: Uuid::new_v4().to_string(),
            user_id,
            server_addr,
            last_heartbeat: Instant::now(),
        }
    }

    /// Start heartbeat process
    fn start_heartbeat(&self, ctx: &mut ws::WebsocketContext<Self>) {
        ctx.run_interval(HEARTBEAT_INTERVAL, |act, ctx| {
            if Instant::now().duration_since(act.last_heartbeat) > CLIENT_TIMEOUT {
                log::warn!("WebSocket client heartbeat timeout, disconnecting");
                ctx.stop();
                return;
            }
            ctx.ping(b"");
        });
    }

    /// Relay a live-editing event to the file channel, excluding the origin
    fn relay(&self, file_id: String, message: ServerMessage) {
        self.server_addr.do_send(FileEvent {
            file_id,
            message,
            exclude: Some(self.conn_id.clone()),
        });
    }

    /// Handle incoming client message
    fn handle_message(&mut self, msg: ClientMessage, ctx: &mut ws::WebsocketContext<Self>) {
        match msg {
            ClientMessage::JoinRoom { room_id } => {
                self.server_addr.do_send(JoinRoom {
                    conn_id: self.conn_id.clone(),
                    room_id,
                });
            }
            ClientMessage::LeaveRoom { room_id } => {
                self.server_addr.do_send(LeaveRoom {
                    conn_id: self.conn_id.clone(),
                    room_id,
                });
            }
            ClientMessage::JoinFile { file_id } => {
                self.server_addr.do_send(JoinFile {
                    conn_id: self.conn_id.clone(),
                    file_id,
                });
            }
            ClientMessage::LeaveFile { file_id } => {
                self.server_addr.do_send(LeaveFile {
                    conn_id: self.conn_id.clone(),
                    file_id,
                });
            }
            ClientMessage::Drawing { file_id, payload } => {
                self.relay(
                    file_id.clone(),
                    ServerMessage::Drawing { file_id, payload },
                );
            }
            ClientMessage::Eraser { file_id, payload } => {
                self.relay(file_id.clone(), ServerMessage::Eraser { file_id, payload });
            }
            ClientMessage::Text { file_id, payload } => {
                self.relay(file_id.clone(), ServerMessage::Text { file_id, payload });
            }
            ClientMessage::Updatetext { file_id, payload } => {
                self.relay(
                    file_id.clone(),
                    ServerMessage::Updatetext { file_id, payload },
                );
            }
            ClientMessage::Deletetext { file_id, payload } => {
                self.relay(
                    file_id.clone(),
                    ServerMessage::Deletetext { file_id, payload },
                );
            }
            ClientMessage::CanvasState { file_id, payload } => {
                self.relay(
                    file_id.clone(),
                    ServerMessage::CanvasState { file_id, payload },
                );
            }
            ClientMessage::RequestCanvasState { file_id } => {
                self.relay(
                    file_id.clone(),
                    ServerMessage::RequestCanvasState { file_id },
                );
            }
            ClientMessage::Undo { file_id, payload } => {
                self.relay(file_id.clone(), ServerMessage::Undo { file_id, payload });
            }
            ClientMessage::Redo { file_id, payload } => {
                self.relay(file_id.clone(), ServerMessage::Redo { file_id, payload });
            }
            ClientMessage::Ping => {
                self.send_message(&ServerMessage::Pong, ctx);
            }
        }
    }

    /// Send message to WebSocket client
    fn send_message(&self, msg: &ServerMessage, ctx: &mut ws::WebsocketContext<Self>) {
        if let Ok(json) = serde_json::to_string(msg) {
            ctx.text(json);
        }
    }
}

impl Actor for WsSession {
    type Context = ws::WebsocketContext<Self>;

    /// Called when actor starts
    fn started(&mut self, ctx: &mut Self::Context) {
        self.start_heartbeat(ctx);

        let addr = ctx.address();
        self.server_addr.do_send(Connect {
            conn_id: self.conn_id.clone(),
            user_id: self.user_id.clone(),
            addr: addr.recipient(),
        });
    }

    /// Called when actor is stopping
    fn stopping(&mut self, _: &mut Self::Context) -> Running {
        self.server_addr.do_send(Disconnect {
            conn_id: self.conn_id.clone(),
        });
        Running::Stop
    }
}

/// Handler for WsMessage from the fanout server
impl Handler<WsMessage> for WsSession {
    type Result = ();

    fn handle(&mut self, msg: WsMessage, ctx: &mut Self::Context) {
        ctx.text(msg.0);
    }
}

/// Handler for WebSocket messages
impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for WsSession {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        match msg {
            Ok(ws::Message::Ping(msg)) => {
                self.last_heartbeat = Instant::now();
                ctx.pong(&msg);
            }
            Ok(ws::Message::Pong(_)) => {
                self.last_heartbeat = Instant::now();
            }
            Ok(ws::Message::Text(text)) => {
                self.last_heartbeat = Instant::now();

                match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(client_msg) => {
                        self.handle_message(client_msg, ctx);
                    }
                    Err(e) => {
                        log::warn!("Failed to parse WebSocket message: {}", e);
                        self.send_message(
                            &ServerMessage::Error {
                                message: format!("Invalid message format: {}", e),
                            },
                            ctx,
                        );
                    }
                }
            }
            Ok(ws::Message::Binary(_)) => {
                log::warn!("Binary messages not supported");
            }
            Ok(ws::Message::Close(reason)) => {
                log::info!("WebSocket close: {:?}", reason);
                ctx.close(reason);
                ctx.stop();
            }
            _ => ctx.stop(),
        }
    }
}
