//! Change feed client
//!
//! A single connection that both subscribes to rooms and publishes the
//! writes made locally.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::{ReadHalf, WriteHalf};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::frame::{read_frame, write_frame};
use crate::protocol::{Message, RoomChange};

/// Connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connected,
    Disconnected,
}

/// Event received from the feed server
#[derive(Debug, Clone, PartialEq)]
pub enum FeedEvent {
    Subscribed { room_id: Uuid },
    /// Another client wrote to a subscribed room
    Changed(RoomChange),
    Pong,
    ServerShutdown,
    /// Connection lost
    Disconnected,
}

/// Client handle for feed operations
pub struct FeedClient {
    state: Arc<RwLock<ConnectionState>>,
    event_rx: mpsc::Receiver<FeedEvent>,
    cmd_tx: mpsc::Sender<ClientCommand>,
}

enum ClientCommand {
    Send(Message),
    Disconnect,
}

impl FeedClient {
    pub async fn connect(addr: SocketAddr) -> Result<Self> {
        info!(addr = %addr, "Connecting to feed");

        let stream = TcpStream::connect(addr).await?;
        let (reader, writer) = tokio::io::split(stream);

        let state = Arc::new(RwLock::new(ConnectionState::Connected));
        let (event_tx, event_rx) = mpsc::channel(64);
        let (cmd_tx, cmd_rx) = mpsc::channel(64);

        tokio::spawn(connection_task(
            reader,
            writer,
            state.clone(),
            event_tx,
            cmd_rx,
        ));

        Ok(FeedClient {
            state,
            event_rx,
            cmd_tx,
        })
    }

    async fn send(&self, msg: Message) -> Result<()> {
        self.cmd_tx
            .send(ClientCommand::Send(msg))
            .await
            .map_err(|_| Error::NotConnected)
    }

    pub async fn subscribe(&self, room_id: Uuid) -> Result<()> {
        self.send(Message::Subscribe { room_id }).await
    }

    pub async fn unsubscribe(&self, room_id: Uuid) -> Result<()> {
        self.send(Message::Unsubscribe { room_id }).await
    }

    /// Announce a local write to the room's other subscribers
    pub async fn publish(&self, change: RoomChange) -> Result<()> {
        self.send(Message::Publish(change)).await
    }

    pub async fn ping(&self) -> Result<()> {
        self.send(Message::Ping).await
    }

    /// Next event; `None` once the connection task has ended
    pub async fn next_event(&mut self) -> Option<FeedEvent> {
        self.event_rx.recv().await
    }

    /// Flush queued frames and close the connection
    pub async fn disconnect(&self) {
        let _ = self.cmd_tx.send(ClientCommand::Disconnect).await;
    }

    pub async fn connection_state(&self) -> ConnectionState {
        *self.state.read().await
    }
}

async fn connection_task(
    mut reader: ReadHalf<TcpStream>,
    mut writer: WriteHalf<TcpStream>,
    state: Arc<RwLock<ConnectionState>>,
    event_tx: mpsc::Sender<FeedEvent>,
    mut cmd_rx: mpsc::Receiver<ClientCommand>,
) {
    loop {
        tokio::select! {
            result = read_frame(&mut reader) => {
                match result {
                    Ok(msg) => {
                        if let Some(event) = to_event(msg) {
                            let shutdown = event == FeedEvent::ServerShutdown;
                            let _ = event_tx.send(event).await;
                            if shutdown {
                                break;
                            }
                        }
                    }
                    Err(Error::ConnectionClosed) => {
                        debug!("Feed server closed connection");
                        break;
                    }
                    Err(e) => {
                        warn!(error = %e, "Read error");
                        break;
                    }
                }
            }

            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(ClientCommand::Send(msg)) => {
                        if let Err(e) = write_frame(&mut writer, &msg).await {
                            warn!(error = %e, "Write error");
                            break;
                        }
                    }
                    Some(ClientCommand::Disconnect) | None => {
                        debug!("Disconnect requested");
                        break;
                    }
                }
            }
        }
    }

    drop(cmd_rx);
    *state.write().await = ConnectionState::Disconnected;
    let _ = event_tx.send(FeedEvent::Disconnected).await;
}

fn to_event(msg: Message) -> Option<FeedEvent> {
    match msg {
        Message::Subscribed { room_id } => Some(FeedEvent::Subscribed { room_id }),
        Message::Changed(change) => Some(FeedEvent::Changed(change)),
        Message::Pong => Some(FeedEvent::Pong),
        Message::ServerShutdown => Some(FeedEvent::ServerShutdown),
        _ => {
            debug!("Ignoring unexpected message");
            None
        }
    }
}
