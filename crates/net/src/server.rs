//! Change feed hub
//!
//! Clients subscribe to rooms and publish the writes they make. Each
//! publish is forwarded to every other connection subscribed to the same
//! room. Nothing is persisted; a subscriber that was offline simply
//! reloads when it comes back.

use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::WriteHalf;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{broadcast, mpsc, RwLock};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::frame::{read_frame, write_frame};
use crate::protocol::{Message, RoomChange};

/// Maximum number of simultaneous connections
const MAX_CONNECTIONS: usize = 256;

/// Outgoing queue depth per connection
const OUTBOX_CAPACITY: usize = 64;

type ConnId = u64;

struct Subscriber {
    tx: mpsc::Sender<Message>,
    rooms: HashSet<Uuid>,
}

#[derive(Default)]
struct FeedState {
    next_id: ConnId,
    subscribers: HashMap<ConnId, Subscriber>,
}

impl FeedState {
    /// Senders for a room's subscribers, excluding one connection
    fn recipients(&self, room_id: Uuid, except: ConnId) -> Vec<mpsc::Sender<Message>> {
        self.subscribers
            .iter()
            .filter(|(id, sub)| **id != except && sub.rooms.contains(&room_id))
            .map(|(_, sub)| sub.tx.clone())
            .collect()
    }
}

/// Feed server handle
pub struct FeedServer {
    addr: SocketAddr,
    state: Arc<RwLock<FeedState>>,
    shutdown_tx: broadcast::Sender<()>,
}

impl FeedServer {
    /// Bind and start accepting; port 0 picks a free port
    pub async fn start(addr: SocketAddr) -> Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        let bound_addr = listener.local_addr()?;

        info!(addr = %bound_addr, "Feed server started");

        let (shutdown_tx, _) = broadcast::channel(1);
        let state = Arc::new(RwLock::new(FeedState::default()));

        tokio::spawn(accept_loop(
            listener,
            state.clone(),
            shutdown_tx.subscribe(),
        ));

        Ok(FeedServer {
            addr: bound_addr,
            state,
            shutdown_tx,
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Number of connections subscribed to a room
    pub async fn subscriber_count(&self, room_id: Uuid) -> usize {
        self.state
            .read()
            .await
            .subscribers
            .values()
            .filter(|s| s.rooms.contains(&room_id))
            .count()
    }

    /// Tell every client we are leaving, then stop accepting
    pub async fn shutdown(&self) {
        let senders: Vec<_> = {
            let s = self.state.read().await;
            s.subscribers.values().map(|sub| sub.tx.clone()).collect()
        };
        for tx in senders {
            let _ = tx.send(Message::ServerShutdown).await;
        }
        let _ = self.shutdown_tx.send(());
        info!("Feed server shutdown initiated");
    }
}

async fn accept_loop(
    listener: TcpListener,
    state: Arc<RwLock<FeedState>>,
    mut shutdown_rx: broadcast::Receiver<()>,
) {
    loop {
        tokio::select! {
            result = listener.accept() => {
                match result {
                    Ok((stream, addr)) => {
                        debug!(addr = %addr, "New connection");
                        tokio::spawn(handle_connection(stream, addr, state.clone()));
                    }
                    Err(e) => {
                        error!(error = %e, "Accept failed");
                    }
                }
            }
            _ = shutdown_rx.recv() => {
                info!("Accept loop shutting down");
                break;
            }
        }
    }
}

async fn register(state: &Arc<RwLock<FeedState>>) -> Result<(ConnId, mpsc::Receiver<Message>)> {
    let mut s = state.write().await;
    if s.subscribers.len() >= MAX_CONNECTIONS {
        return Err(Error::Rejected("feed server full".into()));
    }

    let id = s.next_id;
    s.next_id += 1;
    let (tx, rx) = mpsc::channel(OUTBOX_CAPACITY);
    s.subscribers.insert(
        id,
        Subscriber {
            tx,
            rooms: HashSet::new(),
        },
    );
    Ok((id, rx))
}

async fn handle_connection(stream: TcpStream, addr: SocketAddr, state: Arc<RwLock<FeedState>>) {
    let (mut reader, writer) = tokio::io::split(stream);

    let (conn_id, outbox) = match register(&state).await {
        Ok(registered) => registered,
        Err(e) => {
            warn!(addr = %addr, error = %e, "Connection refused");
            return;
        }
    };

    let writer_handle = tokio::spawn(writer_task(writer, outbox));

    loop {
        match read_frame(&mut reader).await {
            Ok(msg) => handle_message(msg, conn_id, &state).await,
            Err(Error::ConnectionClosed) => {
                debug!(conn_id, "Connection closed");
                break;
            }
            Err(e) => {
                warn!(conn_id, error = %e, "Read error");
                break;
            }
        }
    }

    writer_handle.abort();
    state.write().await.subscribers.remove(&conn_id);
    debug!(conn_id, addr = %addr, "Subscriber removed");
}

async fn writer_task(mut writer: WriteHalf<TcpStream>, mut rx: mpsc::Receiver<Message>) {
    while let Some(msg) = rx.recv().await {
        if let Err(e) = write_frame(&mut writer, &msg).await {
            debug!(error = %e, "Write failed");
            break;
        }
    }
}

async fn reply(state: &Arc<RwLock<FeedState>>, conn_id: ConnId, msg: Message) {
    let tx = state
        .read()
        .await
        .subscribers
        .get(&conn_id)
        .map(|s| s.tx.clone());
    if let Some(tx) = tx {
        let _ = tx.send(msg).await;
    }
}

async fn fan_out(state: &Arc<RwLock<FeedState>>, conn_id: ConnId, change: RoomChange) {
    let recipients = state.read().await.recipients(change.room_id, conn_id);
    let delivered = deliver(&recipients, &change);
    debug!(
        room_id = %change.room_id,
        source = ?change.source,
        recipients = recipients.len(),
        delivered,
        "Forwarding change"
    );
}

/// Queue a change for each recipient without waiting on slow ones
///
/// A full outbox drops the notification. Any later change makes that
/// subscriber reload the whole room anyway.
fn deliver(recipients: &[mpsc::Sender<Message>], change: &RoomChange) -> usize {
    let mut delivered = 0;
    for tx in recipients {
        match tx.try_send(Message::Changed(change.clone())) {
            Ok(()) => delivered += 1,
            Err(TrySendError::Full(_)) => {
                warn!(room_id = %change.room_id, "Subscriber outbox full; change dropped");
            }
            Err(TrySendError::Closed(_)) => {
                debug!(room_id = %change.room_id, "Subscriber went away during fan-out");
            }
        }
    }
    delivered
}

async fn handle_message(msg: Message, conn_id: ConnId, state: &Arc<RwLock<FeedState>>) {
    match msg {
        Message::Subscribe { room_id } => {
            if let Some(sub) = state.write().await.subscribers.get_mut(&conn_id) {
                sub.rooms.insert(room_id);
            }
            debug!(conn_id, room_id = %room_id, "Subscribed");
            reply(state, conn_id, Message::Subscribed { room_id }).await;
        }
        Message::Unsubscribe { room_id } => {
            if let Some(sub) = state.write().await.subscribers.get_mut(&conn_id) {
                sub.rooms.remove(&room_id);
            }
        }
        Message::Publish(change) => fan_out(state, conn_id, change).await,
        Message::Ping => reply(state, conn_id, Message::Pong).await,
        _ => {
            debug!(conn_id, "Ignoring unexpected message type");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_server_start() {
        let server = FeedServer::start("127.0.0.1:0".parse().unwrap()).await.unwrap();
        assert!(server.addr().port() > 0);
        assert_eq!(server.subscriber_count(Uuid::new_v4()).await, 0);
        server.shutdown().await;
    }

    #[test]
    fn test_recipients_exclude_publisher_and_other_rooms() {
        let room = Uuid::new_v4();
        let mut state = FeedState::default();
        for (id, rooms) in [(0, vec![room]), (1, vec![room]), (2, vec![Uuid::new_v4()])] {
            let (tx, _rx) = mpsc::channel(1);
            state.subscribers.insert(
                id,
                Subscriber {
                    tx,
                    rooms: rooms.into_iter().collect(),
                },
            );
        }

        assert_eq!(state.recipients(room, 0).len(), 1);
        assert_eq!(state.recipients(room, 5).len(), 2);
    }

    #[test]
    fn test_full_outbox_does_not_block_others() {
        let change = RoomChange::new(
            Uuid::new_v4(),
            crate::protocol::ChangeSource::Participants,
            crate::protocol::ChangeKind::Update,
        );

        let (stalled_tx, _stalled_rx) = mpsc::channel(1);
        stalled_tx.try_send(Message::Pong).unwrap();
        let (live_tx, mut live_rx) = mpsc::channel(4);
        let (gone_tx, gone_rx) = mpsc::channel(4);
        drop(gone_rx);

        let delivered = deliver(&[stalled_tx, live_tx, gone_tx], &change);

        assert_eq!(delivered, 1);
        match live_rx.try_recv().unwrap() {
            Message::Changed(received) => assert_eq!(received, change),
            other => panic!("unexpected {:?}", other),
        }
    }
}
