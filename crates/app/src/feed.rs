//! Change feed integration
//!
//! Writes are announced after they commit. The announcement is best
//! effort: an unreachable feed never undoes or fails a write.

use std::time::Duration;

use moyeora_net::{ChangeKind, ChangeSource, FeedClient, RoomChange};
use tokio::time::timeout;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::FeedConfig;
use crate::error::{AppError, Result};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(2);

/// Announce a committed write to other watchers of the room
pub async fn announce(config: &FeedConfig, room_id: Uuid, source: ChangeSource, kind: ChangeKind) {
    if !config.enabled {
        return;
    }

    let change = RoomChange::new(room_id, source, kind);
    match publish(config, change).await {
        Ok(()) => debug!(%room_id, ?source, "Change announced"),
        Err(e) => warn!(%room_id, error = %e, "Could not reach change feed; others will see this on reload"),
    }
}

async fn publish(config: &FeedConfig, change: RoomChange) -> Result<()> {
    let client = connect(config).await?;
    client.publish(change).await?;
    client.disconnect().await;
    Ok(())
}

/// Open a feed connection, bounded by a short timeout
pub async fn connect(config: &FeedConfig) -> Result<FeedClient> {
    match timeout(CONNECT_TIMEOUT, FeedClient::connect(config.addr)).await {
        Ok(result) => Ok(result?),
        Err(_) => Err(AppError::Net(moyeora_net::Error::Io(std::io::Error::new(
            std::io::ErrorKind::TimedOut,
            format!("connecting to {} timed out", config.addr),
        )))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use moyeora_net::{FeedEvent, FeedServer};

    const WAIT: Duration = Duration::from_secs(5);

    async fn next(client: &mut FeedClient) -> FeedEvent {
        timeout(WAIT, client.next_event()).await.unwrap().unwrap()
    }

    #[tokio::test]
    async fn test_announce_reaches_watcher() {
        let server = FeedServer::start("127.0.0.1:0".parse().unwrap()).await.unwrap();
        let config = FeedConfig {
            addr: server.addr(),
            enabled: true,
        };
        let room_id = Uuid::new_v4();

        let mut watcher = connect(&config).await.unwrap();
        watcher.subscribe(room_id).await.unwrap();
        assert_eq!(next(&mut watcher).await, FeedEvent::Subscribed { room_id });

        announce(&config, room_id, ChangeSource::Participants, ChangeKind::Insert).await;

        match next(&mut watcher).await {
            FeedEvent::Changed(change) => {
                assert_eq!(change.room_id, room_id);
                assert_eq!(change.source, ChangeSource::Participants);
                assert_eq!(change.kind, ChangeKind::Insert);
            }
            other => panic!("unexpected event {:?}", other),
        }
        server.shutdown().await;
    }

    #[tokio::test]
    async fn test_announce_without_feed_is_silent() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let config = FeedConfig {
            addr,
            enabled: true,
        };
        timeout(
            WAIT,
            announce(&config, Uuid::new_v4(), ChangeSource::Room, ChangeKind::Update),
        )
        .await
        .unwrap();

        assert!(connect(&config).await.is_err());
    }
}
