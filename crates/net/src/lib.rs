//! Moyeora Network Library
//!
//! Realtime change feed for rooms, plus share link handling.
//!
//! # Architecture
//!
//! - **FeedServer**: hub that forwards change notices between subscribers
//! - **FeedClient**: subscribes to rooms and publishes local writes
//! - **Protocol**: Length-prefixed JSON messages
//!
//! # Usage
//!
//! ```ignore
//! let server = FeedServer::start("127.0.0.1:7341".parse()?).await?;
//!
//! let mut client = FeedClient::connect(server.addr()).await?;
//! client.subscribe(room_id).await?;
//! while let Some(event) = client.next_event().await {
//!     if let FeedEvent::Changed(change) = event {
//!         // reload the room
//!     }
//! }
//! ```

pub mod client;
pub mod error;
mod frame;
pub mod link;
pub mod protocol;
pub mod server;

pub use client::{ConnectionState, FeedClient, FeedEvent};
pub use error::{Error, Result};
pub use link::RoomLink;
pub use protocol::{ChangeKind, ChangeSource, Message, RoomChange};
pub use server::FeedServer;

/// Default port for the feed server
pub const DEFAULT_PORT: u16 = 7341;
