//! Multi-room Chat Server Library
//!
//! A line-based TCP chat server. Clients pick a display name, then chat
//! in named rooms, moving between them with slash commands.
//!
//! # Commands
//! - `/rooms` - list rooms and their member counts
//! - `/join <room>` - move to a room, creating it on first use
//! - `/leave` - go back to the default room
//! - `/quit` - disconnect
//! - anything else is sent to everyone in the current room
//!
//! # Architecture
//! Uses the Actor pattern with `mpsc` channels:
//! - Each `Room` is an actor that alone mutates its member set
//! - The `Dispatcher` tracks every client's current room, interprets
//!   input lines, and runs the default room inside its own loop
//! - Each connection has a `handler` task feeding lines to the dispatcher
//! - The `RoomRegistry` maps names to rooms behind a single mutex
//!
//! # Example
//! ```ignore
//! use tokio::net::TcpListener;
//! use room_chat::{serve, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = ServerConfig::default();
//!     let listener = TcpListener::bind(&config.addr).await.unwrap();
//!     serve(listener, config).await.unwrap();
//! }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod handler;
pub mod message;
pub mod registry;
pub mod room;
pub mod server;
pub mod types;

#[cfg(test)]
mod test_support;

// Re-export main types for convenience
pub use client::{Client, Peer};
pub use config::ServerConfig;
pub use error::{AppError, SendError};
pub use handler::handle_connection;
pub use message::{Command, Notice};
pub use registry::RoomRegistry;
pub use room::{Departure, Room, RoomEvent, RoomHandle};
pub use server::{serve, DispatchCommand, Dispatcher};
pub use types::{ClientId, RoomName};
