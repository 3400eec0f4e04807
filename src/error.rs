//! Error types for the chat server
//!
//! Defines application-level errors and message send errors.
//! Uses thiserror for ergonomic error definitions.

use thiserror::Error;

use crate::types::RoomName;

/// Application-level errors
///
/// Covers both fatal errors (listener failure, broken internal channels)
/// and user-facing errors that are reported inline as text.
#[derive(Debug, Error)]
pub enum AppError {
    /// IO error (fatal when it comes from the listener)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The dispatcher's command channel is closed
    #[error("Channel send error")]
    ChannelSend,

    /// A room's event loop is no longer accepting events
    #[error("Room unavailable: {0}")]
    RoomUnavailable(RoomName),

    /// A command was given the wrong number of arguments
    #[error("Incorrect number of arguments.")]
    InvalidArgumentCount {
        command: &'static str,
        expected: usize,
        found: usize,
    },

    /// Join target is the room the user is already in
    #[error("You are already in the room.")]
    AlreadyInRoom(RoomName),

    /// Rejected server configuration
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl AppError {
    /// Whether this error is shown to the user instead of being logged.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            AppError::InvalidArgumentCount { .. } | AppError::AlreadyInRoom(_)
        )
    }
}

/// Message send errors
///
/// Occurs when writing to a connection whose writer has gone away.
#[derive(Debug, Error)]
pub enum SendError {
    /// The receiving end of the channel has been closed
    #[error("Channel closed")]
    ChannelClosed,
}
