//! Connection handle definitions
//!
//! A [`Peer`] is what a room stores per member: identity, display name
//! and the outbound channel to that connection's writer task. A
//! [`Client`] is the dispatcher's view of the same connection, adding
//! the room it currently occupies and the means to close it.

use tokio::sync::{mpsc, oneshot};

use crate::error::SendError;
use crate::message::Notice;
use crate::room::RoomHandle;
use crate::types::{ClientId, RoomName};

/// Outbound half of a connection, as seen by rooms.
///
/// Cheap to clone. Sending never blocks: text is queued for the
/// connection's writer task, so a stalled socket cannot stall a room.
#[derive(Debug, Clone)]
pub struct Peer {
    /// Unique identifier for this connection
    pub id: ClientId,
    /// Display name chosen at login
    pub name: String,
    /// Server → client text channel
    outbound: mpsc::UnboundedSender<String>,
}

impl Peer {
    pub fn new(id: ClientId, name: String, outbound: mpsc::UnboundedSender<String>) -> Self {
        Self { id, name, outbound }
    }

    /// Queue a notice for this connection
    ///
    /// Returns an error if the writer has gone away (peer disconnected).
    pub fn send(&self, notice: &Notice) -> Result<(), SendError> {
        self.outbound
            .send(notice.to_string())
            .map_err(|_| SendError::ChannelClosed)
    }
}

/// A logged-in connection, owned by the dispatcher.
#[derive(Debug)]
pub struct Client {
    pub peer: Peer,
    /// Room the connection is in. Only updated once the move is complete.
    pub room: RoomHandle,
    /// Fired by `/quit` to make the connection task close the transport
    closer: Option<oneshot::Sender<()>>,
}

impl Client {
    pub fn new(peer: Peer, room: RoomHandle, closer: oneshot::Sender<()>) -> Self {
        Self {
            peer,
            room,
            closer: Some(closer),
        }
    }

    pub fn id(&self) -> ClientId {
        self.peer.id
    }

    pub fn name(&self) -> &str {
        &self.peer.name
    }

    pub fn room_name(&self) -> &RoomName {
        self.room.name()
    }

    /// Ask the connection task to close the transport.
    pub fn close(&mut self) {
        if let Some(closer) = self.closer.take() {
            let _ = closer.send(());
        }
    }
}
