//! Room registry
//!
//! Process-wide map from room name to [`RoomHandle`]. Rooms are created
//! lazily on first join and never removed; the default room is present
//! from construction.

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::info;

use crate::room::{Room, RoomHandle};
use crate::types::RoomName;

/// Shared room registry. Cheap to clone.
#[derive(Debug, Clone)]
pub struct RoomRegistry {
    default_room: RoomHandle,
    rooms: Arc<Mutex<BTreeMap<RoomName, RoomHandle>>>,
    /// Mailbox capacity for rooms created by this registry
    capacity: usize,
}

impl RoomRegistry {
    /// Create a registry holding only the default room.
    ///
    /// The default room's loop is run by whoever owns it; the registry
    /// only keeps its handle.
    pub fn new(default_room: RoomHandle, capacity: usize) -> Self {
        let mut rooms = BTreeMap::new();
        rooms.insert(default_room.name().clone(), default_room.clone());

        Self {
            default_room,
            rooms: Arc::new(Mutex::new(rooms)),
            capacity,
        }
    }

    pub fn default_room(&self) -> &RoomHandle {
        &self.default_room
    }

    /// Look up a room, creating and starting it if the name is new.
    ///
    /// The check and the insert happen under one lock, so concurrent
    /// callers asking for the same new name get the same room.
    pub async fn get_or_create(&self, name: &str) -> RoomHandle {
        let mut rooms = self.rooms.lock().await;

        if let Some(room) = rooms.get(name) {
            return room.clone();
        }

        let room = Room::spawn(RoomName::from(name), self.capacity);
        rooms.insert(room.name().clone(), room.clone());
        info!("New room created: {}", name);
        room
    }

    /// Snapshot of every registered room and its member count, by name.
    ///
    /// Counts are read room by room and are not taken atomically.
    pub async fn list(&self) -> Vec<(RoomName, usize)> {
        self.rooms
            .lock()
            .await
            .values()
            .map(|room| (room.name().clone(), room.member_count()))
            .collect()
    }
}
