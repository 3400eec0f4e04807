//! Room actor
//!
//! Each room owns its member set and mutates it only from its own event
//! loop. The outside world talks to a room through a [`RoomHandle`],
//! which is just a mailbox sender plus the room's published size.
//!
//! Announcements a room makes about itself (welcome and departure
//! lines) are posted back into its own mailbox from a separate task,
//! so the loop never waits on its own queue.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::client::Peer;
use crate::error::AppError;
use crate::message::{self, Notice};
use crate::types::{ClientId, RoomName};

/// Why a member is leaving a room
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Departure {
    /// Moved to another room, or a write to the peer failed.
    /// The peer sees a leaving banner and the room hears `<name> has left.`
    Left,
    /// The connection dropped mid-session. The room hears `<name> has quit.`
    Disconnected,
    /// `/quit`. Removed without an announcement.
    Quit,
}

/// Events processed by a room's loop, strictly in arrival order.
#[derive(Debug)]
pub enum RoomEvent {
    /// Insert a member. Acknowledged once the member set holds the peer.
    Admit {
        peer: Peer,
        reply: oneshot::Sender<()>,
    },
    /// An admitted member has arrived: entry banner and welcome broadcast.
    Joined { client_id: ClientId },
    /// Remove a member.
    Left {
        client_id: ClientId,
        departure: Departure,
        reply: Option<oneshot::Sender<()>>,
    },
    /// Deliver a line to every member.
    Broadcast { text: String },
}

impl RoomEvent {
    /// `Admit` event plus the receiver for its acknowledgement.
    pub fn admit(peer: Peer) -> (Self, oneshot::Receiver<()>) {
        let (reply, ack) = oneshot::channel();
        (RoomEvent::Admit { peer, reply }, ack)
    }

    /// Acknowledged `Left` event plus the receiver for its acknowledgement.
    pub fn leave(client_id: ClientId, departure: Departure) -> (Self, oneshot::Receiver<()>) {
        let (reply, ack) = oneshot::channel();
        let event = RoomEvent::Left {
            client_id,
            departure,
            reply: Some(reply),
        };
        (event, ack)
    }
}

/// Handle to a running room. Cheap to clone.
#[derive(Debug, Clone)]
pub struct RoomHandle {
    name: RoomName,
    sender: mpsc::Sender<RoomEvent>,
    population: Arc<AtomicUsize>,
}

impl RoomHandle {
    pub fn name(&self) -> &RoomName {
        &self.name
    }

    /// Member count as last published by the room's loop.
    ///
    /// Advisory only: a move in flight may be counted in both rooms or
    /// in neither.
    pub fn member_count(&self) -> usize {
        self.population.load(Ordering::Relaxed)
    }

    /// Queue an event for the room's loop.
    async fn send(&self, event: RoomEvent) -> Result<(), AppError> {
        self.sender
            .send(event)
            .await
            .map_err(|_| AppError::RoomUnavailable(self.name.clone()))
    }

    /// Wait for the room to acknowledge an event.
    async fn acknowledged(&self, ack: oneshot::Receiver<()>) -> Result<(), AppError> {
        ack.await
            .map_err(|_| AppError::RoomUnavailable(self.name.clone()))
    }

    /// Insert a member and wait until the room holds it.
    pub async fn admit(&self, peer: Peer) -> Result<(), AppError> {
        let (event, ack) = RoomEvent::admit(peer);
        self.send(event).await?;
        self.acknowledged(ack).await
    }

    /// Signal that an admitted member has arrived.
    pub async fn joined(&self, client_id: ClientId) -> Result<(), AppError> {
        self.send(RoomEvent::Joined { client_id }).await
    }

    /// Remove a member and wait until the room has let it go.
    pub async fn leave(&self, client_id: ClientId, departure: Departure) -> Result<(), AppError> {
        let (event, ack) = RoomEvent::leave(client_id, departure);
        self.send(event).await?;
        self.acknowledged(ack).await
    }

    /// Broadcast a line to every member.
    pub async fn broadcast(&self, text: String) -> Result<(), AppError> {
        self.send(RoomEvent::Broadcast { text }).await
    }
}

/// Member set and event handling of one room.
///
/// Driven either by a dedicated [`Room`] task or, for the default room,
/// by the dispatcher's own loop.
#[derive(Debug)]
pub struct RoomState {
    name: RoomName,
    members: HashMap<ClientId, Peer>,
    population: Arc<AtomicUsize>,
    /// Own mailbox, for announcements the room makes to itself
    mailbox: mpsc::Sender<RoomEvent>,
}

impl RoomState {
    pub fn name(&self) -> &RoomName {
        &self.name
    }

    /// Process a single event
    pub fn handle(&mut self, event: RoomEvent) {
        match event {
            RoomEvent::Admit { peer, reply } => {
                debug!("Admitting {} ({}) to {}", peer.name, peer.id, self.name);
                self.members.insert(peer.id, peer);
                self.publish_count();
                let _ = reply.send(());
            }
            RoomEvent::Joined { client_id } => self.handle_joined(client_id),
            RoomEvent::Left {
                client_id,
                departure,
                reply,
            } => {
                self.handle_left(client_id, departure);
                if let Some(reply) = reply {
                    let _ = reply.send(());
                }
            }
            RoomEvent::Broadcast { text } => self.handle_broadcast(text),
        }
    }

    fn handle_joined(&mut self, client_id: ClientId) {
        let Some(peer) = self.members.get(&client_id) else {
            warn!("Join signal for {} which is not in {}", client_id, self.name);
            return;
        };

        let name = peer.name.clone();
        if peer.send(&Notice::Entering(self.name.clone())).is_err() {
            self.peer_gone(client_id);
        }
        info!("User ({}) joined room: {}", name, self.name);

        self.reenter(RoomEvent::Broadcast {
            text: message::welcome(&name),
        });
    }

    fn handle_broadcast(&mut self, text: String) {
        let notice = Notice::Broadcast {
            text,
            room: self.name.clone(),
        };

        let gone: Vec<ClientId> = self
            .members
            .values()
            .filter(|peer| peer.send(&notice).is_err())
            .map(|peer| peer.id)
            .collect();

        for client_id in gone {
            self.peer_gone(client_id);
        }
    }

    fn handle_left(&mut self, client_id: ClientId, departure: Departure) {
        let Some(peer) = self.members.remove(&client_id) else {
            debug!("{} already gone from {}", client_id, self.name);
            return;
        };
        self.publish_count();

        match departure {
            Departure::Left => {
                let _ = peer.send(&Notice::Leaving(self.name.clone()));
                info!("User ({}) left room: {}", peer.name, self.name);
                self.reenter(RoomEvent::Broadcast {
                    text: message::has_left(&peer.name),
                });
            }
            Departure::Disconnected => {
                info!("User ({}) dropped out of room: {}", peer.name, self.name);
                self.reenter(RoomEvent::Broadcast {
                    text: message::has_quit(&peer.name),
                });
            }
            Departure::Quit => {
                info!("User ({}) quit from room: {}", peer.name, self.name);
            }
        }
    }

    /// A write to this member failed; remove it through the mailbox.
    fn peer_gone(&self, client_id: ClientId) {
        debug!("Write to {} in {} failed", client_id, self.name);
        self.reenter(RoomEvent::Left {
            client_id,
            departure: Departure::Left,
            reply: None,
        });
    }

    /// Post an event back into this room's own mailbox from a separate task.
    fn reenter(&self, event: RoomEvent) {
        let mailbox = self.mailbox.clone();
        tokio::spawn(async move {
            let _ = mailbox.send(event).await;
        });
    }

    fn publish_count(&self) {
        self.population.store(self.members.len(), Ordering::Relaxed);
    }
}

/// A room together with its mailbox.
#[derive(Debug)]
pub struct Room {
    pub(crate) state: RoomState,
    pub(crate) receiver: mpsc::Receiver<RoomEvent>,
}

impl Room {
    /// Create an empty room without starting its loop.
    pub fn open(name: RoomName, capacity: usize) -> (RoomHandle, Room) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let population = Arc::new(AtomicUsize::new(0));

        let handle = RoomHandle {
            name: name.clone(),
            sender: sender.clone(),
            population: Arc::clone(&population),
        };
        let state = RoomState {
            name,
            members: HashMap::new(),
            population,
            mailbox: sender,
        };

        (handle, Room { state, receiver })
    }

    /// Create an empty room and start its loop on a new task.
    pub fn spawn(name: RoomName, capacity: usize) -> RoomHandle {
        let (handle, room) = Self::open(name, capacity);
        tokio::spawn(room.run());
        handle
    }

    /// Run the room's event loop
    ///
    /// The room keeps a sender to its own mailbox, so this runs for the
    /// life of the process.
    pub async fn run(mut self) {
        debug!("Room {} started", self.state.name);

        while let Some(event) = self.receiver.recv().await {
            self.state.handle(event);
        }
    }
}
