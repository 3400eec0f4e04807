//! Dispatcher actor implementation
//!
//! The central actor: it tracks which room every logged-in connection
//! occupies, interprets each input line, and moves connections between
//! rooms. It also runs the default room itself, selecting over its own
//! command channel and the default room's mailbox in one loop.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

use crate::client::{Client, Peer};
use crate::config::ServerConfig;
use crate::error::AppError;
use crate::handler::handle_connection;
use crate::message::{self, Command, Notice};
use crate::registry::RoomRegistry;
use crate::room::{Departure, Room, RoomEvent, RoomHandle, RoomState};
use crate::types::{ClientId, RoomName};

/// Commands sent from connection tasks to the dispatcher
#[derive(Debug)]
pub enum DispatchCommand {
    /// A connection sent its login name
    Login {
        client_id: ClientId,
        name: String,
        outbound: mpsc::UnboundedSender<String>,
        closer: oneshot::Sender<()>,
    },
    /// One line of input after login
    Input { client_id: ClientId, line: String },
    /// The connection's read side hit EOF or an error
    Disconnected { client_id: ClientId },
}

/// The dispatcher actor
///
/// Owns the `ClientId -> Client` table; a client's current room is only
/// ever changed here, and only after the destination room has admitted it.
pub struct Dispatcher {
    registry: RoomRegistry,
    /// The default room, driven by this actor's loop
    lobby: Room,
    clients: HashMap<ClientId, Client>,
    receiver: mpsc::Receiver<DispatchCommand>,
}

impl Dispatcher {
    /// Create a dispatcher and its default room
    pub fn new(
        default_room: RoomName,
        capacity: usize,
        receiver: mpsc::Receiver<DispatchCommand>,
    ) -> Self {
        let (lobby_handle, lobby) = Room::open(default_room, capacity);

        Self {
            registry: RoomRegistry::new(lobby_handle, capacity),
            lobby,
            clients: HashMap::new(),
            receiver,
        }
    }

    /// Run the dispatcher event loop
    ///
    /// Stops once every command sender has been dropped.
    pub async fn run(mut self) {
        info!("Dispatcher started, default room: {}", self.lobby.state.name());

        loop {
            tokio::select! {
                cmd = self.receiver.recv() => match cmd {
                    Some(cmd) => self.handle_command(cmd).await,
                    None => break,
                },
                Some(event) = self.lobby.receiver.recv() => self.lobby.state.handle(event),
            }
        }

        info!("Dispatcher shutting down");
    }

    /// Process a single command
    async fn handle_command(&mut self, cmd: DispatchCommand) {
        match cmd {
            DispatchCommand::Login {
                client_id,
                name,
                outbound,
                closer,
            } => {
                if let Err(e) = self.handle_login(client_id, name, outbound, closer).await {
                    error!("Login of {} failed: {}", client_id, e);
                }
            }
            DispatchCommand::Input { client_id, line } => {
                self.handle_input(client_id, &line).await;
            }
            DispatchCommand::Disconnected { client_id } => {
                if let Err(e) = self.handle_disconnect(client_id).await {
                    error!("Removing {} failed: {}", client_id, e);
                }
            }
        }
    }

    async fn handle_login(
        &mut self,
        client_id: ClientId,
        name: String,
        outbound: mpsc::UnboundedSender<String>,
        closer: oneshot::Sender<()>,
    ) -> Result<(), AppError> {
        let peer = Peer::new(client_id, name, outbound);
        let lobby = self.registry.default_room().clone();

        self.admit(&lobby, peer.clone()).await?;
        info!("User logged in: {} ({})", peer.name, client_id);
        self.clients
            .insert(client_id, Client::new(peer, lobby.clone(), closer));
        self.joined(&lobby, client_id).await
    }

    async fn handle_input(&mut self, client_id: ClientId, line: &str) {
        let Some(client) = self.clients.get(&client_id) else {
            debug!("Input from unknown client {}", client_id);
            return;
        };
        let current = client.room_name().clone();

        if let Err(err) = self.interpret(client_id, line).await {
            if err.is_user_facing() {
                self.reply(client_id, &Notice::error(&err, &current));
            } else {
                warn!("Command from {} failed: {}", client_id, err);
            }
        }
    }

    /// Act on one input line
    async fn interpret(&mut self, client_id: ClientId, line: &str) -> Result<(), AppError> {
        let command = Command::parse(line)?;

        let Some(client) = self.clients.get(&client_id) else {
            return Ok(());
        };
        let current = client.room.clone();

        match command {
            Command::ListRooms => {
                let rooms = self.registry.list().await;
                self.reply(
                    client_id,
                    &Notice::RoomList {
                        rooms,
                        current: current.name().clone(),
                    },
                );
                Ok(())
            }
            Command::Leave => {
                let lobby = self.registry.default_room().clone();
                self.move_to(client_id, lobby).await
            }
            Command::Quit => self.quit(client_id).await,
            Command::Join(name) => {
                if name == *current.name() {
                    return Err(AppError::AlreadyInRoom(name));
                }
                let target = self.registry.get_or_create(name.as_str()).await;
                self.move_to(client_id, target).await
            }
            Command::Say(text) => {
                let text = message::chat_line(client.name(), &text);
                self.broadcast(&current, text).await
            }
        }
    }

    /// Move a client from its current room into `target`
    ///
    /// The target admits the client before the source lets it go, and
    /// the client's room is switched only after both have acknowledged.
    async fn move_to(&mut self, client_id: ClientId, target: RoomHandle) -> Result<(), AppError> {
        let Some(client) = self.clients.get(&client_id) else {
            return Ok(());
        };
        if client.room_name() == target.name() {
            return Err(AppError::AlreadyInRoom(target.name().clone()));
        }
        let peer = client.peer.clone();
        let source = client.room.clone();

        self.admit(&target, peer).await?;
        self.leave(&source, client_id, Departure::Left).await?;

        if let Some(client) = self.clients.get_mut(&client_id) {
            client.room = target.clone();
        }

        self.joined(&target, client_id).await
    }

    /// `/quit`: acknowledge, drop the client from its room and from
    /// tracking, and have its connection task close the transport
    async fn quit(&mut self, client_id: ClientId) -> Result<(), AppError> {
        let Some(mut client) = self.clients.remove(&client_id) else {
            return Ok(());
        };

        let _ = client.peer.send(&Notice::Quitting);
        let room = client.room.clone();
        let result = self.leave(&room, client_id, Departure::Quit).await;

        client.close();
        info!("User quit: {} ({})", client.name(), client.id());
        result
    }

    async fn handle_disconnect(&mut self, client_id: ClientId) -> Result<(), AppError> {
        let Some(client) = self.clients.remove(&client_id) else {
            debug!("Disconnect for untracked client {}", client_id);
            return Ok(());
        };

        info!("{} disconnected", client.name());
        self.leave(&client.room, client_id, Departure::Disconnected)
            .await
    }

    /// The default room's state when `room` is the default room. Its
    /// events are handled inline since this loop is the one draining it.
    fn local(&mut self, room: &RoomHandle) -> Option<&mut RoomState> {
        (room.name() == self.lobby.state.name()).then_some(&mut self.lobby.state)
    }

    async fn admit(&mut self, room: &RoomHandle, peer: Peer) -> Result<(), AppError> {
        match self.local(room) {
            Some(state) => {
                state.handle(RoomEvent::admit(peer).0);
                Ok(())
            }
            None => room.admit(peer).await,
        }
    }

    async fn joined(&mut self, room: &RoomHandle, client_id: ClientId) -> Result<(), AppError> {
        match self.local(room) {
            Some(state) => {
                state.handle(RoomEvent::Joined { client_id });
                Ok(())
            }
            None => room.joined(client_id).await,
        }
    }

    async fn leave(
        &mut self,
        room: &RoomHandle,
        client_id: ClientId,
        departure: Departure,
    ) -> Result<(), AppError> {
        match self.local(room) {
            Some(state) => {
                state.handle(RoomEvent::leave(client_id, departure).0);
                Ok(())
            }
            None => room.leave(client_id, departure).await,
        }
    }

    async fn broadcast(&mut self, room: &RoomHandle, text: String) -> Result<(), AppError> {
        match self.local(room) {
            Some(state) => {
                state.handle(RoomEvent::Broadcast { text });
                Ok(())
            }
            None => room.broadcast(text).await,
        }
    }

    /// Write directly to one client. A dead writer is ignored here; its
    /// read side reports the disconnect.
    fn reply(&self, client_id: ClientId, notice: &Notice) {
        if let Some(client) = self.clients.get(&client_id) {
            let _ = client.peer.send(notice);
        }
    }
}

/// Run the chat server on an already-bound listener
///
/// Spawns the dispatcher, then accepts connections until the listener
/// fails. An accept failure is fatal and is returned to the caller.
pub async fn serve(listener: TcpListener, config: ServerConfig) -> Result<(), AppError> {
    config.validate()?;
    let config = Arc::new(config);

    let (cmd_tx, cmd_rx) = mpsc::channel(config.mailbox_capacity.get());
    let dispatcher = Dispatcher::new(
        RoomName::from(config.default_room.as_str()),
        config.mailbox_capacity.get(),
        cmd_rx,
    );
    tokio::spawn(dispatcher.run());

    loop {
        let (stream, addr) = listener.accept().await?;
        info!("New connection from {}", addr);

        let cmd_tx = cmd_tx.clone();
        let config = Arc::clone(&config);
        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream, cmd_tx, config).await {
                error!("Connection handler error: {}", e);
            }
        });
    }
}
