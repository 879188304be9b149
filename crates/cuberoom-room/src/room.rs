//! Room actor: an isolated Tokio task that owns one room's state.
//!
//! Each room runs in its own task and talks to the outside world only
//! through an mpsc channel. Commands are handled strictly one at a time
//! and every hook runs to completion before the next command is read,
//! so room state needs no locking.

use std::collections::HashMap;

use cuberoom_protocol::{Recipient, RoomId, SessionId};
use tokio::sync::{mpsc, oneshot};

use crate::logic::Outbox;
use crate::{RoomConfig, RoomError, RoomLifecycle, RoomLogic};

/// An outbound item from the room actor to a client's connection handler.
#[derive(Debug)]
pub enum RoomOutbound<G: RoomLogic> {
    /// A message produced by the room logic.
    Message(G::ServerMessage),
    /// The room was disposed while this client was still a member.
    Closed(RoomId),
}

impl<G: RoomLogic> Clone for RoomOutbound<G> {
    fn clone(&self) -> Self {
        match self {
            Self::Message(m) => Self::Message(m.clone()),
            Self::Closed(room_id) => Self::Closed(*room_id),
        }
    }
}

/// Channel sender for delivering outbound items to one client.
///
/// Unbounded: the room never waits on a slow client. If the receiver
/// is gone the item is dropped.
pub type ClientSender<G> = mpsc::UnboundedSender<RoomOutbound<G>>;

/// Commands sent to a room actor through its channel.
pub(crate) enum RoomCommand<G: RoomLogic> {
    Join {
        session_id: SessionId,
        options: G::Options,
        sender: ClientSender<G>,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },

    /// Replies with the number of members left after removal.
    Leave {
        session_id: SessionId,
        consented: bool,
        reply: oneshot::Sender<Result<usize, RoomError>>,
    },

    Message {
        sender: SessionId,
        msg: G::ClientMessage,
    },

    GetInfo {
        reply: oneshot::Sender<RoomInfo>,
    },

    Dispose {
        reply: oneshot::Sender<()>,
    },
}

/// A snapshot of room metadata (not the room's game state).
#[derive(Debug, Clone)]
pub struct RoomInfo {
    /// The room's unique ID.
    pub room_id: RoomId,
    /// Current lifecycle state.
    pub lifecycle: RoomLifecycle,
    /// Number of sessions currently in the room.
    pub client_count: usize,
    /// Capacity.
    pub max_clients: usize,
    /// Display name from the room logic, if it has one.
    pub name: Option<String>,
    /// Whether the room appears in lobby listings.
    pub listed: bool,
}

impl RoomInfo {
    /// Returns `true` if a new session could join right now.
    pub fn has_capacity(&self) -> bool {
        self.lifecycle.accepts_events() && self.client_count < self.max_clients
    }
}

/// Handle to a running room actor.
///
/// Cheap to clone; it only wraps the command sender.
pub struct RoomHandle<G: RoomLogic> {
    room_id: RoomId,
    sender: mpsc::Sender<RoomCommand<G>>,
}

impl<G: RoomLogic> Clone for RoomHandle<G> {
    fn clone(&self) -> Self {
        Self {
            room_id: self.room_id,
            sender: self.sender.clone(),
        }
    }
}

impl<G: RoomLogic> RoomHandle<G> {
    /// Returns the room's unique ID.
    pub fn room_id(&self) -> RoomId {
        self.room_id
    }

    /// Asks the room to admit a session.
    pub async fn join(
        &self,
        session_id: SessionId,
        options: G::Options,
        sender: ClientSender<G>,
    ) -> Result<(), RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Join {
                session_id,
                options,
                sender,
                reply: reply_tx,
            })
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id))?;
        reply_rx
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id))?
    }

    /// Removes a session and returns how many members remain.
    pub async fn leave(
        &self,
        session_id: SessionId,
        consented: bool,
    ) -> Result<usize, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Leave {
                session_id,
                consented,
                reply: reply_tx,
            })
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id))?;
        reply_rx
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id))?
    }

    /// Delivers a client message to the room (fire-and-forget).
    pub async fn send_message(
        &self,
        sender: SessionId,
        msg: G::ClientMessage,
    ) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::Message { sender, msg })
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id))
    }

    /// Requests the current room info.
    pub async fn get_info(&self) -> Result<RoomInfo, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::GetInfo { reply: reply_tx })
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id))?;
        reply_rx
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id))
    }

    /// Disposes the room and waits until the actor has finished.
    pub async fn dispose(&self) -> Result<(), RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Dispose { reply: reply_tx })
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id))?;
        reply_rx
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id))
    }
}

/// The internal room actor. Runs inside a Tokio task.
struct RoomActor<G: RoomLogic> {
    room_id: RoomId,
    lifecycle: RoomLifecycle,
    config: RoomConfig,
    /// Current members and their outbound channels.
    members: HashMap<SessionId, ClientSender<G>>,
    state: G::State,
    receiver: mpsc::Receiver<RoomCommand<G>>,
}

impl<G: RoomLogic> RoomActor<G> {
    /// Runs the actor loop until the room is disposed or every handle
    /// has been dropped.
    async fn run(mut self) {
        self.transition(RoomLifecycle::Active);
        tracing::info!(room_id = %self.room_id, "room actor started");

        let mut dispose_reply = None;
        while let Some(cmd) = self.receiver.recv().await {
            match cmd {
                RoomCommand::Join {
                    session_id,
                    options,
                    sender,
                    reply,
                } => {
                    let result = self.handle_join(session_id, options, sender);
                    let _ = reply.send(result);
                }
                RoomCommand::Leave {
                    session_id,
                    consented,
                    reply,
                } => {
                    let result = self.handle_leave(session_id, consented);
                    let _ = reply.send(result);
                }
                RoomCommand::Message { sender, msg } => {
                    self.handle_message(sender, msg);
                }
                RoomCommand::GetInfo { reply } => {
                    let _ = reply.send(self.info());
                }
                RoomCommand::Dispose { reply } => {
                    dispose_reply = Some(reply);
                    break;
                }
            }
        }

        self.dispose();
        if let Some(reply) = dispose_reply {
            let _ = reply.send(());
        }
    }

    fn handle_join(
        &mut self,
        session_id: SessionId,
        options: G::Options,
        sender: ClientSender<G>,
    ) -> Result<(), RoomError> {
        if !self.lifecycle.accepts_events() {
            return Err(RoomError::InvalidState(format!(
                "cannot join room in state {}",
                self.lifecycle
            )));
        }
        if self.members.contains_key(&session_id) {
            return Err(RoomError::AlreadyInRoom(session_id, self.room_id));
        }
        if self.members.len() >= self.config.max_clients {
            return Err(RoomError::RoomFull(self.room_id));
        }

        self.members.insert(session_id.clone(), sender);
        tracing::info!(
            room_id = %self.room_id,
            %session_id,
            clients = self.members.len(),
            "client joined"
        );

        let outbox = G::on_join(&mut self.state, &session_id, &options);
        self.dispatch(outbox);
        Ok(())
    }

    fn handle_leave(
        &mut self,
        session_id: SessionId,
        consented: bool,
    ) -> Result<usize, RoomError> {
        if self.members.remove(&session_id).is_none() {
            return Err(RoomError::NotInRoom(session_id, self.room_id));
        }

        tracing::info!(
            room_id = %self.room_id,
            %session_id,
            consented,
            clients = self.members.len(),
            "client left"
        );

        let outbox = G::on_leave(&mut self.state, &session_id, consented);
        self.dispatch(outbox);
        Ok(self.members.len())
    }

    fn handle_message(&mut self, sender: SessionId, msg: G::ClientMessage) {
        if !self.members.contains_key(&sender) {
            tracing::warn!(
                room_id = %self.room_id,
                %sender,
                "message from non-member, ignoring"
            );
            return;
        }

        let outbox = G::on_message(&mut self.state, &sender, msg);
        self.dispatch(outbox);
    }

    fn dispose(&mut self) {
        self.transition(RoomLifecycle::Disposing);
        tracing::info!(room_id = %self.room_id, "room disposing");

        G::on_dispose(&mut self.state);
        for (_, sender) in self.members.drain() {
            let _ = sender.send(RoomOutbound::Closed(self.room_id));
        }

        self.transition(RoomLifecycle::Disposed);
        tracing::info!(room_id = %self.room_id, "room disposed");
    }

    fn transition(&mut self, target: RoomLifecycle) {
        debug_assert!(
            self.lifecycle.can_transition_to(target),
            "illegal room transition {} -> {}",
            self.lifecycle,
            target
        );
        self.lifecycle = target;
    }

    /// Delivers each outbound message to every member its recipient
    /// covers, in outbox order.
    fn dispatch(&self, outbox: Outbox<G::ServerMessage>) {
        for (recipient, msg) in outbox {
            match recipient {
                Recipient::Session(target) => {
                    self.send_to(&target, RoomOutbound::Message(msg));
                }
                broadcast => {
                    let outbound = RoomOutbound::Message(msg);
                    for (session_id, sender) in &self.members {
                        if broadcast.includes(session_id) {
                            let _ = sender.send(outbound.clone());
                        }
                    }
                }
            }
        }
    }

    /// Sends to a single member. Silently drops if the member is gone.
    fn send_to(&self, session_id: &SessionId, msg: RoomOutbound<G>) {
        if let Some(sender) = self.members.get(session_id) {
            let _ = sender.send(msg);
        }
    }

    fn info(&self) -> RoomInfo {
        RoomInfo {
            room_id: self.room_id,
            lifecycle: self.lifecycle,
            client_count: self.members.len(),
            max_clients: self.config.max_clients,
            name: G::display_name(&self.state),
            listed: self.config.listed,
        }
    }
}

/// Creates the room state and spawns its actor task.
///
/// `channel_size` bounds the command queue; senders wait when it is full.
pub(crate) fn spawn_room<G: RoomLogic>(
    room_id: RoomId,
    config: RoomConfig,
    options: &G::Options,
    channel_size: usize,
) -> RoomHandle<G> {
    let (tx, rx) = mpsc::channel(channel_size);

    let actor = RoomActor::<G> {
        room_id,
        lifecycle: RoomLifecycle::Created,
        config,
        members: HashMap::new(),
        state: G::on_create(room_id, options),
        receiver: rx,
    };

    tokio::spawn(actor.run());

    RoomHandle {
        room_id,
        sender: tx,
    }
}
