use std::collections::HashMap;
use std::sync::{Arc, Weak};
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::player::{ParticipantSummary, PlayerId};
use super::session::{GameSession, Phase, TurnOutcome};
use super::tile::{Placement, TileId};
use super::timer::Timer;
use super::{RECONNECT_GRACE, TURN_DURATION};
use crate::dictionary::WordOracle;
use crate::error::{GameError, Result};
use crate::protocol::ServerMessage;

pub type RoomHandle = Arc<Mutex<Room>>;
pub type Outbox = UnboundedSender<ServerMessage>;

/// Sent to whoever owns the room when its membership changes on its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomEvent {
    ParticipantRemoved { code: String, player_id: PlayerId },
    Empty { code: String },
}

/// One game plus the people connected to it. Every mutation goes through the
/// room's mutex, so a session only ever sees one intent at a time.
#[derive(Debug)]
pub struct Room {
    code: String,
    creator: Option<PlayerId>,
    session: GameSession,
    connections: HashMap<PlayerId, Outbox>,
    grace_timers: HashMap<PlayerId, (u64, Timer)>,
    grace_serial: u64,
    deadline: Timer,
    oracle: Arc<dyn WordOracle>,
    events: UnboundedSender<RoomEvent>,
    closed: bool,
    this: Weak<Mutex<Room>>,
}

impl Room {
    /// Builds a room with its creator already seated.
    pub fn create(
        code: String,
        session: GameSession,
        oracle: Arc<dyn WordOracle>,
        events: UnboundedSender<RoomEvent>,
        creator_name: String,
        outbox: Outbox,
    ) -> Result<(RoomHandle, PlayerId)> {
        let mut room = Room {
            code,
            creator: None,
            session,
            connections: HashMap::new(),
            grace_timers: HashMap::new(),
            grace_serial: 0,
            deadline: Timer::new(),
            oracle,
            events,
            closed: false,
            this: Weak::new(),
        };
        let player_id = room.seat(creator_name, outbox)?;

        let handle = Arc::new_cyclic(|this| {
            room.this = this.clone();
            Mutex::new(room)
        });
        Ok((handle, player_id))
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn creator(&self) -> Option<&PlayerId> {
        self.creator.as_ref()
    }

    pub fn session(&self) -> &GameSession {
        &self.session
    }

    pub fn is_connected(&self, player_id: &PlayerId) -> bool {
        self.connections.contains_key(player_id)
    }

    /// True when `outbox` is still the live connection for this seat, i.e. the
    /// player has not since reconnected on another socket.
    pub fn is_connected_via(&self, player_id: &PlayerId, outbox: &Outbox) -> bool {
        self.connections
            .get(player_id)
            .is_some_and(|current| current.same_channel(outbox))
    }

    pub fn is_awaiting_reconnect(&self, player_id: &PlayerId) -> bool {
        self.grace_timers.contains_key(player_id)
    }

    /// Nobody connected and nobody we are still waiting on.
    pub fn is_empty(&self) -> bool {
        self.connections.is_empty() && self.grace_timers.is_empty()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn close(&mut self) {
        self.closed = true;
        self.deadline.cancel();
        for (_, timer) in self.grace_timers.values_mut() {
            timer.cancel();
        }
    }

    fn seat(&mut self, name: String, outbox: Outbox) -> Result<PlayerId> {
        let player_id = PlayerId::generate();
        self.session.add_participant(player_id.clone(), name)?;
        self.connections.insert(player_id.clone(), outbox);
        if self.creator.is_none() {
            self.creator = Some(player_id.clone());
        }
        Ok(player_id)
    }

    pub fn join(&mut self, name: String, outbox: Outbox) -> Result<PlayerId> {
        if self.closed {
            return Err(GameError::RoomNotFound(self.code.clone()));
        }
        let player_id = self.seat(name, outbox)?;
        info!(room = %self.code, player = %player_id, "participant joined");

        let participants = self.summaries();
        self.send_to(
            &player_id,
            ServerMessage::RoomJoined {
                code: self.code.clone(),
                player_id: player_id.clone(),
                participants: participants.clone(),
            },
        );
        if let Some(joined) = participants.into_iter().find(|p| p.id == player_id) {
            self.broadcast_except(&player_id, ServerMessage::ParticipantJoined { participant: joined });
        }
        Ok(player_id)
    }

    pub fn start(&mut self, requester: &PlayerId) -> Result<()> {
        if self.creator.as_ref() != Some(requester) {
            return Err(GameError::NotCreator);
        }
        self.session.start()?;
        info!(room = %self.code, "game started");
        self.arm_deadline();
        self.broadcast_state();
        Ok(())
    }

    pub fn play(&mut self, player_id: &PlayerId, placements: &[Placement]) -> Result<()> {
        let outcome = self.session.play(player_id, placements, self.oracle.as_ref())?;
        self.after_turn(outcome);
        Ok(())
    }

    pub fn exchange(&mut self, player_id: &PlayerId, tile_ids: &[TileId]) -> Result<()> {
        let outcome = self.session.exchange(player_id, tile_ids)?;
        self.after_turn(outcome);
        Ok(())
    }

    pub fn pass(&mut self, player_id: &PlayerId) -> Result<()> {
        let outcome = self.session.pass(player_id)?;
        self.after_turn(outcome);
        Ok(())
    }

    /// Called by the deadline timer. A stale serial means someone already acted.
    pub fn expire_turn(&mut self, serial: u64) {
        if let Some(outcome) = self.session.expire_turn(serial) {
            info!(room = %self.code, player = %outcome.record.player, "turn deadline expired");
            self.after_turn(outcome);
        }
    }

    fn after_turn(&mut self, outcome: TurnOutcome) {
        if outcome.finished {
            self.deadline.cancel();
            self.broadcast_game_over();
        } else {
            self.arm_deadline();
            self.broadcast_state();
        }
    }

    fn arm_deadline(&mut self) {
        let serial = self.session.turn_serial();
        let room = self.this.clone();
        self.deadline.arm(TURN_DURATION, async move {
            if let Some(room) = room.upgrade() {
                room.lock().await.expire_turn(serial);
            }
        });
    }

    /// Explicit departure. Before the game this frees the seat; once it has
    /// started the seat is held for a reconnect like any other drop.
    pub fn leave(&mut self, player_id: &PlayerId) {
        match self.session.phase() {
            Phase::Playing => self.disconnect(player_id),
            Phase::Waiting => self.remove(player_id),
            Phase::Finished => {
                self.connections.remove(player_id);
                self.notify_if_empty();
            }
        }
    }

    pub fn disconnect(&mut self, player_id: &PlayerId) {
        if self.connections.remove(player_id).is_none() {
            return;
        }

        match self.session.phase() {
            Phase::Playing => {
                info!(room = %self.code, player = %player_id, "participant disconnected, holding seat");
                self.grace_serial += 1;
                let serial = self.grace_serial;
                let room = self.this.clone();
                let absent = player_id.clone();
                let mut timer = Timer::new();
                timer.arm(RECONNECT_GRACE, async move {
                    if let Some(room) = room.upgrade() {
                        room.lock().await.expire_grace(&absent, serial);
                    }
                });
                self.grace_timers.insert(player_id.clone(), (serial, timer));
                self.broadcast(ServerMessage::ParticipantDisconnected {
                    player_id: player_id.clone(),
                });
            }
            Phase::Waiting => self.remove(player_id),
            Phase::Finished => self.notify_if_empty(),
        }
    }

    fn remove(&mut self, player_id: &PlayerId) {
        self.connections.remove(player_id);
        if !self.session.remove_participant(player_id) {
            return;
        }
        info!(room = %self.code, player = %player_id, "participant left");

        if self.creator.as_ref() == Some(player_id) {
            self.creator = self.session.participants().first().map(|p| p.id.clone());
        }
        self.broadcast(ServerMessage::ParticipantLeft {
            player_id: player_id.clone(),
        });
        self.notify_if_empty();
    }

    /// Grace period ran out without a reconnect: the seat is given up for good.
    /// `serial` ties the expiry to one particular disconnect.
    pub fn expire_grace(&mut self, player_id: &PlayerId, serial: u64) {
        match self.grace_timers.get(player_id) {
            Some((armed, _)) if *armed == serial => {}
            _ => return,
        }
        self.grace_timers.remove(player_id);
        if self.is_connected(player_id) {
            return;
        }
        warn!(room = %self.code, player = %player_id, "reconnect grace expired");

        // A finished game keeps every seat for the final standings.
        let Some(outcome) = self.session.forfeit(player_id) else {
            self.notify_if_empty();
            return;
        };
        self.broadcast(ServerMessage::ParticipantLeft {
            player_id: player_id.clone(),
        });
        if outcome.finished {
            self.deadline.cancel();
            self.broadcast_game_over();
        } else {
            if outcome.turn_changed {
                self.arm_deadline();
            }
            self.broadcast_state();
        }

        self.emit(RoomEvent::ParticipantRemoved {
            code: self.code.clone(),
            player_id: player_id.clone(),
        });
        self.notify_if_empty();
    }

    pub fn reconnect(&mut self, player_id: &PlayerId, outbox: Outbox) -> Result<()> {
        if self.closed {
            return Err(GameError::RoomNotFound(self.code.clone()));
        }
        if !self.session.contains(player_id) {
            return Err(GameError::UnknownParticipant);
        }

        if let Some((_, mut timer)) = self.grace_timers.remove(player_id) {
            timer.cancel();
        }
        self.connections.insert(player_id.clone(), outbox);
        info!(room = %self.code, player = %player_id, "participant reconnected");

        self.send_to(
            player_id,
            ServerMessage::Reconnected {
                code: self.code.clone(),
                player_id: player_id.clone(),
            },
        );
        self.broadcast_except(
            player_id,
            ServerMessage::ParticipantReconnected {
                player_id: player_id.clone(),
            },
        );
        match self.session.phase() {
            Phase::Finished => self.send_to(player_id, self.game_over_message()),
            _ => self.send_to(player_id, self.state_message(player_id)),
        }
        Ok(())
    }

    fn notify_if_empty(&self) {
        if self.is_empty() {
            debug!(room = %self.code, "room is empty");
            self.emit(RoomEvent::Empty {
                code: self.code.clone(),
            });
        }
    }

    fn emit(&self, event: RoomEvent) {
        if let Err(e) = self.events.send(event) {
            debug!(room = %self.code, error = %e, "room events receiver gone");
        }
    }

    fn summaries(&self) -> Vec<ParticipantSummary> {
        self.session
            .participants()
            .iter()
            .map(|p| p.summary(self.is_connected(&p.id)))
            .collect()
    }

    fn state_message(&self, viewer: &PlayerId) -> ServerMessage {
        ServerMessage::State {
            view: Box::new(self.session.view_for(viewer, |id| self.is_connected(id))),
        }
    }

    fn game_over_message(&self) -> ServerMessage {
        ServerMessage::GameOver {
            result: Box::new(self.session.game_over_view(|id| self.is_connected(id))),
        }
    }

    /// Everyone gets the shared state plus their own rack.
    pub fn broadcast_state(&self) {
        for (player_id, outbox) in &self.connections {
            if outbox.send(self.state_message(player_id)).is_err() {
                debug!(room = %self.code, player = %player_id, "outbox closed");
            }
        }
    }

    pub fn broadcast_game_over(&self) {
        self.broadcast(self.game_over_message());
    }

    pub fn send_to(&self, player_id: &PlayerId, message: ServerMessage) {
        if let Some(outbox) = self.connections.get(player_id) {
            if outbox.send(message).is_err() {
                debug!(room = %self.code, player = %player_id, "outbox closed");
            }
        }
    }

    pub fn broadcast(&self, message: ServerMessage) {
        for (player_id, outbox) in &self.connections {
            if outbox.send(message.clone()).is_err() {
                debug!(room = %self.code, player = %player_id, "outbox closed");
            }
        }
    }

    fn broadcast_except(&self, skip: &PlayerId, message: ServerMessage) {
        for (player_id, outbox) in self.connections.iter().filter(|(id, _)| *id != skip) {
            if outbox.send(message.clone()).is_err() {
                debug!(room = %self.code, player = %player_id, "outbox closed");
            }
        }
    }
}
