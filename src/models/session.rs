use serde::Serialize;
use std::collections::{HashMap, HashSet};
use tokio::time::Instant;
use tracing::{debug, info};

use super::board::Board;
use super::bonus::BONUS_LAYOUT;
use super::player::{Participant, ParticipantSummary, PlayerId};
use super::scoring::{score_turn, WordScore};
use super::tile::{Placement, Tile, TileId};
use super::tile_pool::TilePool;
use super::validator::{FormedWord, PlacementValidator};
use super::{MAX_PARTICIPANTS, MIN_PARTICIPANTS, RACK_CAPACITY, TURN_DURATION};
use crate::dictionary::WordOracle;
use crate::error::{GameError, Result};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Waiting,
    Playing,
    Finished,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnAction {
    Play,
    Exchange,
    Pass,
    ForcedPass,
}

/// History entry for display. Never consulted by the rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TurnRecord {
    pub player: PlayerId,
    pub action: TurnAction,
    pub words: Vec<WordScore>,
    pub score: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnOutcome {
    pub record: TurnRecord,
    pub finished: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForfeitOutcome {
    pub turn_changed: bool,
    pub finished: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct GameView {
    pub phase: Phase,
    pub board: Board,
    pub participants: Vec<ParticipantSummary>,
    pub rack: Vec<Tile>,
    pub current_player: Option<PlayerId>,
    pub pool_remaining: usize,
    pub seconds_left: Option<u64>,
    pub first_move: bool,
    pub last_turn: Option<TurnRecord>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GameOverView {
    pub board: Board,
    pub standings: Vec<ParticipantSummary>,
    pub winners: Vec<PlayerId>,
    pub history: Vec<TurnRecord>,
}

#[derive(Debug)]
pub struct GameSession {
    phase: Phase,
    participants: Vec<Participant>,
    current: usize,
    consecutive_passes: usize,
    first_move: bool,
    deadline: Option<Instant>,
    turn_serial: u64,
    board: Board,
    pool: TilePool,
    history: Vec<TurnRecord>,
    winners: Vec<PlayerId>,
}

impl Default for GameSession {
    fn default() -> Self {
        Self::new(TilePool::new())
    }
}

impl GameSession {
    pub fn new(pool: TilePool) -> Self {
        Self {
            phase: Phase::Waiting,
            participants: Vec::new(),
            current: 0,
            consecutive_passes: 0,
            first_move: true,
            deadline: None,
            turn_serial: 0,
            board: Board::new(),
            pool,
            history: Vec::new(),
            winners: Vec::new(),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    pub fn participant(&self, id: &PlayerId) -> Option<&Participant> {
        self.participants.iter().find(|p| &p.id == id)
    }

    pub fn contains(&self, id: &PlayerId) -> bool {
        self.participant(id).is_some()
    }

    pub fn current_player(&self) -> Option<&Participant> {
        match self.phase {
            Phase::Playing => self.participants.get(self.current),
            _ => None,
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn pool_remaining(&self) -> usize {
        self.pool.remaining()
    }

    pub fn turn_serial(&self) -> u64 {
        self.turn_serial
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn history(&self) -> &[TurnRecord] {
        &self.history
    }

    pub fn winners(&self) -> &[PlayerId] {
        &self.winners
    }

    pub fn is_first_move(&self) -> bool {
        self.first_move
    }

    pub fn add_participant(&mut self, id: PlayerId, name: String) -> Result<()> {
        if self.phase != Phase::Waiting {
            return Err(GameError::AlreadyStarted);
        }
        if self.participants.len() >= MAX_PARTICIPANTS {
            return Err(GameError::RoomFull);
        }
        debug!(player = %id, name, "participant seated");
        self.participants.push(Participant::new(id, name));
        Ok(())
    }

    /// Frees a seat before the game starts. Seats are kept once play begins.
    pub fn remove_participant(&mut self, id: &PlayerId) -> bool {
        if self.phase != Phase::Waiting {
            return false;
        }
        let before = self.participants.len();
        self.participants.retain(|p| &p.id != id);
        before != self.participants.len()
    }

    pub fn start(&mut self) -> Result<()> {
        if self.phase != Phase::Waiting {
            return Err(GameError::AlreadyStarted);
        }
        if self.participants.len() < MIN_PARTICIPANTS {
            return Err(GameError::TooFewParticipants);
        }

        for participant in &mut self.participants {
            let drawn = self.pool.draw_to_fill(participant.rack.len(), RACK_CAPACITY);
            participant.take_tiles(drawn);
        }
        self.phase = Phase::Playing;
        self.current = 0;
        self.deadline = Some(Instant::now() + TURN_DURATION);
        info!(
            participants = self.participants.len(),
            pool = self.pool.remaining(),
            "game started"
        );
        Ok(())
    }

    fn ensure_turn(&self, id: &PlayerId) -> Result<usize> {
        if self.phase != Phase::Playing {
            return Err(GameError::NotPlaying);
        }
        let index = self
            .participants
            .iter()
            .position(|p| &p.id == id)
            .ok_or(GameError::UnknownParticipant)?;
        if index != self.current {
            return Err(GameError::NotYourTurn);
        }
        Ok(index)
    }

    pub fn play(
        &mut self,
        id: &PlayerId,
        placements: &[Placement],
        oracle: &dyn WordOracle,
    ) -> Result<TurnOutcome> {
        let index = self.ensure_turn(id)?;
        let words = PlacementValidator::new(oracle).validate(
            &self.board,
            placements,
            &self.participants[index].rack,
            self.first_move,
        )?;
        let (scores, total) = score_turn(&words, placements.len(), &BONUS_LAYOUT);

        // Validation passed; nothing below can fail.
        let placed = Self::placed_tiles(&words);
        let participant = &mut self.participants[index];
        for placement in placements {
            let Some(mut tile) = participant.rack.remove(&placement.tile_id) else {
                continue;
            };
            if let Some(face) = placed.get(&(placement.row, placement.col)) {
                tile = face.clone();
            }
            self.board.place(placement.row, placement.col, tile);
        }
        let drawn = self.pool.draw_to_fill(participant.rack.len(), RACK_CAPACITY);
        participant.take_tiles(drawn);
        participant.score += total as i32;

        info!(
            player = %id,
            words = ?scores.iter().map(|s| s.word.as_str()).collect::<Vec<_>>(),
            score = total,
            "play committed"
        );

        self.first_move = false;
        self.consecutive_passes = 0;
        let record = TurnRecord {
            player: id.clone(),
            action: TurnAction::Play,
            words: scores,
            score: total,
        };
        Ok(self.close_turn(record, true))
    }

    fn placed_tiles(words: &[FormedWord]) -> HashMap<(usize, usize), Tile> {
        words
            .iter()
            .flat_map(|word| word.cells.iter())
            .filter(|cell| cell.new)
            .map(|cell| ((cell.row, cell.col), cell.tile.clone()))
            .collect()
    }

    pub fn exchange(&mut self, id: &PlayerId, tile_ids: &[TileId]) -> Result<TurnOutcome> {
        let index = self.ensure_turn(id)?;
        if tile_ids.is_empty() {
            return Err(GameError::EmptyExchange);
        }

        let participant = &self.participants[index];
        let mut seen = HashSet::new();
        let mut returned = Vec::with_capacity(tile_ids.len());
        for &tile_id in tile_ids {
            if !seen.insert(tile_id) {
                return Err(GameError::DuplicateTile(tile_id));
            }
            let tile = participant
                .rack
                .get(&tile_id)
                .ok_or(GameError::TileNotInRack(tile_id))?;
            returned.push(tile.clone());
        }

        let fresh = self.pool.exchange(returned)?;
        let participant = &mut self.participants[index];
        for tile_id in tile_ids {
            participant.rack.remove(tile_id);
        }
        participant.take_tiles(fresh);
        info!(player = %id, count = tile_ids.len(), "tiles exchanged");

        let record = TurnRecord {
            player: id.clone(),
            action: TurnAction::Exchange,
            words: Vec::new(),
            score: 0,
        };
        Ok(self.close_turn(record, false))
    }

    pub fn pass(&mut self, id: &PlayerId) -> Result<TurnOutcome> {
        self.ensure_turn(id)?;
        Ok(self.record_pass(TurnAction::Pass))
    }

    /// Deadline expiry for the turn numbered `serial`. Stale or late expiries are
    /// ignored, so only the first of a racing action and its deadline applies.
    pub fn expire_turn(&mut self, serial: u64) -> Option<TurnOutcome> {
        if self.phase != Phase::Playing || serial != self.turn_serial {
            debug!(serial, current = self.turn_serial, "stale deadline ignored");
            return None;
        }
        Some(self.record_pass(TurnAction::ForcedPass))
    }

    fn record_pass(&mut self, action: TurnAction) -> TurnOutcome {
        let player = self.participants[self.current].id.clone();
        self.consecutive_passes += 1;
        debug!(player = %player, ?action, streak = self.consecutive_passes, "turn passed");
        let record = TurnRecord {
            player,
            action,
            words: Vec::new(),
            score: 0,
        };
        self.close_turn(record, true)
    }

    fn close_turn(&mut self, record: TurnRecord, check_end: bool) -> TurnOutcome {
        self.history.push(record.clone());
        self.advance();
        let finished = check_end && self.check_end();
        TurnOutcome { record, finished }
    }

    fn advance(&mut self) {
        if !self.participants.is_empty() {
            self.current = (self.current + 1) % self.participants.len();
        }
        self.rearm();
    }

    fn rearm(&mut self) {
        self.turn_serial += 1;
        self.deadline = Some(Instant::now() + TURN_DURATION);
    }

    fn check_end(&mut self) -> bool {
        let passed_out = self.consecutive_passes >= 2 * self.participants.len();
        let played_out = self.pool.is_empty() && self.participants.iter().any(|p| p.rack.is_empty());
        if passed_out || played_out {
            self.finish();
            true
        } else {
            false
        }
    }

    fn finish(&mut self) {
        self.phase = Phase::Finished;
        self.deadline = None;
        for participant in &mut self.participants {
            participant.score -= participant.rack_value();
        }
        let top = self.participants.iter().map(|p| p.score).max();
        self.winners = self
            .participants
            .iter()
            .filter(|p| Some(p.score) == top)
            .map(|p| p.id.clone())
            .collect();
        info!(winners = ?self.winners, "game finished");
    }

    /// Drops a seat for good. Before the game this is just leaving; during play
    /// the rack goes back to the pool and the turn moves on if it was theirs.
    pub fn forfeit(&mut self, id: &PlayerId) -> Option<ForfeitOutcome> {
        let index = self.participants.iter().position(|p| &p.id == id)?;
        match self.phase {
            Phase::Waiting => {
                self.participants.remove(index);
                Some(ForfeitOutcome {
                    turn_changed: false,
                    finished: false,
                })
            }
            Phase::Finished => None,
            Phase::Playing => {
                let leaver = self.participants.remove(index);
                self.pool.give_back(leaver.rack.into_values().collect());
                self.pool.shuffle();
                info!(player = %id, "seat forfeited");

                let turn_changed = index == self.current;
                if index < self.current {
                    self.current -= 1;
                }
                if !self.participants.is_empty() {
                    self.current %= self.participants.len();
                }
                if turn_changed {
                    self.rearm();
                }

                let finished = if self.participants.len() < MIN_PARTICIPANTS {
                    self.finish();
                    true
                } else {
                    self.check_end()
                };
                Some(ForfeitOutcome {
                    turn_changed,
                    finished,
                })
            }
        }
    }

    pub fn view_for(&self, viewer: &PlayerId, connected: impl Fn(&PlayerId) -> bool) -> GameView {
        let rack = self
            .participant(viewer)
            .map(|p| p.rack.values().cloned().collect())
            .unwrap_or_default();
        GameView {
            phase: self.phase,
            board: self.board.clone(),
            participants: self
                .participants
                .iter()
                .map(|p| p.summary(connected(&p.id)))
                .collect(),
            rack,
            current_player: self.current_player().map(|p| p.id.clone()),
            pool_remaining: self.pool.remaining(),
            seconds_left: self
                .deadline
                .map(|d| d.saturating_duration_since(Instant::now()).as_secs()),
            first_move: self.first_move,
            last_turn: self.history.last().cloned(),
        }
    }

    pub fn game_over_view(&self, connected: impl Fn(&PlayerId) -> bool) -> GameOverView {
        let mut standings: Vec<ParticipantSummary> = self
            .participants
            .iter()
            .map(|p| p.summary(connected(&p.id)))
            .collect();
        standings.sort_by(|a, b| b.score.cmp(&a.score));
        GameOverView {
            board: self.board.clone(),
            standings,
            winners: self.winners.clone(),
            history: self.history.clone(),
        }
    }

    /// Every tile the session knows about, wherever it currently sits.
    pub fn tiles_in_circulation(&self) -> usize {
        self.pool.remaining()
            + self.board.tile_count()
            + self.participants.iter().map(|p| p.rack.len()).sum::<usize>()
    }
}
