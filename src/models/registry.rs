use rand::Rng;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::player::PlayerId;
use super::room::{Outbox, Room, RoomEvent, RoomHandle};
use super::session::GameSession;
use crate::dictionary::WordOracle;
use crate::error::{GameError, Result};

const CODE_LENGTH: usize = 4;

/// Live rooms by code. The lock only guards the map; gameplay locks the room.
/// Lock order is registry then room, never the reverse.
#[derive(Debug, Clone)]
pub struct RoomRegistry {
    rooms: Arc<Mutex<HashMap<String, RoomHandle>>>,
    oracle: Arc<dyn WordOracle>,
    events: UnboundedSender<RoomEvent>,
}

impl RoomRegistry {
    pub fn new(oracle: Arc<dyn WordOracle>) -> Self {
        let (events, events_rx) = mpsc::unbounded_channel();
        let rooms = Arc::new(Mutex::new(HashMap::new()));

        tokio::spawn(Self::reap_empty_rooms(Arc::clone(&rooms), events_rx));

        Self {
            rooms,
            oracle,
            events,
        }
    }

    pub async fn create_room(&self, name: String, outbox: Outbox) -> Result<(String, PlayerId, RoomHandle)> {
        let mut rooms = self.rooms.lock().await;
        let code = Self::unused_code(&rooms);
        let (room, player_id) = Room::create(
            code.clone(),
            GameSession::default(),
            Arc::clone(&self.oracle),
            self.events.clone(),
            name,
            outbox,
        )?;
        rooms.insert(code.clone(), Arc::clone(&room));
        info!(room = %code, creator = %player_id, "room created");
        Ok((code, player_id, room))
    }

    pub async fn get(&self, code: &str) -> Result<RoomHandle> {
        self.rooms
            .lock()
            .await
            .get(&code.to_uppercase())
            .cloned()
            .ok_or_else(|| GameError::RoomNotFound(code.to_string()))
    }

    pub async fn join_room(&self, code: &str, name: String, outbox: Outbox) -> Result<(PlayerId, RoomHandle)> {
        let room = self.get(code).await?;
        let player_id = room.lock().await.join(name, outbox)?;
        Ok((player_id, room))
    }

    pub async fn reconnect(&self, code: &str, player_id: &PlayerId, outbox: Outbox) -> Result<RoomHandle> {
        let room = self.get(code).await?;
        room.lock().await.reconnect(player_id, outbox)?;
        Ok(room)
    }

    pub async fn len(&self) -> usize {
        self.rooms.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    fn unused_code(rooms: &HashMap<String, RoomHandle>) -> String {
        let mut rng = rand::thread_rng();
        loop {
            let code: String = (0..CODE_LENGTH)
                .map(|_| rng.gen_range(b'A'..=b'Z') as char)
                .collect();
            if !rooms.contains_key(&code) {
                return code;
            }
        }
    }

    async fn reap_empty_rooms(
        rooms: Arc<Mutex<HashMap<String, RoomHandle>>>,
        mut events: UnboundedReceiver<RoomEvent>,
    ) {
        while let Some(event) = events.recv().await {
            match event {
                RoomEvent::Empty { code } => {
                    let mut rooms = rooms.lock().await;
                    let Some(room) = rooms.get(&code).cloned() else {
                        continue;
                    };
                    let mut room = room.lock().await;
                    // Someone may have come back between the event and now.
                    if room.is_empty() {
                        room.close();
                        rooms.remove(&code);
                        info!(room = %code, "room evicted");
                    }
                }
                RoomEvent::ParticipantRemoved { code, player_id } => {
                    debug!(room = %code, player = %player_id, "participant removed after grace period");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dictionary::Dictionary;
    use crate::models::{Phase, RECONNECT_GRACE};
    use crate::protocol::ServerMessage;
    use std::time::Duration;
    use tokio::sync::mpsc::UnboundedReceiver;

    fn registry() -> RoomRegistry {
        RoomRegistry::new(Arc::new(Dictionary::from_words(["ねこ"])))
    }

    fn outbox() -> (Outbox, UnboundedReceiver<ServerMessage>) {
        mpsc::unbounded_channel()
    }

    #[tokio::test]
    async fn test_create_then_lookup_case_insensitive() {
        let registry = registry();
        let (tx, _rx) = outbox();
        let (code, player_id, _) = registry.create_room("alice".to_string(), tx).await.unwrap();
        assert_eq!(code.len(), CODE_LENGTH);
        assert!(code.chars().all(|c| c.is_ascii_uppercase()));

        let room = registry.get(&code.to_lowercase()).await.unwrap();
        assert_eq!(room.lock().await.creator(), Some(&player_id));
        assert!(matches!(
            registry.get("ZZZZZ").await,
            Err(GameError::RoomNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_join_rules() {
        let registry = registry();
        let (tx, _rx) = outbox();
        let (code, host, room) = registry.create_room("host".to_string(), tx).await.unwrap();

        let mut keep = Vec::new();
        for n in 0..3 {
            let (tx, rx) = outbox();
            keep.push(rx);
            registry.join_room(&code, format!("guest {n}"), tx).await.unwrap();
        }
        let (tx, _rx) = outbox();
        assert_eq!(
            registry.join_room(&code, "fifth".to_string(), tx).await.unwrap_err(),
            GameError::RoomFull
        );

        room.lock().await.start(&host).unwrap();
        let (tx, _rx) = outbox();
        assert!(matches!(
            registry.join_room("NOPE", "x".to_string(), tx).await,
            Err(GameError::RoomNotFound(_))
        ));
        assert_eq!(room.lock().await.session().phase(), Phase::Playing);
    }

    #[tokio::test]
    async fn test_started_room_refuses_joiners() {
        let registry = registry();
        let (tx, _rx) = outbox();
        let (code, host, room) = registry.create_room("host".to_string(), tx).await.unwrap();
        let (tx, _guest_rx) = outbox();
        registry.join_room(&code, "guest".to_string(), tx).await.unwrap();
        room.lock().await.start(&host).unwrap();

        let (tx, _rx) = outbox();
        assert_eq!(
            registry.join_room(&code, "late".to_string(), tx).await.unwrap_err(),
            GameError::AlreadyStarted
        );
    }

    #[tokio::test]
    async fn test_last_leaver_evicts_waiting_room() {
        let registry = registry();
        let (tx, _rx) = outbox();
        let (code, host, room) = registry.create_room("host".to_string(), tx).await.unwrap();

        room.lock().await.leave(&host);
        tokio::task::yield_now().await;
        for _ in 0..10 {
            if registry.is_empty().await {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert!(registry.is_empty().await);
        assert!(room.lock().await.is_closed());
        assert!(matches!(
            registry.get(&code).await,
            Err(GameError::RoomNotFound(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_abandoned_game_evicted_after_grace() {
        let registry = registry();
        let (tx, _rx) = outbox();
        let (code, host, room) = registry.create_room("host".to_string(), tx).await.unwrap();
        let (tx, _guest_rx) = outbox();
        let (guest, _) = registry.join_room(&code, "guest".to_string(), tx).await.unwrap();
        room.lock().await.start(&host).unwrap();

        {
            let mut room = room.lock().await;
            room.disconnect(&host);
            room.disconnect(&guest);
        }
        assert_eq!(registry.len().await, 1);

        tokio::time::sleep(RECONNECT_GRACE + Duration::from_secs(1)).await;
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert!(registry.is_empty().await);
    }
}
