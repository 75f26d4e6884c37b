use axum::extract::ws::{Message, WebSocket};
use futures::{
    sink::SinkExt,
    stream::{SplitSink, SplitStream, StreamExt},
};
use tokio::{
    sync::{
        mpsc::{self, UnboundedReceiver},
        MutexGuard,
    },
    task::JoinHandle,
};
use tracing::{debug, info, warn};

use crate::error::{GameError, Result};
use crate::models::{Outbox, PlayerId, Room, RoomHandle, RoomRegistry};
use crate::protocol::{ClientMessage, ServerMessage};

/// The room and seat a connection speaks for once it has created, joined or
/// reconnected.
#[derive(Debug)]
struct Seat {
    code: String,
    player_id: PlayerId,
    room: RoomHandle,
}

pub struct WebSockets {}

impl WebSockets {
    pub async fn new(ws: WebSocket, registry: RoomRegistry) {
        let (sender, receiver) = ws.split();
        let (outbox, outbox_rx) = mpsc::unbounded_channel::<ServerMessage>();

        let mut send_task = Self::spawn_sender_task(outbox_rx, sender);
        let mut seat: Option<Seat> = None;

        tokio::select! {
            _ = Self::receive_messages(receiver, &outbox, &registry, &mut seat) => {}
            result = (&mut send_task) => {
                if let Err(e) = result {
                    warn!(error = ?e, "sender task failed");
                }
            }
        };
        send_task.abort();

        if let Some(seat) = seat {
            Self::cleanup(seat, &outbox).await;
        }
    }

    fn spawn_sender_task(
        mut outbox_rx: UnboundedReceiver<ServerMessage>,
        mut sender: SplitSink<WebSocket, Message>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            while let Some(message) = outbox_rx.recv().await {
                if let Err(error) = sender.send(Message::Text(message.to_json())).await {
                    debug!(error = ?error, "socket closed while sending");
                    break;
                }
            }
        })
    }

    async fn receive_messages(
        mut receiver: SplitStream<WebSocket>,
        outbox: &Outbox,
        registry: &RoomRegistry,
        seat: &mut Option<Seat>,
    ) {
        while let Some(frame) = receiver.next().await {
            let text = match frame {
                Ok(Message::Text(text)) => text,
                Ok(Message::Close(_)) => break,
                Ok(_) => continue,
                Err(error) => {
                    debug!(error = ?error, "socket read failed");
                    break;
                }
            };

            let result = match ClientMessage::parse(&text) {
                Ok(message) => Self::dispatch(message, outbox, registry, seat).await,
                Err(e) => Err(e),
            };
            if let Err(e) = result {
                debug!(kind = e.kind(), error = %e, "request rejected");
                if outbox.send(ServerMessage::from(&e)).is_err() {
                    break;
                }
            }
        }
    }

    /// Applies one client intent. Errors go back to the sender only.
    async fn dispatch(
        message: ClientMessage,
        outbox: &Outbox,
        registry: &RoomRegistry,
        seat: &mut Option<Seat>,
    ) -> Result<()> {
        match message {
            ClientMessage::CreateRoom { name } => {
                Self::ensure_unseated(seat)?;
                let (code, player_id, room) = registry.create_room(name, outbox.clone()).await?;
                let created = ServerMessage::RoomCreated {
                    code: code.clone(),
                    player_id: player_id.clone(),
                };
                if outbox.send(created).is_err() {
                    debug!(room = %code, player = %player_id, "outbox closed");
                }
                *seat = Some(Seat {
                    code,
                    player_id,
                    room,
                });
            }
            ClientMessage::JoinRoom { code, name } => {
                Self::ensure_unseated(seat)?;
                let (player_id, room) = registry.join_room(&code, name, outbox.clone()).await?;
                *seat = Some(Seat {
                    code: code.to_uppercase(),
                    player_id,
                    room,
                });
            }
            ClientMessage::Reconnect { code, player_id } => {
                Self::ensure_unseated(seat)?;
                let room = registry.reconnect(&code, &player_id, outbox.clone()).await?;
                *seat = Some(Seat {
                    code: code.to_uppercase(),
                    player_id,
                    room,
                });
            }
            ClientMessage::StartGame => {
                let (mut room, player_id) = Self::live_room(seat, outbox).await?;
                room.start(player_id)?;
            }
            ClientMessage::Play { placements } => {
                let (mut room, player_id) = Self::live_room(seat, outbox).await?;
                room.play(player_id, &placements)?;
            }
            ClientMessage::Exchange { tile_ids } => {
                let (mut room, player_id) = Self::live_room(seat, outbox).await?;
                room.exchange(player_id, &tile_ids)?;
            }
            ClientMessage::Pass => {
                let (mut room, player_id) = Self::live_room(seat, outbox).await?;
                room.pass(player_id)?;
            }
            ClientMessage::Leave => {
                {
                    let (mut room, player_id) = Self::live_room(seat, outbox).await?;
                    info!(room = %room.code(), player = %player_id, "leaving room");
                    room.leave(player_id);
                }
                *seat = None;
            }
        }
        Ok(())
    }

    fn seated(seat: &Option<Seat>) -> Result<&Seat> {
        seat.as_ref().ok_or_else(Self::not_seated)
    }

    /// Locks the seat's room, refusing sockets that a reconnect has since
    /// replaced. Only the live connection may act for a seat.
    async fn live_room<'a>(
        seat: &'a Option<Seat>,
        outbox: &Outbox,
    ) -> Result<(MutexGuard<'a, Room>, &'a PlayerId)> {
        let seat = Self::seated(seat)?;
        let room = seat.room.lock().await;
        if !room.is_connected_via(&seat.player_id, outbox) {
            return Err(GameError::BadRequest(
                "connection replaced by a reconnect".to_string(),
            ));
        }
        Ok((room, &seat.player_id))
    }

    fn ensure_unseated(seat: &Option<Seat>) -> Result<()> {
        match seat {
            Some(seat) => Err(GameError::BadRequest(format!(
                "already seated in room {}",
                seat.code
            ))),
            None => Ok(()),
        }
    }

    fn not_seated() -> GameError {
        GameError::BadRequest("not seated in a room".to_string())
    }

    async fn cleanup(seat: Seat, outbox: &Outbox) {
        let mut room = seat.room.lock().await;
        // A newer socket may already own this seat.
        if room.is_connected_via(&seat.player_id, outbox) {
            room.disconnect(&seat.player_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dictionary::Dictionary;
    use crate::models::Phase;
    use std::sync::Arc;

    fn registry() -> RoomRegistry {
        RoomRegistry::new(Arc::new(Dictionary::from_words(["ねこ"])))
    }

    fn drain(rx: &mut UnboundedReceiver<ServerMessage>) -> Vec<ServerMessage> {
        let mut out = Vec::new();
        while let Ok(message) = rx.try_recv() {
            out.push(message);
        }
        out
    }

    async fn create(registry: &RoomRegistry) -> (Option<Seat>, Outbox, UnboundedReceiver<ServerMessage>) {
        let (outbox, mut rx) = mpsc::unbounded_channel();
        let mut seat = None;
        WebSockets::dispatch(
            ClientMessage::CreateRoom {
                name: "host".to_string(),
            },
            &outbox,
            registry,
            &mut seat,
        )
        .await
        .unwrap();
        assert!(matches!(
            drain(&mut rx).as_slice(),
            [ServerMessage::RoomCreated { .. }]
        ));
        (seat, outbox, rx)
    }

    #[tokio::test]
    async fn test_create_join_start() {
        let registry = registry();
        let (mut host_seat, host_outbox, mut host_rx) = create(&registry).await;
        let code = host_seat.as_ref().map(|s| s.code.clone()).unwrap();

        let (guest_outbox, mut guest_rx) = mpsc::unbounded_channel();
        let mut guest_seat = None;
        WebSockets::dispatch(
            ClientMessage::JoinRoom {
                code: code.to_lowercase(),
                name: "guest".to_string(),
            },
            &guest_outbox,
            &registry,
            &mut guest_seat,
        )
        .await
        .unwrap();
        assert_eq!(guest_seat.as_ref().map(|s| s.code.as_str()), Some(code.as_str()));

        let err = WebSockets::dispatch(ClientMessage::StartGame, &guest_outbox, &registry, &mut guest_seat)
            .await
            .unwrap_err();
        assert_eq!(err, GameError::NotCreator);

        WebSockets::dispatch(ClientMessage::StartGame, &host_outbox, &registry, &mut host_seat)
            .await
            .unwrap();
        let room = registry.get(&code).await.unwrap();
        assert_eq!(room.lock().await.session().phase(), Phase::Playing);
        assert!(matches!(
            drain(&mut host_rx).last(),
            Some(ServerMessage::State { .. })
        ));
        assert!(matches!(
            drain(&mut guest_rx).last(),
            Some(ServerMessage::State { .. })
        ));
    }

    #[tokio::test]
    async fn test_actions_need_a_seat() {
        let registry = registry();
        let (outbox, _rx) = mpsc::unbounded_channel();
        let mut seat = None;
        for message in [ClientMessage::Pass, ClientMessage::StartGame, ClientMessage::Leave] {
            let err = WebSockets::dispatch(message, &outbox, &registry, &mut seat)
                .await
                .unwrap_err();
            assert_eq!(err.kind(), "bad_request");
        }
    }

    #[tokio::test]
    async fn test_second_create_rejected() {
        let registry = registry();
        let (mut seat, outbox, _rx) = create(&registry).await;
        let err = WebSockets::dispatch(
            ClientMessage::CreateRoom {
                name: "again".to_string(),
            },
            &outbox,
            &registry,
            &mut seat,
        )
        .await
        .unwrap_err();
        assert_eq!(err.kind(), "bad_request");
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn test_stale_socket_does_not_drop_new_connection() {
        let registry = registry();
        let (host_seat, _host_outbox, _host_rx) = create(&registry).await;
        let host_seat = host_seat.unwrap();
        let (guest_outbox, _guest_rx) = mpsc::unbounded_channel();
        let mut guest_seat = None;
        WebSockets::dispatch(
            ClientMessage::JoinRoom {
                code: host_seat.code.clone(),
                name: "guest".to_string(),
            },
            &guest_outbox,
            &registry,
            &mut guest_seat,
        )
        .await
        .unwrap();
        host_seat.room.lock().await.start(&host_seat.player_id).unwrap();

        let guest_id = guest_seat.as_ref().map(|s| s.player_id.clone()).unwrap();
        let (fresh_outbox, _fresh_rx) = mpsc::unbounded_channel();
        let mut fresh_seat = None;
        WebSockets::dispatch(
            ClientMessage::Reconnect {
                code: host_seat.code.clone(),
                player_id: guest_id.clone(),
            },
            &fresh_outbox,
            &registry,
            &mut fresh_seat,
        )
        .await
        .unwrap();

        WebSockets::cleanup(guest_seat.unwrap(), &guest_outbox).await;
        let room = host_seat.room.lock().await;
        assert!(room.is_connected(&guest_id));
        assert!(!room.is_awaiting_reconnect(&guest_id));
    }

    #[tokio::test]
    async fn test_replaced_socket_cannot_act_for_seat() {
        let registry = registry();
        let (mut old_seat, old_outbox, _old_rx) = create(&registry).await;
        let (code, host_id, room) = old_seat
            .as_ref()
            .map(|s| (s.code.clone(), s.player_id.clone(), Arc::clone(&s.room)))
            .unwrap();
        let (guest_outbox, _guest_rx) = mpsc::unbounded_channel();
        registry
            .join_room(&code, "guest".to_string(), guest_outbox)
            .await
            .unwrap();
        WebSockets::dispatch(ClientMessage::StartGame, &old_outbox, &registry, &mut old_seat)
            .await
            .unwrap();

        let (fresh_outbox, _fresh_rx) = mpsc::unbounded_channel();
        let mut fresh_seat = None;
        WebSockets::dispatch(
            ClientMessage::Reconnect {
                code: code.clone(),
                player_id: host_id.clone(),
            },
            &fresh_outbox,
            &registry,
            &mut fresh_seat,
        )
        .await
        .unwrap();

        for message in [ClientMessage::Pass, ClientMessage::Leave] {
            let err = WebSockets::dispatch(message, &old_outbox, &registry, &mut old_seat)
                .await
                .unwrap_err();
            assert_eq!(err.kind(), "bad_request");
        }
        {
            let room = room.lock().await;
            assert!(room.session().history().is_empty());
            assert!(room.session().contains(&host_id));
            assert!(room.is_connected(&host_id));
        }

        WebSockets::dispatch(ClientMessage::Pass, &fresh_outbox, &registry, &mut fresh_seat)
            .await
            .unwrap();
        assert_eq!(room.lock().await.session().history().len(), 1);
    }
}
