//! Session dispatcher
//!
//! Maps a decoded intent from one connection onto the registry or the
//! caller's room, then resolves the audience of every resulting
//! notification to concrete connection IDs. Rejections turn into a
//! single error notification for the caller; nothing else sees them.

use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::debug;

use crate::config::Limits;
use crate::error::{Error, Result};
use crate::invariants::assert_room_invariants;
use crate::models::ConnectionId;
use crate::protocol::{Audience, Intent, Notification, Outbound};
use crate::registry::RoomRegistry;
use crate::room::Room;

/// A notification bound for one connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub to: ConnectionId,
    pub notification: Notification,
}

impl Envelope {
    pub fn new(to: ConnectionId, notification: Notification) -> Self {
        Self { to, notification }
    }
}

#[derive(Debug)]
pub struct Dispatcher {
    registry: RoomRegistry,
    rng: StdRng,
}

impl Dispatcher {
    pub fn new(limits: Limits) -> Self {
        Self {
            registry: RoomRegistry::new(limits),
            rng: StdRng::from_entropy(),
        }
    }

    /// Dispatcher with reproducible room codes and seat shuffles
    pub fn with_seed(limits: Limits, seed: u64) -> Self {
        Self {
            registry: RoomRegistry::new(limits),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn registry(&self) -> &RoomRegistry {
        &self.registry
    }

    pub fn room_count(&self) -> usize {
        self.registry.len()
    }

    /// Handle one intent from `caller`
    pub fn handle(
        &mut self,
        caller: ConnectionId,
        intent: Intent,
        now: DateTime<Utc>,
    ) -> Vec<Envelope> {
        let kind = intent.kind();
        match self.dispatch(caller, intent, now) {
            Ok(envelopes) => envelopes,
            Err(err) => {
                debug!(
                    conn = %caller,
                    intent = kind,
                    class = ?err.kind(),
                    error = %err,
                    "Intent rejected"
                );
                vec![Envelope::new(caller, Notification::error(&err))]
            }
        }
    }

    /// A connection went away; run the ordinary leave transition
    pub fn disconnect(&mut self, conn: ConnectionId, now: DateTime<Utc>) -> Vec<Envelope> {
        let Some((code, out)) = self.registry.leave(conn) else {
            return Vec::new();
        };
        if let Some(room) = self.registry.room_mut(&code) {
            room.touch(now);
            assert_room_invariants(room);
        }
        self.resolve(&code, conn, out)
    }

    /// Close rooms idle for longer than `max_idle`, telling their members
    pub fn sweep_idle(&mut self, now: DateTime<Utc>, max_idle: Duration) -> Vec<Envelope> {
        self.registry
            .sweep_idle(now, max_idle)
            .into_iter()
            .flat_map(|(code, members)| {
                members.into_iter().map(move |id| {
                    Envelope::new(id, Notification::RoomClosed { code: code.clone() })
                })
            })
            .collect()
    }

    fn dispatch(
        &mut self,
        caller: ConnectionId,
        intent: Intent,
        now: DateTime<Utc>,
    ) -> Result<Vec<Envelope>> {
        let limits = *self.registry.limits();

        match intent {
            Intent::CreateRoom {
                name,
                game_kind,
                settings,
            } => {
                let code =
                    self.registry
                        .create(caller, &name, game_kind, settings, now, &mut self.rng)?;
                let room = self
                    .registry
                    .room(&code)
                    .ok_or_else(|| Error::RoomNotFound(code.clone()))?;
                let lobby = room.snapshot();
                Ok(vec![Envelope::new(
                    caller,
                    Notification::RoomCreated {
                        code,
                        you: caller,
                        lobby,
                    },
                )])
            }
            Intent::JoinRoom { code, name } => {
                let (code, out) = self.registry.join(caller, &code, &name)?;
                if let Some(room) = self.registry.room_mut(&code) {
                    room.touch(now);
                }
                Ok(self.resolve(&code, caller, out))
            }
            Intent::LeaveRoom => {
                let (code, out) = self.registry.leave(caller).ok_or(Error::NotInRoom)?;
                if let Some(room) = self.registry.room_mut(&code) {
                    room.touch(now);
                }
                Ok(self.resolve(&code, caller, out))
            }
            Intent::ListPublicRooms { page } => Ok(vec![Envelope::new(
                caller,
                Notification::RoomList {
                    page: self.registry.public_page(page),
                },
            )]),
            Intent::UpdateSettings { settings } => {
                self.in_room(caller, now, |room, _| room.update_settings(caller, settings))
            }
            Intent::ChangeGameKind { game_kind } => {
                self.in_room(caller, now, |room, _| room.change_game_kind(caller, game_kind))
            }
            Intent::TakeSlot { mark } => {
                self.in_room(caller, now, |room, _| room.take_slot(caller, mark, now))
            }
            Intent::LeaveSlot => self.in_room(caller, now, |room, _| room.leave_slot(caller)),
            Intent::UpdateSlotColor { color } => {
                self.in_room(caller, now, |room, _| room.update_slot_color(caller, &color))
            }
            Intent::SendChat { text } => {
                self.in_room(caller, now, |room, _| room.send_chat(caller, &text, now, &limits))
            }
            Intent::SetReady { ready } => {
                self.in_room(caller, now, |room, rng| room.set_ready(caller, ready, rng))
            }
            Intent::SubmitMove { cell } => {
                self.in_room(caller, now, |room, _| room.submit_move(caller, cell))
            }
            Intent::DeclareGameOver => {
                self.in_room(caller, now, |room, _| room.declare_game_over(caller))
            }
            Intent::Surrender => self.in_room(caller, now, |room, _| room.surrender(caller)),
            Intent::ReturnToLobby => {
                self.in_room(caller, now, |room, _| room.return_to_lobby(caller))
            }
            Intent::KickMember { target } => {
                let envelopes = self.in_room(caller, now, |room, _| {
                    room.kick(caller, target, now, limits.kick_exclusion())
                })?;
                self.registry.forget_if_absent(target);
                Ok(envelopes)
            }
        }
    }

    /// Run a transition on the caller's room
    fn in_room<F>(&mut self, caller: ConnectionId, now: DateTime<Utc>, f: F) -> Result<Vec<Envelope>>
    where
        F: FnOnce(&mut Room, &mut StdRng) -> Result<Vec<Outbound>>,
    {
        let code = self
            .registry
            .room_of(caller)
            .ok_or(Error::NotInRoom)?
            .to_string();
        let room = self
            .registry
            .room_mut(&code)
            .ok_or_else(|| Error::RoomNotFound(code.clone()))?;

        let out = f(room, &mut self.rng)?;
        room.touch(now);
        assert_room_invariants(room);
        Ok(self.resolve(&code, caller, out))
    }

    /// Turn audiences into connection IDs, using membership after the
    /// transition
    fn resolve(&self, code: &str, caller: ConnectionId, out: Vec<Outbound>) -> Vec<Envelope> {
        let members = self
            .registry
            .room(code)
            .map(Room::member_ids)
            .unwrap_or_default();

        let mut envelopes = Vec::new();
        for Outbound {
            audience,
            notification,
        } in out
        {
            match audience {
                Audience::Caller => envelopes.push(Envelope::new(caller, notification)),
                Audience::Member(id) => envelopes.push(Envelope::new(id, notification)),
                Audience::Others => envelopes.extend(
                    members
                        .iter()
                        .filter(|&&id| id != caller)
                        .map(|&id| Envelope::new(id, notification.clone())),
                ),
                Audience::All => envelopes.extend(
                    members
                        .iter()
                        .map(|&id| Envelope::new(id, notification.clone())),
                ),
            }
        }
        envelopes
    }
}
