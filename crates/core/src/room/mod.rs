//! Room aggregate and its lobby/match state machine
//!
//! A room owns its members, the two slots and, while a match is on, the
//! board. Every transition validates first and only then mutates, so a
//! rejected intent leaves the room exactly as it was. Transitions return
//! the notifications to fan out; the room never talks to connections.
//!
//! Phases cycle Lobby -> InMatch -> PostMatch -> Lobby. A seated player
//! leaving during InMatch or PostMatch abandons the match and forces the
//! room back to Lobby with both slots empty.

mod lobby;
mod play;

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use tracing::info;

use crate::engine::{Board, BoardEngine};
use crate::error::{Error, Result};
use crate::models::{
    ConnectionId, GameKind, Mark, Member, MemberView, Phase, Role, Settings, Standing,
};
use crate::permissions::{PermissionMatrix, Privilege, RoomAction};
use crate::protocol::{LobbySnapshot, Notification, Outbound, RoomSummary, SlotView};

/// A playing position and its cosmetic color
#[derive(Debug, Clone, Default)]
pub struct Slot {
    pub occupant: Option<ConnectionId>,
    pub color: Option<String>,
}

#[derive(Debug)]
pub struct Room {
    code: String,
    game_kind: GameKind,
    settings: Settings,
    members: HashMap<ConnectionId, Member>,
    /// Indexed by `Mark::index`
    slots: [Slot; 2],
    host: ConnectionId,
    phase: Phase,
    board: Option<Board>,
    last_activity: DateTime<Utc>,
    next_seq: u64,
    /// Clocks of members who left, restored if they come back
    departed: HashMap<ConnectionId, Standing>,
}

impl Room {
    /// Open a room with `host` as its only member
    pub fn new(
        code: String,
        host: ConnectionId,
        host_name: &str,
        game_kind: GameKind,
        settings: Settings,
        now: DateTime<Utc>,
    ) -> Result<Self> {
        let settings = settings.normalized(game_kind)?;
        let mut members = HashMap::new();
        members.insert(host, Member::new(host, host_name, 0));

        Ok(Self {
            code,
            game_kind,
            settings,
            members,
            slots: [Slot::default(), Slot::default()],
            host,
            phase: Phase::Lobby,
            board: None,
            last_activity: now,
            next_seq: 1,
            departed: HashMap::new(),
        })
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn game_kind(&self) -> GameKind {
        self.game_kind
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn host(&self) -> ConnectionId {
        self.host
    }

    pub fn board(&self) -> Option<&Board> {
        self.board.as_ref()
    }

    pub fn member(&self, id: ConnectionId) -> Option<&Member> {
        self.members.get(&id)
    }

    pub fn members(&self) -> impl Iterator<Item = &Member> {
        self.members.values()
    }

    pub fn is_member(&self, id: ConnectionId) -> bool {
        self.members.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn slot(&self, mark: Mark) -> &Slot {
        &self.slots[mark.index()]
    }

    pub fn occupant(&self, mark: Mark) -> Option<ConnectionId> {
        self.slots[mark.index()].occupant
    }

    /// Member IDs in join order
    pub fn member_ids(&self) -> Vec<ConnectionId> {
        let mut members: Vec<&Member> = self.members.values().collect();
        members.sort_by_key(|m| m.joined_seq);
        members.into_iter().map(|m| m.id).collect()
    }

    pub fn last_activity(&self) -> DateTime<Utc> {
        self.last_activity
    }

    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.last_activity = now;
    }

    pub fn idle_for(&self, now: DateTime<Utc>) -> Duration {
        now - self.last_activity
    }

    pub fn snapshot(&self) -> LobbySnapshot {
        let members = self
            .member_ids()
            .into_iter()
            .filter_map(|id| self.members.get(&id))
            .map(|m| MemberView::of(m, self.host))
            .collect();
        let slot_view = |mark: Mark| {
            let slot = self.slot(mark);
            SlotView {
                occupant: slot.occupant,
                color: slot.color.clone(),
            }
        };

        LobbySnapshot {
            code: self.code.clone(),
            game_kind: self.game_kind,
            settings: self.settings.clone(),
            phase: self.phase,
            host: self.host,
            members,
            slot_o: slot_view(Mark::O),
            slot_x: slot_view(Mark::X),
        }
    }

    pub fn summary(&self) -> RoomSummary {
        RoomSummary {
            code: self.code.clone(),
            game_kind: self.game_kind,
            members: self.members.len(),
            max_members: self.settings.max_members,
            phase: self.phase,
            host_name: self
                .members
                .get(&self.host)
                .map(|m| m.name.clone())
                .unwrap_or_default(),
        }
    }

    /// Admit a new member as a spectator
    pub fn add_member(&mut self, id: ConnectionId, name: &str) -> Result<Vec<Outbound>> {
        if self.members.contains_key(&id) {
            return Err(Error::AlreadyInRoom);
        }
        if self.members.len() >= self.settings.max_members {
            return Err(Error::RoomFull);
        }

        let mut member = Member::new(id, name, self.next_seq);
        if let Some(standing) = self.departed.remove(&id) {
            member.restore(standing);
        }
        self.next_seq += 1;
        info!(room = %self.code, member = %id, name = %member.name, "Member joined");
        self.members.insert(id, member);

        let mut out = vec![
            Outbound::caller(Notification::RoomJoined {
                code: self.code.clone(),
                you: id,
                lobby: self.snapshot(),
            }),
            Outbound::others(self.lobby_notification()),
        ];
        if let Some(board) = &self.board {
            out.push(Outbound::caller(Notification::BoardUpdated {
                board: board.view(),
            }));
        }
        Ok(out)
    }

    /// Drop a member after a disconnect, a leave or a kick.
    ///
    /// A seated member leaving mid-match abandons the match. If the host
    /// leaves, the earliest remaining joiner becomes host.
    pub fn remove_member(&mut self, id: ConnectionId) -> Vec<Outbound> {
        let Some(member) = self.members.remove(&id) else {
            return Vec::new();
        };
        info!(room = %self.code, member = %id, "Member left");
        self.retire(&member);

        let mut out = Vec::new();
        if let Some(mark) = member.role.mark() {
            if self.phase == Phase::Lobby {
                self.vacate(mark);
                out.push(Outbound::all(Notification::SlotLeft {
                    mark,
                    member_id: id,
                }));
            } else {
                info!(room = %self.code, "Match abandoned");
                self.abandon_match();
                out.push(Outbound::all(Notification::OpponentDisconnected {
                    member_id: id,
                    name: member.name,
                }));
            }
        }

        if self.members.is_empty() {
            return out;
        }

        if self.host == id {
            if let Some(next) = self.members.values().min_by_key(|m| m.joined_seq) {
                self.host = next.id;
                info!(room = %self.code, host = %self.host, "Host transferred");
                out.push(Outbound::all(Notification::HostChanged { host: self.host }));
            }
        }

        out.push(Outbound::all(self.lobby_notification()));
        out
    }

    fn privilege(&self, id: ConnectionId) -> Privilege {
        if id == self.host {
            Privilege::Host
        } else {
            Privilege::Member
        }
    }

    /// Check membership, privilege, phase and seat for `action`.
    /// Returns the caller's role.
    fn authorize(&self, caller: ConnectionId, action: RoomAction) -> Result<Role> {
        let member = self.members.get(&caller).ok_or(Error::NotInRoom)?;
        if !PermissionMatrix::can_perform(self.privilege(caller), action) {
            return Err(Error::NotHost);
        }
        if !PermissionMatrix::allowed_in(action, self.phase) {
            return Err(Error::WrongPhase);
        }
        if PermissionMatrix::requires_seat(action) && !member.role.is_seated() {
            return Err(Error::NotSeated);
        }
        Ok(member.role)
    }

    /// Remember a departing member's clocks while they still matter
    fn retire(&mut self, member: &Member) {
        let clock = self.last_activity;
        self.departed.retain(|_, standing| standing.in_force(clock));
        let standing = member.standing();
        if standing.in_force(clock) {
            self.departed.insert(member.id, standing);
        }
    }

    /// Empty a slot, turning its occupant back into an unready spectator
    fn vacate(&mut self, mark: Mark) -> Option<ConnectionId> {
        let slot = &mut self.slots[mark.index()];
        slot.color = None;
        let id = slot.occupant.take()?;
        if let Some(member) = self.members.get_mut(&id) {
            member.role = Role::Spectator;
            member.ready = false;
        }
        Some(id)
    }

    fn clear_ready(&mut self) {
        for member in self.members.values_mut() {
            member.ready = false;
        }
    }

    fn abandon_match(&mut self) {
        for mark in Mark::ALL {
            self.vacate(mark);
        }
        self.clear_ready();
        self.board = None;
        self.phase = Phase::Lobby;
    }

    fn lobby_notification(&self) -> Notification {
        Notification::LobbySnapshot {
            lobby: self.snapshot(),
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use chrono::{DateTime, TimeZone, Utc};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use uuid::Uuid;

    use super::Room;
    use crate::models::{ConnectionId, GameKind, Mark, Settings};
    use crate::protocol::{Notification, Outbound};

    pub fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    pub fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    /// Room with `n` members; the first one is the host
    pub fn room_with(kind: GameKind, settings: Settings, n: usize) -> (Room, Vec<ConnectionId>) {
        let ids: Vec<ConnectionId> = (0..n).map(|_| Uuid::new_v4()).collect();
        let mut room = Room::new("ABCD".into(), ids[0], "host", kind, settings, now()).unwrap();
        for (i, id) in ids.iter().enumerate().skip(1) {
            room.add_member(*id, &format!("guest{}", i)).unwrap();
        }
        (room, ids)
    }

    /// Seat `o` and `x`, ready both and start the match
    pub fn start(room: &mut Room, o: ConnectionId, x: ConnectionId) -> Vec<Outbound> {
        room.take_slot(o, Mark::O, now()).unwrap();
        room.take_slot(x, Mark::X, now()).unwrap();
        room.set_ready(o, true, &mut rng()).unwrap();
        room.set_ready(x, true, &mut rng()).unwrap()
    }

    /// Drop a member without any of the usual bookkeeping
    pub fn forget_member(room: &mut Room, id: ConnectionId) {
        room.members.remove(&id);
    }

    pub fn notes(out: &[Outbound]) -> Vec<&Notification> {
        out.iter().map(|o| &o.notification).collect()
    }
}
