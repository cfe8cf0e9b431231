//! Lobby transitions: settings, slots, readiness, chat and kicks

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use tracing::{debug, info};

use crate::config::Limits;
use crate::engine::{Board, BoardEngine};
use crate::error::{Error, Result};
use crate::models::{
    ConnectionId, GameKind, Mark, MemberView, Phase, PlayerOrder, Role, Settings,
};
use crate::permissions::{PermissionMatrix, RoomAction};
use crate::protocol::{Notification, Outbound, Seats};

use super::Room;

/// Longest accepted slot color string
pub const MAX_COLOR_LEN: usize = 32;

impl Room {
    pub fn update_settings(
        &mut self,
        caller: ConnectionId,
        settings: Settings,
    ) -> Result<Vec<Outbound>> {
        self.authorize(caller, RoomAction::UpdateSettings)?;
        let settings = settings.normalized(self.game_kind)?;
        if settings.max_members < self.members.len() {
            return Err(Error::InvalidSettings(format!(
                "room already has {} members",
                self.members.len()
            )));
        }

        self.settings = settings;
        debug!(room = %self.code, settings = ?self.settings, "Settings updated");
        Ok(vec![self.settings_notification()])
    }

    /// Switch games, resetting game-specific settings to the new defaults
    pub fn change_game_kind(
        &mut self,
        caller: ConnectionId,
        game_kind: GameKind,
    ) -> Result<Vec<Outbound>> {
        self.authorize(caller, RoomAction::ChangeGameKind)?;

        let mut settings = Settings::defaults_for(game_kind);
        settings.max_members = self.settings.max_members;
        settings.is_public = self.settings.is_public;
        self.game_kind = game_kind;
        self.settings = settings;
        info!(room = %self.code, game = %game_kind, "Game changed");
        Ok(vec![self.settings_notification()])
    }

    pub fn take_slot(
        &mut self,
        caller: ConnectionId,
        mark: Mark,
        now: DateTime<Utc>,
    ) -> Result<Vec<Outbound>> {
        let role = self.authorize(caller, RoomAction::TakeSlot)?;
        if !PermissionMatrix::can_take_slot(role) {
            return Err(Error::AlreadySeated);
        }
        let member = self.members.get_mut(&caller).ok_or(Error::NotInRoom)?;
        if let Some(secs) = member.exclusion_remaining(now) {
            return Err(Error::SlotExcluded(secs));
        }
        let slot = &mut self.slots[mark.index()];
        if slot.occupant.is_some() {
            return Err(Error::SlotOccupied(mark));
        }

        slot.occupant = Some(caller);
        member.role = Role::seated(mark);
        member.ready = false;
        member.slot_exclusion_until = None;

        Ok(vec![Outbound::all(Notification::SlotTaken {
            mark,
            member: MemberView::of(member, self.host),
        })])
    }

    pub fn leave_slot(&mut self, caller: ConnectionId) -> Result<Vec<Outbound>> {
        let mark = self
            .authorize(caller, RoomAction::LeaveSlot)?
            .mark()
            .ok_or(Error::NotSeated)?;
        self.vacate(mark);
        Ok(vec![Outbound::all(Notification::SlotLeft {
            mark,
            member_id: caller,
        })])
    }

    /// Set the cosmetic color of the caller's own slot
    pub fn update_slot_color(
        &mut self,
        caller: ConnectionId,
        color: &str,
    ) -> Result<Vec<Outbound>> {
        let mark = self
            .authorize(caller, RoomAction::UpdateSlotColor)?
            .mark()
            .ok_or(Error::NotSeated)?;
        let color = color.trim();
        if color.is_empty() || color.chars().count() > MAX_COLOR_LEN {
            return Err(Error::InvalidColor(color.to_string()));
        }

        self.slots[mark.index()].color = Some(color.to_string());
        Ok(vec![Outbound::all(self.lobby_notification())])
    }

    /// Relay a chat line to the whole room. Blank lines are dropped silently.
    pub fn send_chat(
        &mut self,
        caller: ConnectionId,
        text: &str,
        now: DateTime<Utc>,
        limits: &Limits,
    ) -> Result<Vec<Outbound>> {
        self.authorize(caller, RoomAction::SendChat)?;
        let text = text.trim();
        if text.is_empty() {
            return Ok(Vec::new());
        }

        let member = self.members.get_mut(&caller).ok_or(Error::NotInRoom)?;
        if let Some(last) = member.last_chat_at {
            if now - last < limits.chat_cooldown() {
                return Err(Error::RateLimited);
            }
        }
        member.last_chat_at = Some(now);

        Ok(vec![Outbound::all(Notification::ChatMessage {
            from: caller,
            name: member.name.clone(),
            text: text.chars().take(limits.chat_max_len).collect(),
            sent_at: now,
        })])
    }

    /// Toggle readiness. The match starts as soon as both seated players
    /// are ready.
    pub fn set_ready<R: Rng + ?Sized>(
        &mut self,
        caller: ConnectionId,
        ready: bool,
        rng: &mut R,
    ) -> Result<Vec<Outbound>> {
        self.authorize(caller, RoomAction::SetReady)?;
        if let Some(member) = self.members.get_mut(&caller) {
            member.ready = ready;
        }

        let mut out = vec![Outbound::all(self.lobby_notification())];
        if self.both_seated_ready() {
            out.extend(self.start_match(rng));
        }
        Ok(out)
    }

    /// Remove a member from their slot, or from the room if they are
    /// only watching. A kicked player cannot sit again until the
    /// exclusion runs out.
    pub fn kick(
        &mut self,
        caller: ConnectionId,
        target: ConnectionId,
        now: DateTime<Utc>,
        exclusion: Duration,
    ) -> Result<Vec<Outbound>> {
        self.authorize(caller, RoomAction::KickMember)?;
        let role = self
            .members
            .get(&target)
            .map(|m| m.role)
            .ok_or(Error::MemberNotFound)?;
        if !PermissionMatrix::can_kick(self.privilege(caller), self.privilege(target)) {
            return Err(Error::CannotKickHost);
        }

        let Some(mark) = role.mark() else {
            if let Some(member) = self.members.remove(&target) {
                self.retire(&member);
            }
            info!(room = %self.code, member = %target, "Spectator kicked");
            return Ok(vec![
                Outbound::member(
                    target,
                    Notification::Kicked {
                        code: self.code.clone(),
                        from_slot: false,
                    },
                ),
                Outbound::all(self.lobby_notification()),
            ]);
        };

        if let Some(member) = self.members.get_mut(&target) {
            member.slot_exclusion_until =
                Some(now.checked_add_signed(exclusion).unwrap_or(DateTime::<Utc>::MAX_UTC));
        }
        let mut out = vec![Outbound::member(
            target,
            Notification::Kicked {
                code: self.code.clone(),
                from_slot: true,
            },
        )];
        if self.phase == Phase::Lobby {
            self.vacate(mark);
            out.push(Outbound::all(Notification::SlotLeft {
                mark,
                member_id: target,
            }));
        } else {
            info!(room = %self.code, "Match abandoned by kick");
            self.abandon_match();
        }
        info!(room = %self.code, member = %target, %mark, "Player kicked from slot");
        out.push(Outbound::all(self.lobby_notification()));
        Ok(out)
    }

    fn settings_notification(&self) -> Outbound {
        Outbound::all(Notification::SettingsChanged {
            game_kind: self.game_kind,
            settings: self.settings.clone(),
        })
    }

    fn both_seated_ready(&self) -> bool {
        Mark::ALL.iter().all(|&mark| {
            self.occupant(mark)
                .and_then(|id| self.members.get(&id))
                .is_some_and(|m| m.ready)
        })
    }

    fn should_swap<R: Rng + ?Sized>(&self, rng: &mut R) -> bool {
        match self.settings.player_order {
            PlayerOrder::HostO => self.occupant(Mark::X) == Some(self.host),
            PlayerOrder::HostX => self.occupant(Mark::O) == Some(self.host),
            PlayerOrder::Random => rng.gen_bool(0.5),
            PlayerOrder::Assigned => false,
        }
    }

    /// Settle marks, build the board and tell each member their own mark
    fn start_match<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Vec<Outbound> {
        if self.should_swap(rng) {
            self.slots.swap(0, 1);
            for mark in Mark::ALL {
                if let Some(id) = self.occupant(mark) {
                    if let Some(member) = self.members.get_mut(&id) {
                        member.role = Role::seated(mark);
                    }
                }
            }
        }

        self.clear_ready();
        let board = Board::new(self.game_kind, &self.settings);
        let view = board.view();
        self.board = Some(board);
        self.phase = Phase::InMatch;
        info!(room = %self.code, game = %self.game_kind, "Match started");

        let seat = |mark: Mark| {
            self.occupant(mark)
                .and_then(|id| self.members.get(&id))
                .map(|m| MemberView::of(m, self.host))
        };
        let (Some(o), Some(x)) = (seat(Mark::O), seat(Mark::X)) else {
            return Vec::new();
        };
        let seats = Seats { o, x };

        self.member_ids()
            .into_iter()
            .filter_map(|id| self.members.get(&id))
            .map(|member| {
                Outbound::member(
                    member.id,
                    Notification::MatchStarting {
                        game_kind: self.game_kind,
                        mark: member.role.mark(),
                        seats: seats.clone(),
                        board: view.clone(),
                    },
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::super::testing::*;
    use super::*;
    use crate::invariants::assert_room_invariants;
    use crate::protocol::Audience;

    #[test]
    fn test_two_players_ready_starts_match() {
        let (mut room, ids) = room_with(GameKind::TicTacToe, Settings::default(), 3);
        room.take_slot(ids[0], Mark::O, now()).unwrap();
        room.take_slot(ids[1], Mark::X, now()).unwrap();

        let out = room.set_ready(ids[0], true, &mut rng()).unwrap();
        assert_eq!(room.phase(), Phase::Lobby);
        assert_eq!(out.len(), 1);

        let out = room.set_ready(ids[1], true, &mut rng()).unwrap();
        assert_eq!(room.phase(), Phase::InMatch);
        assert!(room.board().is_some());
        assert!(room.members().all(|m| !m.ready));

        let starts: Vec<_> = out
            .iter()
            .filter_map(|o| match (&o.audience, &o.notification) {
                (Audience::Member(id), Notification::MatchStarting { mark, board, .. }) => {
                    Some((*id, *mark, board.turn))
                }
                _ => None,
            })
            .collect();
        assert_eq!(starts.len(), 3);
        assert!(starts.contains(&(ids[0], Some(Mark::O), Mark::O)));
        assert!(starts.contains(&(ids[1], Some(Mark::X), Mark::O)));
        assert!(starts.contains(&(ids[2], None, Mark::O)));
        assert_room_invariants(&room);
    }

    #[test]
    fn test_taken_slot_rejected() {
        let (mut room, ids) = room_with(GameKind::TicTacToe, Settings::default(), 3);
        room.take_slot(ids[1], Mark::O, now()).unwrap();

        assert_eq!(
            room.take_slot(ids[2], Mark::O, now()),
            Err(Error::SlotOccupied(Mark::O))
        );
        assert_eq!(
            room.take_slot(ids[1], Mark::X, now()),
            Err(Error::AlreadySeated)
        );
        assert_eq!(room.occupant(Mark::X), None);
    }

    #[test]
    fn test_leave_slot_clears_color() {
        let (mut room, ids) = room_with(GameKind::TicTacToe, Settings::default(), 2);
        room.take_slot(ids[1], Mark::X, now()).unwrap();
        room.update_slot_color(ids[1], " #ff0000 ").unwrap();
        assert_eq!(room.slot(Mark::X).color.as_deref(), Some("#ff0000"));

        room.leave_slot(ids[1]).unwrap();
        assert_eq!(room.slot(Mark::X).color, None);
        assert_eq!(room.member(ids[1]).unwrap().role, Role::Spectator);
        assert_eq!(room.leave_slot(ids[1]), Err(Error::NotSeated));
    }

    #[test]
    fn test_slot_color_validation() {
        let (mut room, ids) = room_with(GameKind::TicTacToe, Settings::default(), 2);
        assert_eq!(room.update_slot_color(ids[1], "red"), Err(Error::NotSeated));

        room.take_slot(ids[1], Mark::O, now()).unwrap();
        assert!(matches!(
            room.update_slot_color(ids[1], "   "),
            Err(Error::InvalidColor(_))
        ));
        assert!(matches!(
            room.update_slot_color(ids[1], &"x".repeat(MAX_COLOR_LEN + 1)),
            Err(Error::InvalidColor(_))
        ));
    }

    #[test]
    fn test_settings_host_only_in_lobby() {
        let (mut room, ids) = room_with(GameKind::TicTacToe, Settings::default(), 2);
        let bigger = Settings {
            board_size: 5,
            ..Settings::default()
        };

        assert_eq!(
            room.update_settings(ids[1], bigger.clone()),
            Err(Error::NotHost)
        );
        room.update_settings(ids[0], bigger.clone()).unwrap();
        assert_eq!(room.settings().board_size, 5);

        start(&mut room, ids[0], ids[1]);
        assert_eq!(
            room.update_settings(ids[0], Settings::default()),
            Err(Error::WrongPhase)
        );
    }

    #[test]
    fn test_settings_below_member_count_rejected() {
        let (mut room, ids) = room_with(GameKind::TicTacToe, Settings::default(), 3);
        let tight = Settings {
            max_members: 2,
            ..Settings::default()
        };
        assert!(matches!(
            room.update_settings(ids[0], tight),
            Err(Error::InvalidSettings(_))
        ));
        assert_eq!(room.settings().max_members, 10);
    }

    #[test]
    fn test_change_game_keeps_capacity_and_visibility() {
        let settings = Settings {
            board_size: 6,
            is_public: true,
            max_members: 4,
            ..Settings::default()
        };
        let (mut room, ids) = room_with(GameKind::TicTacToe, settings, 1);

        let out = room.change_game_kind(ids[0], GameKind::Othello).unwrap();
        assert_eq!(room.game_kind(), GameKind::Othello);
        assert_eq!(room.settings().board_size, 8);
        assert!(room.settings().is_public);
        assert_eq!(room.settings().max_members, 4);
        assert!(matches!(
            notes(&out)[0],
            Notification::SettingsChanged {
                game_kind: GameKind::Othello,
                ..
            }
        ));
    }

    #[test]
    fn test_chat_trim_cooldown_and_cap() {
        let (mut room, ids) = room_with(GameKind::TicTacToe, Settings::default(), 2);
        let limits = Limits::default();

        assert!(room.send_chat(ids[1], "   ", now(), &limits).unwrap().is_empty());

        let out = room.send_chat(ids[1], "  hi  ", now(), &limits).unwrap();
        assert!(matches!(
            notes(&out)[0],
            Notification::ChatMessage { text, .. } if text == "hi"
        ));

        let soon = now() + Duration::milliseconds(100);
        assert_eq!(
            room.send_chat(ids[1], "again", soon, &limits),
            Err(Error::RateLimited)
        );

        let later = now() + Duration::seconds(1);
        let long = "y".repeat(limits.chat_max_len + 50);
        let out = room.send_chat(ids[1], &long, later, &limits).unwrap();
        assert!(matches!(
            notes(&out)[0],
            Notification::ChatMessage { text, .. } if text.len() == limits.chat_max_len
        ));
    }

    #[test]
    fn test_kick_seated_player_in_lobby() {
        let (mut room, ids) = room_with(GameKind::TicTacToe, Settings::default(), 2);
        room.take_slot(ids[1], Mark::X, now()).unwrap();

        let out = room
            .kick(ids[0], ids[1], now(), Duration::seconds(10))
            .unwrap();
        assert!(room.is_member(ids[1]));
        assert_eq!(room.occupant(Mark::X), None);
        assert!(out.iter().any(|o| o.audience == Audience::Member(ids[1])
            && matches!(o.notification, Notification::Kicked { from_slot: true, .. })));

        let soon = now() + Duration::seconds(3);
        assert_eq!(
            room.take_slot(ids[1], Mark::X, soon),
            Err(Error::SlotExcluded(7))
        );
        let later = now() + Duration::seconds(10);
        room.take_slot(ids[1], Mark::X, later).unwrap();
    }

    #[test]
    fn test_kick_exclusion_survives_rejoin() {
        let (mut room, ids) = room_with(GameKind::TicTacToe, Settings::default(), 2);
        room.take_slot(ids[1], Mark::X, now()).unwrap();
        room.kick(ids[0], ids[1], now(), Duration::seconds(10))
            .unwrap();

        room.remove_member(ids[1]);
        room.add_member(ids[1], "guest1").unwrap();
        assert_eq!(
            room.take_slot(ids[1], Mark::X, now()),
            Err(Error::SlotExcluded(10))
        );
        room.take_slot(ids[1], Mark::X, now() + Duration::seconds(10))
            .unwrap();
    }

    #[test]
    fn test_chat_cooldown_survives_rejoin() {
        let (mut room, ids) = room_with(GameKind::TicTacToe, Settings::default(), 2);
        let limits = Limits::default();
        room.send_chat(ids[1], "hi", now(), &limits).unwrap();

        room.remove_member(ids[1]);
        room.add_member(ids[1], "guest1").unwrap();
        let soon = now() + Duration::milliseconds(100);
        assert_eq!(
            room.send_chat(ids[1], "again", soon, &limits),
            Err(Error::RateLimited)
        );
    }

    #[test]
    fn test_huge_exclusion_does_not_overflow() {
        let (mut room, ids) = room_with(GameKind::TicTacToe, Settings::default(), 2);
        room.take_slot(ids[1], Mark::X, now()).unwrap();

        room.kick(ids[0], ids[1], now(), Duration::MAX).unwrap();
        assert!(matches!(
            room.take_slot(ids[1], Mark::X, now()),
            Err(Error::SlotExcluded(_))
        ));
    }

    #[test]
    fn test_kick_spectator_removes_member() {
        let (mut room, ids) = room_with(GameKind::TicTacToe, Settings::default(), 3);
        room.kick(ids[0], ids[2], now(), Duration::seconds(10))
            .unwrap();
        assert!(!room.is_member(ids[2]));
        assert_eq!(room.len(), 2);
    }

    #[test]
    fn test_kick_rules() {
        let (mut room, ids) = room_with(GameKind::TicTacToe, Settings::default(), 3);
        let exclusion = Duration::seconds(10);

        assert_eq!(room.kick(ids[1], ids[2], now(), exclusion), Err(Error::NotHost));
        assert_eq!(
            room.kick(ids[0], ids[0], now(), exclusion),
            Err(Error::CannotKickHost)
        );
        assert_eq!(
            room.kick(ids[0], uuid::Uuid::new_v4(), now(), exclusion),
            Err(Error::MemberNotFound)
        );
    }

    #[test]
    fn test_kick_mid_match_abandons() {
        let (mut room, ids) = room_with(GameKind::Othello, Settings::default(), 2);
        start(&mut room, ids[0], ids[1]);

        room.kick(ids[0], ids[1], now(), Duration::seconds(10))
            .unwrap();
        assert_eq!(room.phase(), Phase::Lobby);
        assert!(room.board().is_none());
        assert_eq!(room.occupant(Mark::O), None);
        assert_room_invariants(&room);
    }

    #[test]
    fn test_host_o_swaps_seats() {
        let settings = Settings {
            player_order: PlayerOrder::HostO,
            ..Settings::default()
        };
        let (mut room, ids) = room_with(GameKind::TicTacToe, settings, 2);
        room.take_slot(ids[0], Mark::X, now()).unwrap();
        room.take_slot(ids[1], Mark::O, now()).unwrap();
        room.update_slot_color(ids[0], "blue").unwrap();
        room.set_ready(ids[0], true, &mut rng()).unwrap();
        room.set_ready(ids[1], true, &mut rng()).unwrap();

        assert_eq!(room.occupant(Mark::O), Some(ids[0]));
        assert_eq!(room.member(ids[0]).unwrap().role, Role::O);
        assert_eq!(room.member(ids[1]).unwrap().role, Role::X);
        assert_eq!(room.slot(Mark::O).color.as_deref(), Some("blue"));
        assert_room_invariants(&room);
    }

    #[test]
    fn test_random_order_is_seeded() {
        let settings = Settings {
            player_order: PlayerOrder::Random,
            ..Settings::default()
        };
        let mut swapped = 0;
        for seed in 0..32 {
            let (mut room, ids) = room_with(GameKind::TicTacToe, settings.clone(), 2);
            room.take_slot(ids[0], Mark::O, now()).unwrap();
            room.take_slot(ids[1], Mark::X, now()).unwrap();
            let mut rng = <rand::rngs::StdRng as rand::SeedableRng>::seed_from_u64(seed);
            room.set_ready(ids[0], true, &mut rng).unwrap();
            room.set_ready(ids[1], true, &mut rng).unwrap();
            if room.occupant(Mark::O) == Some(ids[1]) {
                swapped += 1;
            }
            assert_room_invariants(&room);
        }
        assert!(swapped > 0 && swapped < 32);
    }

    #[test]
    fn test_spectator_cannot_ready() {
        let (mut room, ids) = room_with(GameKind::TicTacToe, Settings::default(), 2);
        assert_eq!(
            room.set_ready(ids[1], true, &mut rng()),
            Err(Error::NotSeated)
        );
    }
}
