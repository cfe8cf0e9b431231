//! Room registry - every live room, keyed by code
//!
//! The registry owns room creation, lookup and deletion, and remembers
//! which room each connection is in. A connection belongs to at most one
//! room at a time.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use rand::Rng;

use crate::config::Limits;
use crate::error::{Error, Result};
use crate::models::{ConnectionId, GameKind, Settings};
use crate::protocol::{Outbound, RoomListPage, RoomSummary};
use crate::room::Room;

/// Length of a room code
pub const CODE_LEN: usize = 4;

const CODE_ALPHABET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Random room code of uppercase base-36 characters
pub fn generate_code<R: Rng + ?Sized>(rng: &mut R) -> String {
    (0..CODE_LEN)
        .map(|_| CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())] as char)
        .collect()
}

/// Codes are typed by people; match them case-insensitively
pub fn normalize_code(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}

/// Registry - central store of live rooms
#[derive(Debug)]
pub struct RoomRegistry {
    rooms: HashMap<String, Room>,
    /// Room code per connection
    locations: HashMap<ConnectionId, String>,
    limits: Limits,
}

impl RoomRegistry {
    pub fn new(limits: Limits) -> Self {
        Self {
            rooms: HashMap::new(),
            locations: HashMap::new(),
            limits,
        }
    }

    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    /// Open a room hosted by `host` and return its code
    pub fn create<R: Rng + ?Sized>(
        &mut self,
        host: ConnectionId,
        name: &str,
        game_kind: GameKind,
        settings: Option<Settings>,
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> Result<String> {
        if self.locations.contains_key(&host) {
            return Err(Error::AlreadyInRoom);
        }
        if self.rooms.len() >= self.limits.max_rooms {
            return Err(Error::RegistryFull);
        }

        let settings = settings.unwrap_or_else(|| Settings::defaults_for(game_kind));
        let code = loop {
            let code = generate_code(rng);
            if !self.rooms.contains_key(&code) {
                break code;
            }
        };
        let room = Room::new(code.clone(), host, name, game_kind, settings, now)?;

        tracing::info!(room = %code, host = %host, game = %game_kind, "Room created");
        self.rooms.insert(code.clone(), room);
        self.locations.insert(host, code.clone());
        Ok(code)
    }

    /// Add `conn` to an existing room as a spectator
    pub fn join(
        &mut self,
        conn: ConnectionId,
        code: &str,
        name: &str,
    ) -> Result<(String, Vec<Outbound>)> {
        if self.locations.contains_key(&conn) {
            return Err(Error::AlreadyInRoom);
        }
        let code = normalize_code(code);
        let room = self
            .rooms
            .get_mut(&code)
            .ok_or_else(|| Error::RoomNotFound(code.clone()))?;

        let out = room.add_member(conn, name)?;
        self.locations.insert(conn, code.clone());
        Ok((code, out))
    }

    pub fn room(&self, code: &str) -> Option<&Room> {
        self.rooms.get(code)
    }

    pub fn room_mut(&mut self, code: &str) -> Option<&mut Room> {
        self.rooms.get_mut(code)
    }

    /// Code of the room `conn` is in
    pub fn room_of(&self, conn: ConnectionId) -> Option<&str> {
        self.locations.get(&conn).map(String::as_str)
    }

    /// Take `conn` out of its room. An emptied room is deleted.
    pub fn leave(&mut self, conn: ConnectionId) -> Option<(String, Vec<Outbound>)> {
        let code = self.locations.remove(&conn)?;
        let room = self.rooms.get_mut(&code)?;
        let out = room.remove_member(conn);

        if room.is_empty() {
            self.rooms.remove(&code);
            tracing::info!(room = %code, "Room closed, last member left");
        }
        Some((code, out))
    }

    /// Drop the location of a connection its room no longer lists,
    /// as after a spectator kick
    pub fn forget_if_absent(&mut self, conn: ConnectionId) {
        let present = self
            .room_of(conn)
            .and_then(|code| self.rooms.get(code))
            .is_some_and(|room| room.is_member(conn));
        if !present {
            self.locations.remove(&conn);
        }
    }

    /// One page of public rooms, ordered by code
    pub fn public_page(&self, page: usize) -> RoomListPage {
        let mut rooms: Vec<RoomSummary> = self
            .rooms
            .values()
            .filter(|room| room.settings().is_public)
            .map(Room::summary)
            .collect();
        rooms.sort_by(|a, b| a.code.cmp(&b.code));

        let page_size = self.limits.room_list_page_size.max(1);
        let total_rooms = rooms.len();
        let total_pages = total_rooms.div_ceil(page_size).max(1);
        let page = page.min(total_pages - 1);

        RoomListPage {
            rooms: rooms
                .into_iter()
                .skip(page * page_size)
                .take(page_size)
                .collect(),
            page,
            total_pages,
            total_rooms,
        }
    }

    /// Delete rooms idle longer than `max_idle`, returning each deleted
    /// code with the members it still had
    pub fn sweep_idle(
        &mut self,
        now: DateTime<Utc>,
        max_idle: Duration,
    ) -> Vec<(String, Vec<ConnectionId>)> {
        let idle: Vec<String> = self
            .rooms
            .values()
            .filter(|room| room.idle_for(now) > max_idle)
            .map(|room| room.code().to_string())
            .collect();

        let mut closed = Vec::new();
        for code in idle {
            if let Some(room) = self.rooms.remove(&code) {
                let members = room.member_ids();
                for id in &members {
                    self.locations.remove(id);
                }
                tracing::info!(room = %code, members = members.len(), "Idle room evicted");
                closed.push((code, members));
            }
        }
        closed
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }
}
