//! Tunable limits shared by the registry and rooms

use chrono::Duration;
use serde::{Deserialize, Serialize};

/// Longest kick exclusion a server may configure
pub const MAX_KICK_EXCLUSION_SECS: u64 = 24 * 60 * 60;

/// Longest chat cooldown a server may configure
pub const MAX_CHAT_COOLDOWN_MS: u64 = 60_000;

/// Capacity and pacing limits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    /// Maximum number of live rooms in the registry
    pub max_rooms: usize,
    /// Entries per public room list page
    pub room_list_page_size: usize,
    /// Minimum spacing between two chat messages of one member
    pub chat_cooldown_ms: u64,
    /// Longer chat messages are truncated to this many characters
    pub chat_max_len: usize,
    /// How long a kicked player is kept out of the slots
    pub kick_exclusion_secs: u64,
}

impl Limits {
    /// Chat cooldown, capped at [`MAX_CHAT_COOLDOWN_MS`]
    pub fn chat_cooldown(&self) -> Duration {
        Duration::milliseconds(self.chat_cooldown_ms.min(MAX_CHAT_COOLDOWN_MS) as i64)
    }

    /// Kick exclusion, capped at [`MAX_KICK_EXCLUSION_SECS`]
    pub fn kick_exclusion(&self) -> Duration {
        Duration::seconds(self.kick_exclusion_secs.min(MAX_KICK_EXCLUSION_SECS) as i64)
    }

    /// Name the first value outside its accepted range
    pub fn check(&self) -> std::result::Result<(), String> {
        if self.chat_cooldown_ms > MAX_CHAT_COOLDOWN_MS {
            return Err(format!(
                "chat_cooldown_ms must be at most {}",
                MAX_CHAT_COOLDOWN_MS
            ));
        }
        if self.kick_exclusion_secs > MAX_KICK_EXCLUSION_SECS {
            return Err(format!(
                "kick_exclusion_secs must be at most {}",
                MAX_KICK_EXCLUSION_SECS
            ));
        }
        if self.room_list_page_size == 0 {
            return Err("room_list_page_size must be positive".into());
        }
        Ok(())
    }
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_rooms: 1000,
            room_list_page_size: 10,
            chat_cooldown_ms: 500,
            chat_max_len: 300,
            kick_exclusion_secs: 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_huge_values_are_capped() {
        let limits = Limits {
            kick_exclusion_secs: u64::MAX / 2,
            chat_cooldown_ms: u64::MAX,
            ..Limits::default()
        };
        assert_eq!(
            limits.kick_exclusion(),
            Duration::seconds(MAX_KICK_EXCLUSION_SECS as i64)
        );
        assert_eq!(
            limits.chat_cooldown(),
            Duration::milliseconds(MAX_CHAT_COOLDOWN_MS as i64)
        );
        assert!(limits.check().unwrap_err().contains("chat_cooldown_ms"));
    }

    #[test]
    fn test_default_limits_check() {
        assert_eq!(Limits::default().check(), Ok(()));
        let limits = Limits {
            room_list_page_size: 0,
            ..Limits::default()
        };
        assert!(limits.check().is_err());
    }
}
