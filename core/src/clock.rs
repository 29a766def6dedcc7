//! Strategic clock — owns game time and time-compression state.
//!
//! Compression requests are gated on the `time_compress_disallowed`
//! channel: any listener may hold the clock at normal speed (a mod
//! keeping real-time pressure on during its own scripted sequence).

use crate::catalog::EventCatalog;
use crate::error::EventResult;
use crate::types::GameMinute;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TimeCompression {
    Normal, // 1 game minute per step
    X5,     // 5 game minutes per step
    X60,    // 1 game hour per step
}

impl TimeCompression {
    pub fn minutes_per_step(&self) -> GameMinute {
        match self {
            Self::Normal => 1,
            Self::X5 => 5,
            Self::X60 => 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GameClock {
    pub minute: GameMinute,
    pub compression: TimeCompression,
}

impl GameClock {
    pub fn new() -> Self {
        Self {
            minute: 0,
            compression: TimeCompression::Normal,
        }
    }

    /// Advance one step at the current compression level. Returns the
    /// new game minute.
    pub fn step(&mut self) -> GameMinute {
        self.minute += self.compression.minutes_per_step();
        self.minute
    }

    /// Move the clock forward to `minute`. Never moves backwards.
    pub fn advance_to(&mut self, minute: GameMinute) {
        if minute > self.minute {
            self.minute = minute;
        }
    }

    /// Current campaign day (day 1 starts at minute 0).
    pub fn day(&self) -> u32 {
        self.minute / (24 * 60) + 1
    }

    /// Request a compression level change. Listeners on
    /// `time_compress_disallowed` may refuse; the request is then
    /// dropped and `false` returned. Returning to normal speed is
    /// always allowed.
    pub fn request_compression(
        &mut self,
        events: &EventCatalog,
        compression: TimeCompression,
    ) -> EventResult<bool> {
        if compression != TimeCompression::Normal {
            let disallowed = events.time_compress_disallowed.notify(&())?;
            if disallowed {
                log::debug!("minute={} time compression disallowed by listener", self.minute);
                return Ok(false);
            }
        }
        self.compression = compression;
        Ok(true)
    }
}

impl Default for GameClock {
    fn default() -> Self {
        Self::new()
    }
}
