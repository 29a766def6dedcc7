//! Strategic scheduler — future events queued by game minute.
//!
//! Due events are offered to listeners on `strategic_event` first;
//! the first listener to set the handled flag consumes the event and
//! built-in processing is skipped (a mod replacing a hardcoded
//! campaign beat with its own). Unhandled events fall through to the
//! engine's own handling.

use crate::catalog::{EventCatalog, QuestCheck, StrategicEventData};
use crate::clock::GameClock;
use crate::error::EventResult;
use crate::types::GameMinute;

pub struct StrategicScheduler {
    /// Pending events, sorted by due minute; equal minutes keep
    /// insertion order.
    queue: Vec<StrategicEventData>,
    builtin_handled: u32,
    /// Engine-computed campaign progress, before listener overrides.
    base_progress: u8,
}

impl StrategicScheduler {
    pub fn new() -> Self {
        Self {
            queue: Vec::new(),
            builtin_handled: 0,
            base_progress: 0,
        }
    }

    /// Queue an event for `minute`.
    pub fn schedule(&mut self, callback_id: u8, minute: GameMinute, param: u32) {
        let event = StrategicEventData {
            callback_id,
            minute,
            param,
        };
        let at = self.queue.partition_point(|queued| queued.minute <= minute);
        self.queue.insert(at, event);
    }

    pub fn pending_count(&self) -> usize {
        self.queue.len()
    }

    /// Events processed by built-in handling (not consumed by a
    /// listener) since engine start.
    pub fn builtin_handled(&self) -> u32 {
        self.builtin_handled
    }

    pub fn set_base_progress(&mut self, percent: u8) {
        self.base_progress = percent.min(100);
    }

    /// Advance the clock to `target`, processing every event due on
    /// the way in queue order. Returns the number of events processed.
    pub fn advance_to(
        &mut self,
        events: &EventCatalog,
        clock: &mut GameClock,
        target: GameMinute,
    ) -> EventResult<u32> {
        let mut fired = 0;
        while let Some(next) = self.queue.first().copied() {
            if next.minute > target {
                break;
            }
            self.queue.remove(0);
            clock.advance_to(next.minute);
            let handled = events.strategic_event.notify(&next)?;
            if !handled {
                self.handle_builtin(&next);
            }
            fired += 1;
        }
        clock.advance_to(target);
        Ok(fired)
    }

    /// Run the daily quest sweep. The aggregated flag is true when any
    /// listener reported a quest trigger for `day`.
    pub fn check_quests(&self, events: &EventCatalog, day: u32) -> EventResult<bool> {
        events.check_quests.notify(&QuestCheck { day })
    }

    /// Campaign progress percentage: the engine-computed value unless a
    /// listener overrides it.
    pub fn player_progress(&self, events: &EventCatalog) -> EventResult<u8> {
        let override_slot = events.calc_player_progress.notify(&())?;
        Ok(override_slot.percent.unwrap_or(self.base_progress))
    }

    fn handle_builtin(&mut self, event: &StrategicEventData) {
        // The built-in table is deliberately small; campaign content
        // hangs its own handlers on the channel instead.
        log::debug!(
            "minute={} built-in handling for strategic event callback={} param={}",
            event.minute,
            event.callback_id,
            event.param
        );
        self.builtin_handled += 1;
    }
}

impl Default for StrategicScheduler {
    fn default() -> Self {
        Self::new()
    }
}
