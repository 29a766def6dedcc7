//! Sector transitions — map preparation, entry, soldier placement,
//! and NPC action records.

use crate::catalog::{EventCatalog, NpcAction};
use crate::error::EventResult;
use crate::types::{ProfileId, SectorId, SoldierId, SoldierRef};

pub struct SectorSystem {
    current: Option<SectorId>,
    next_soldier_id: SoldierId,
}

impl SectorSystem {
    pub fn new() -> Self {
        Self {
            current: None,
            next_soldier_id: 1,
        }
    }

    pub fn current_sector(&self) -> Option<SectorId> {
        self.current
    }

    /// Load `sector` and make it current. `before_prepare_sector` goes
    /// out after map load and before setup; `enter_sector` once the
    /// sector is current.
    pub fn prepare_sector(&mut self, events: &EventCatalog, sector: SectorId) -> EventResult<()> {
        events.before_prepare_sector.notify(&())?;
        self.current = Some(sector);
        log::debug!("entering sector {sector}");
        events.enter_sector.notify(&sector)?;
        Ok(())
    }

    /// Create a soldier from `profile`. Announced before the soldier
    /// is assigned to a team and placed on the map, so listeners may
    /// adjust the profile's state first.
    pub fn create_soldier(
        &mut self,
        events: &EventCatalog,
        profile: ProfileId,
    ) -> EventResult<SoldierRef> {
        let soldier = SoldierRef {
            id: self.next_soldier_id,
            profile,
        };
        self.next_soldier_id += 1;
        events.soldier_created.notify(&soldier)?;
        Ok(soldier)
    }

    /// Hire a merc: create the soldier, then announce the hire.
    pub fn hire_merc(
        &mut self,
        events: &EventCatalog,
        profile: ProfileId,
    ) -> EventResult<SoldierRef> {
        let soldier = self.create_soldier(events, profile)?;
        events.merc_hired.notify(&soldier)?;
        Ok(soldier)
    }

    /// Ask `profile` to perform action record `action`. Returns true
    /// when a listener consumed the record; the caller falls back to
    /// the built-in dialogue records otherwise.
    pub fn trigger_npc_action(
        &self,
        events: &EventCatalog,
        profile: ProfileId,
        action: u16,
        quote: u8,
    ) -> EventResult<bool> {
        events.npc_do_action.notify(&NpcAction {
            profile,
            action,
            quote,
        })
    }
}

impl Default for SectorSystem {
    fn default() -> Self {
        Self::new()
    }
}
