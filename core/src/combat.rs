//! Combat resolution — explosion damage against map structures.
//!
//! The damage path is the canonical veto example: right before damage
//! is inflicted, `before_structure_damaged` goes out and any listener
//! may set the skip flag. The resolver then either drops the damage
//! entirely or applies it and reports the result on
//! `structure_damaged`.

use crate::catalog::{EventCatalog, StructureDamageCheck, StructureDamageReport};
use crate::error::EventResult;
use crate::rng::SimRng;
use crate::types::{GridNo, SectorId, StructureId};

/// A damageable structure element on the tactical map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Structure {
    pub id: StructureId,
    pub grid_no: GridNo,
    pub hp: u8,
}

impl Structure {
    pub fn new(id: StructureId, grid_no: GridNo, hp: u8) -> Self {
        Self { id, grid_no, hp }
    }
}

/// Outcome of one resolved explosion hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DamageOutcome {
    pub damage: u8,
    pub destroyed: bool,
}

pub struct CombatSystem {
    rng: SimRng,
}

impl CombatSystem {
    pub fn new(rng: SimRng) -> Self {
        Self { rng }
    }

    /// Resolve one explosion hit against `structure`, `distance` grids
    /// from the blast origin. Returns None when a listener suppressed
    /// the damage.
    pub fn damage_structure(
        &mut self,
        events: &EventCatalog,
        sector: SectorId,
        structure: &mut Structure,
        distance: u32,
    ) -> EventResult<Option<DamageOutcome>> {
        let check = StructureDamageCheck {
            sector,
            grid_no: structure.grid_no,
            structure: structure.id,
            distance,
        };
        let skip = events.before_structure_damaged.notify(&check)?;
        if skip {
            log::debug!(
                "structure {} in {sector}: damage suppressed by listener",
                structure.id
            );
            return Ok(None);
        }

        let damage = self.roll_damage(distance);
        structure.hp = structure.hp.saturating_sub(damage);
        let destroyed = structure.hp == 0;
        log::debug!(
            "structure {} in {sector}: {damage} damage, {} hp left",
            structure.id,
            structure.hp
        );

        events.structure_damaged.notify(&StructureDamageReport {
            sector,
            grid_no: structure.grid_no,
            structure: structure.id,
            damage,
            destroyed,
        })?;
        Ok(Some(DamageOutcome { damage, destroyed }))
    }

    /// Blast damage falls off linearly with distance, with a small
    /// deterministic variance roll on top.
    fn roll_damage(&mut self, distance: u32) -> u8 {
        let base = 40u32.saturating_sub(distance.saturating_mul(4)).max(5);
        let variance = self.rng.next_u64_below(10) as u32;
        (base + variance).min(u32::from(u8::MAX)) as u8
    }
}
