//! Inventory handling — item pickups and per-soldier carry lists.

use crate::catalog::{EventCatalog, ItemPickup};
use crate::error::EventResult;
use crate::types::{GridNo, ItemId, SoldierId, SoldierRef};
use std::collections::HashMap;

pub struct InventorySystem {
    carried: HashMap<SoldierId, Vec<ItemId>>,
}

impl InventorySystem {
    pub fn new() -> Self {
        Self {
            carried: HashMap::new(),
        }
    }

    /// Put `item` into `soldier`'s inventory and announce the pickup.
    pub fn give_item(
        &mut self,
        events: &EventCatalog,
        soldier: SoldierRef,
        item: ItemId,
        grid_no: GridNo,
        sector_z: i8,
    ) -> EventResult<()> {
        self.carried.entry(soldier.id).or_default().push(item);
        events.soldier_got_item.notify(&ItemPickup {
            soldier,
            item,
            grid_no,
            sector_z,
        })?;
        Ok(())
    }

    pub fn carried_count(&self, soldier: SoldierId) -> usize {
        self.carried.get(&soldier).map_or(0, Vec::len)
    }
}

impl Default for InventorySystem {
    fn default() -> Self {
        Self::new()
    }
}
