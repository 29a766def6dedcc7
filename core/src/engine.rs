//! The engine context — wires the registry, catalog, bindings, clock,
//! and subsystems into one owned object.
//!
//! RULES:
//!   - Channels are defined exactly once, here, at construction.
//!   - Script listeners bind only between construction and
//!     `finish_init` (or after a `reload_mods` teardown).
//!   - All randomness flows through the RngBank.
//!   - Everything lives on the simulation thread; nothing here is Send.

use crate::binding::ScriptBindings;
use crate::catalog::EventCatalog;
use crate::clock::GameClock;
use crate::combat::CombatSystem;
use crate::error::EventResult;
use crate::inventory::InventorySystem;
use crate::registry::EventRegistry;
use crate::rng::{RngBank, RngStream};
use crate::sector::SectorSystem;
use crate::strategic::StrategicScheduler;

pub struct SimEngine {
    pub registry: EventRegistry,
    pub events: EventCatalog,
    pub bindings: ScriptBindings,
    pub clock: GameClock,
    pub combat: CombatSystem,
    pub sectors: SectorSystem,
    pub scheduler: StrategicScheduler,
    pub inventory: InventorySystem,
}

impl SimEngine {
    /// Build a fully wired engine: define the catalog, expose it to
    /// scripts, and seed the subsystem RNG streams.
    pub fn new(seed: u64) -> EventResult<Self> {
        let registry = EventRegistry::new();
        let events = EventCatalog::install(&registry)?;
        let bindings = ScriptBindings::new();
        events.expose_to_scripts(&bindings);
        let rng_bank = RngBank::new(seed);

        Ok(Self {
            registry,
            events,
            bindings,
            clock: GameClock::new(),
            combat: CombatSystem::new(rng_bank.stream(RngStream::Combat)),
            sectors: SectorSystem::new(),
            scheduler: StrategicScheduler::new(),
            inventory: InventorySystem::new(),
        })
    }

    /// Close the mod initialization phase. Call once all scripts have
    /// registered, before the first simulation step.
    pub fn finish_init(&self) {
        self.bindings.seal();
        log::debug!(
            "initialization finished: {} script listeners bound",
            self.bindings.bound_count()
        );
    }

    /// Hot-reload teardown: drop every script listener and reopen the
    /// initialization phase. Native listeners and channels survive.
    pub fn reload_mods(&self) {
        log::debug!("mod reload: dropping {} script listeners", self.bindings.bound_count());
        self.bindings.reset();
    }
}
