//! The event catalog — every channel the engine publishes on.
//!
//! RULE: Channel names, signatures, and policies are declared here,
//! once, at engine initialization. Publishers and mods both reach the
//! channels through this catalog — never through globals.
//!
//! Dispatch policy is an explicit property of each definition. The
//! stop-on-set channels are the "consumed" style (`strategic_event`,
//! `npc_do_action`, `time_compress_disallowed`): once a listener claims
//! the occurrence there is nothing left for later listeners to decide.
//! Everything else is continue-always so every mod observes every
//! occurrence, including the veto flags, which later listeners may
//! still read or overwrite cooperatively.

use crate::binding::{ScriptArgs, ScriptBindings, ScriptOutput, ScriptType, ScriptValue};
use crate::channel::{DispatchPolicy, ErrorPolicy, EventChannel, EventOutput};
use crate::error::EventResult;
use crate::registry::EventRegistry;
use crate::types::{GameMinute, GridNo, ItemId, ProfileId, SectorId, SoldierRef, StructureId};
use serde::Serialize;
use std::rc::Rc;

/// Stable channel names. External consumers (scripts, UI, analytics)
/// address channels by these.
pub mod names {
    pub const SOLDIER_CREATED: &str = "soldier_created";
    pub const BEFORE_PREPARE_SECTOR: &str = "before_prepare_sector";
    pub const BEFORE_STRUCTURE_DAMAGED: &str = "before_structure_damaged";
    pub const STRUCTURE_DAMAGED: &str = "structure_damaged";
    pub const STRATEGIC_EVENT: &str = "strategic_event";
    pub const CHECK_QUESTS: &str = "check_quests";
    pub const TIME_COMPRESS_DISALLOWED: &str = "time_compress_disallowed";
    pub const MERC_HIRED: &str = "merc_hired";
    pub const ENTER_SECTOR: &str = "enter_sector";
    pub const NPC_DO_ACTION: &str = "npc_do_action";
    pub const CALC_PLAYER_PROGRESS: &str = "calc_player_progress";
    pub const SOLDIER_GOT_ITEM: &str = "soldier_got_item";
}

// ── Payload records ───────────────────────────────────────────────

/// Published right before explosion damage is inflicted on a structure.
/// The output flag suppresses damage processing when set.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct StructureDamageCheck {
    pub sector: SectorId,
    pub grid_no: GridNo,
    pub structure: StructureId,
    /// Grids between the blast origin and the structure.
    pub distance: u32,
}

/// Published just after a structure took explosion damage.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct StructureDamageReport {
    pub sector: SectorId,
    pub grid_no: GridNo,
    pub structure: StructureId,
    pub damage: u8,
    pub destroyed: bool,
}

/// A scheduled strategic event coming due. The output flag marks it
/// consumed; unhandled events fall back to built-in processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StrategicEventData {
    pub callback_id: u8,
    pub minute: GameMinute,
    pub param: u32,
}

/// Daily quest sweep. Listeners OR their verdict into the result flag.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct QuestCheck {
    pub day: u32,
}

/// An NPC being asked to perform a scripted action record.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct NpcAction {
    pub profile: ProfileId,
    pub action: u16,
    pub quote: u8,
}

/// A soldier picking up an item from the tactical map.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ItemPickup {
    pub soldier: SoldierRef,
    pub item: ItemId,
    pub grid_no: GridNo,
    pub sector_z: i8,
}

/// Output slot of `calc_player_progress`: a listener may override the
/// engine-computed campaign progress percentage.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct ProgressOverride {
    pub percent: Option<u8>,
}

impl EventOutput for ProgressOverride {
    fn initial() -> Self {
        Self::default()
    }

    fn is_set(&self) -> bool {
        self.percent.is_some()
    }
}

impl ScriptOutput for ProgressOverride {
    const SLOT: Option<ScriptType> = Some(ScriptType::Int);

    fn to_value(&self) -> Option<ScriptValue> {
        Some(match self.percent {
            Some(percent) => ScriptValue::Int(i64::from(percent)),
            None => ScriptValue::Nil,
        })
    }

    fn merge(&mut self, value: ScriptValue) -> anyhow::Result<()> {
        match value {
            ScriptValue::Nil => Ok(()),
            ScriptValue::Int(percent @ 0..=100) => {
                self.percent = Some(percent as u8);
                Ok(())
            }
            ScriptValue::Int(out_of_range) => {
                anyhow::bail!("progress override {out_of_range} outside 0..=100")
            }
            other => anyhow::bail!("expected int return for progress slot, got {other:?}"),
        }
    }
}

// ── Script marshaling ─────────────────────────────────────────────
// Object references flatten to integer handles; records flatten to
// their fields in declaration order.

impl ScriptArgs for SoldierRef {
    const TAGS: &'static [ScriptType] = &[ScriptType::Int];

    fn to_values(&self) -> Vec<ScriptValue> {
        vec![ScriptValue::Int(i64::from(self.id))]
    }
}

impl ScriptArgs for SectorId {
    const TAGS: &'static [ScriptType] = &[ScriptType::Int, ScriptType::Int, ScriptType::Int];

    fn to_values(&self) -> Vec<ScriptValue> {
        vec![
            ScriptValue::Int(i64::from(self.x)),
            ScriptValue::Int(i64::from(self.y)),
            ScriptValue::Int(i64::from(self.z)),
        ]
    }
}

impl ScriptArgs for StructureDamageCheck {
    const TAGS: &'static [ScriptType] = &[
        ScriptType::Int, // sector x
        ScriptType::Int, // sector y
        ScriptType::Int, // sector z
        ScriptType::Int, // grid no
        ScriptType::Int, // structure handle
        ScriptType::Int, // distance
    ];

    fn to_values(&self) -> Vec<ScriptValue> {
        vec![
            ScriptValue::Int(i64::from(self.sector.x)),
            ScriptValue::Int(i64::from(self.sector.y)),
            ScriptValue::Int(i64::from(self.sector.z)),
            ScriptValue::Int(i64::from(self.grid_no)),
            ScriptValue::Int(i64::from(self.structure)),
            ScriptValue::Int(i64::from(self.distance)),
        ]
    }
}

impl ScriptArgs for StructureDamageReport {
    const TAGS: &'static [ScriptType] = &[
        ScriptType::Int,
        ScriptType::Int,
        ScriptType::Int,
        ScriptType::Int,
        ScriptType::Int,
        ScriptType::Int,  // damage
        ScriptType::Bool, // destroyed
    ];

    fn to_values(&self) -> Vec<ScriptValue> {
        vec![
            ScriptValue::Int(i64::from(self.sector.x)),
            ScriptValue::Int(i64::from(self.sector.y)),
            ScriptValue::Int(i64::from(self.sector.z)),
            ScriptValue::Int(i64::from(self.grid_no)),
            ScriptValue::Int(i64::from(self.structure)),
            ScriptValue::Int(i64::from(self.damage)),
            ScriptValue::Bool(self.destroyed),
        ]
    }
}

impl ScriptArgs for StrategicEventData {
    const TAGS: &'static [ScriptType] = &[ScriptType::Int, ScriptType::Int, ScriptType::Int];

    fn to_values(&self) -> Vec<ScriptValue> {
        vec![
            ScriptValue::Int(i64::from(self.callback_id)),
            ScriptValue::Int(i64::from(self.minute)),
            ScriptValue::Int(i64::from(self.param)),
        ]
    }
}

impl ScriptArgs for QuestCheck {
    const TAGS: &'static [ScriptType] = &[ScriptType::Int];

    fn to_values(&self) -> Vec<ScriptValue> {
        vec![ScriptValue::Int(i64::from(self.day))]
    }
}

impl ScriptArgs for NpcAction {
    const TAGS: &'static [ScriptType] = &[ScriptType::Int, ScriptType::Int, ScriptType::Int];

    fn to_values(&self) -> Vec<ScriptValue> {
        vec![
            ScriptValue::Int(i64::from(self.profile)),
            ScriptValue::Int(i64::from(self.action)),
            ScriptValue::Int(i64::from(self.quote)),
        ]
    }
}

impl ScriptArgs for ItemPickup {
    const TAGS: &'static [ScriptType] = &[
        ScriptType::Int, // soldier handle
        ScriptType::Int, // item id
        ScriptType::Int, // grid no
        ScriptType::Int, // sector z
    ];

    fn to_values(&self) -> Vec<ScriptValue> {
        vec![
            ScriptValue::Int(i64::from(self.soldier.id)),
            ScriptValue::Int(i64::from(self.item)),
            ScriptValue::Int(i64::from(self.grid_no)),
            ScriptValue::Int(i64::from(self.sector_z)),
        ]
    }
}

// ── Catalog ───────────────────────────────────────────────────────

/// Typed accessors for every engine channel. Built once at engine
/// initialization, then threaded to subsystems by reference.
pub struct EventCatalog {
    pub soldier_created: Rc<EventChannel<SoldierRef, ()>>,
    pub before_prepare_sector: Rc<EventChannel<(), ()>>,
    pub before_structure_damaged: Rc<EventChannel<StructureDamageCheck, bool>>,
    pub structure_damaged: Rc<EventChannel<StructureDamageReport, ()>>,
    pub strategic_event: Rc<EventChannel<StrategicEventData, bool>>,
    pub check_quests: Rc<EventChannel<QuestCheck, bool>>,
    pub time_compress_disallowed: Rc<EventChannel<(), bool>>,
    pub merc_hired: Rc<EventChannel<SoldierRef, ()>>,
    pub enter_sector: Rc<EventChannel<SectorId, ()>>,
    pub npc_do_action: Rc<EventChannel<NpcAction, bool>>,
    pub calc_player_progress: Rc<EventChannel<(), ProgressOverride>>,
    pub soldier_got_item: Rc<EventChannel<ItemPickup, ()>>,
}

impl EventCatalog {
    /// Define every engine channel on `registry`. Idempotent against an
    /// identically-populated registry; conflicting prior definitions
    /// surface as `DuplicateChannel`.
    pub fn install(registry: &EventRegistry) -> EventResult<Self> {
        use DispatchPolicy::{ContinueAlways, StopOnSet};
        use ErrorPolicy::LogAndContinue;

        Ok(Self {
            soldier_created: registry.define(
                names::SOLDIER_CREATED,
                ContinueAlways,
                LogAndContinue,
            )?,
            before_prepare_sector: registry.define(
                names::BEFORE_PREPARE_SECTOR,
                ContinueAlways,
                LogAndContinue,
            )?,
            before_structure_damaged: registry.define(
                names::BEFORE_STRUCTURE_DAMAGED,
                ContinueAlways,
                LogAndContinue,
            )?,
            structure_damaged: registry.define(
                names::STRUCTURE_DAMAGED,
                ContinueAlways,
                LogAndContinue,
            )?,
            strategic_event: registry.define(names::STRATEGIC_EVENT, StopOnSet, LogAndContinue)?,
            check_quests: registry.define(names::CHECK_QUESTS, ContinueAlways, LogAndContinue)?,
            time_compress_disallowed: registry.define(
                names::TIME_COMPRESS_DISALLOWED,
                StopOnSet,
                LogAndContinue,
            )?,
            merc_hired: registry.define(names::MERC_HIRED, ContinueAlways, LogAndContinue)?,
            enter_sector: registry.define(names::ENTER_SECTOR, ContinueAlways, LogAndContinue)?,
            npc_do_action: registry.define(names::NPC_DO_ACTION, StopOnSet, LogAndContinue)?,
            calc_player_progress: registry.define(
                names::CALC_PLAYER_PROGRESS,
                ContinueAlways,
                LogAndContinue,
            )?,
            soldier_got_item: registry.define(
                names::SOLDIER_GOT_ITEM,
                ContinueAlways,
                LogAndContinue,
            )?,
        })
    }

    /// Expose every catalog channel to the scripting collaborator.
    pub fn expose_to_scripts(&self, bindings: &ScriptBindings) {
        bindings.expose(&self.soldier_created);
        bindings.expose(&self.before_prepare_sector);
        bindings.expose(&self.before_structure_damaged);
        bindings.expose(&self.structure_damaged);
        bindings.expose(&self.strategic_event);
        bindings.expose(&self.check_quests);
        bindings.expose(&self.time_compress_disallowed);
        bindings.expose(&self.merc_hired);
        bindings.expose(&self.enter_sector);
        bindings.expose(&self.npc_do_action);
        bindings.expose(&self.calc_player_progress);
        bindings.expose(&self.soldier_got_item);
    }
}
