//! mod-runner: headless scenario runner for Sector Command.
//!
//! Wires a small demonstration mod (simulated script callables) into
//! the engine, runs a short tactical-and-strategic scenario, and
//! prints JSON analytics lines for every structure damage report.
//!
//! Usage:
//!   mod-runner --seed 12345 --target-minute 1500

use anyhow::Result;
use sectorcmd_core::binding::{ScriptCallable, ScriptType, ScriptValue};
use sectorcmd_core::catalog::names;
use sectorcmd_core::clock::TimeCompression;
use sectorcmd_core::combat::Structure;
use sectorcmd_core::engine::SimEngine;
use sectorcmd_core::types::SectorId;
use std::env;

struct Args {
    seed: u64,
    target_minute: u32,
}

/// End-of-run record, one JSON line for downstream analytics.
#[derive(serde::Serialize)]
struct ScenarioSummary {
    seed: u64,
    game_minute: u32,
    structures_destroyed: u32,
    hits_suppressed: u32,
    strategic_events_fired: u32,
    builtin_handled: u32,
    quest_triggered: bool,
    campaign_progress: u8,
}

fn parse_args() -> Result<Args> {
    let mut args = Args {
        seed: 20_260_806,
        target_minute: 1500,
    };
    let mut iter = env::args().skip(1);
    while let Some(flag) = iter.next() {
        match flag.as_str() {
            "--seed" => {
                let value = iter.next().ok_or_else(|| anyhow::anyhow!("--seed needs a value"))?;
                args.seed = value.parse()?;
            }
            "--target-minute" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--target-minute needs a value"))?;
                args.target_minute = value.parse()?;
            }
            other => anyhow::bail!("unknown argument: {other}"),
        }
    }
    Ok(args)
}

/// The demonstration mod: what a scripted mod would register during
/// its initialization phase.
fn install_demo_mod(engine: &SimEngine) -> Result<()> {
    // Structure 1 is the mod's quest-critical radio tower: explosions
    // never damage it.
    engine.bindings.bind(
        names::BEFORE_STRUCTURE_DAMAGED,
        ScriptCallable::new(
            "onProtectRadioTower",
            vec![
                ScriptType::Int,
                ScriptType::Int,
                ScriptType::Int,
                ScriptType::Int,
                ScriptType::Int,
                ScriptType::Int,
                ScriptType::Bool,
            ],
            |args| {
                if args[4] == ScriptValue::Int(1) {
                    return Ok(ScriptValue::Bool(true));
                }
                Ok(ScriptValue::Nil)
            },
        ),
    )?;

    // The mod replaces the callback-2 campaign beat with its own.
    engine.bindings.bind(
        names::STRATEGIC_EVENT,
        ScriptCallable::new(
            "onStrategicEvent",
            vec![ScriptType::Int, ScriptType::Int, ScriptType::Int],
            |args| {
                if args[0] == ScriptValue::Int(2) {
                    log::info!("demo mod consumed strategic event callback=2");
                    return Ok(ScriptValue::Bool(true));
                }
                Ok(ScriptValue::Nil)
            },
        ),
    )?;

    // Weekly supply-drop quest.
    engine.bindings.bind(
        names::CHECK_QUESTS,
        ScriptCallable::new(
            "onCheckQuests",
            vec![ScriptType::Int, ScriptType::Bool],
            |args| match args[0] {
                ScriptValue::Int(day) => Ok(ScriptValue::Bool(day % 7 == 0)),
                ref other => anyhow::bail!("unexpected day argument: {other:?}"),
            },
        ),
    )?;

    // The mod drives its own campaign progress model.
    engine.bindings.bind(
        names::CALC_PLAYER_PROGRESS,
        ScriptCallable::new("onCalcProgress", vec![ScriptType::Int], |_| {
            Ok(ScriptValue::Int(42))
        }),
    )?;

    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let args = parse_args()?;

    let mut engine = SimEngine::new(args.seed)?;
    install_demo_mod(&engine)?;

    // Native analytics hook: one JSON line per structure damage report.
    engine.events.structure_damaged.register("analytics:jsonl", |report, _| {
        println!("{}", serde_json::to_string(report)?);
        Ok(())
    });

    engine.finish_init();

    // ── Tactical: assault on sector A9 ─────────────────────────────
    let sector = SectorId::ground(9, 1);
    engine.sectors.prepare_sector(&engine.events, sector)?;
    let raider = engine.sectors.hire_merc(&engine.events, 57)?;
    engine.inventory.give_item(&engine.events, raider, 90, 1300, 0)?;

    let mut structures = vec![
        Structure::new(1, 1200, 120), // radio tower — mod-protected
        Structure::new(2, 1201, 60),
        Structure::new(3, 1210, 45),
    ];
    let mut destroyed = 0u32;
    let mut suppressed = 0u32;
    for structure in &mut structures {
        let distance = u32::from(structure.grid_no as u16 % 4);
        match engine
            .combat
            .damage_structure(&engine.events, sector, structure, distance)?
        {
            Some(outcome) if outcome.destroyed => destroyed += 1,
            Some(_) => {}
            None => suppressed += 1,
        }
    }

    // ── Strategic: scheduled events, quests, compression ───────────
    engine.scheduler.set_base_progress(15);
    engine.scheduler.schedule(1, 240, 0);
    engine.scheduler.schedule(2, 480, 7);
    engine.scheduler.schedule(3, 720, 0);

    if !engine
        .clock
        .request_compression(&engine.events, TimeCompression::X60)?
    {
        log::info!("time compression refused by a listener");
    }
    let fired = engine
        .scheduler
        .advance_to(&engine.events, &mut engine.clock, args.target_minute)?;
    let quest_triggered = engine
        .scheduler
        .check_quests(&engine.events, engine.clock.day())?;
    let progress = engine.scheduler.player_progress(&engine.events)?;

    println!("── scenario summary ──────────────────────────");
    println!("seed:                 {}", args.seed);
    println!("game minute:          {}", engine.clock.minute);
    println!("structures destroyed: {destroyed}");
    println!("hits suppressed:      {suppressed} (mod veto)");
    println!("strategic events:     {fired} fired, {} built-in", engine.scheduler.builtin_handled());
    println!("quest triggered:      {quest_triggered}");
    println!("campaign progress:    {progress}%");

    let summary = ScenarioSummary {
        seed: args.seed,
        game_minute: engine.clock.minute,
        structures_destroyed: destroyed,
        hits_suppressed: suppressed,
        strategic_events_fired: fired,
        builtin_handled: engine.scheduler.builtin_handled(),
        quest_triggered,
        campaign_progress: progress,
    };
    println!("{}", serde_json::to_string(&summary)?);

    Ok(())
}
