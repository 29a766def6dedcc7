//! Engine-level flows: publishers consult channel outputs to branch
//! their own behavior, end to end.

use sectorcmd_core::catalog::StrategicEventData;
use sectorcmd_core::clock::TimeCompression;
use sectorcmd_core::combat::Structure;
use sectorcmd_core::engine::SimEngine;
use sectorcmd_core::types::SectorId;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

const SEED: u64 = 0xDEAD_BEEF_CAFE_1234;

/// A listener that sets the skip flag suppresses damage processing;
/// the informational follow-up channel stays silent for that hit.
#[test]
fn skip_damage_veto_suppresses_the_hit() {
    let mut engine = SimEngine::new(SEED).expect("engine");
    let reports = Rc::new(Cell::new(0u32));

    engine
        .events
        .before_structure_damaged
        .register("protect_structure_1", |check, out: &mut bool| {
            if check.structure == 1 {
                *out = true;
            }
            Ok(())
        });
    {
        let reports = Rc::clone(&reports);
        engine.events.structure_damaged.register("report_counter", move |_, _| {
            reports.set(reports.get() + 1);
            Ok(())
        });
    }

    let sector = SectorId::ground(9, 1);
    let mut protected = Structure::new(1, 1200, 80);
    let mut exposed = Structure::new(2, 1201, 80);

    let outcome = engine
        .combat
        .damage_structure(&engine.events, sector, &mut protected, 2)
        .expect("resolve");
    assert!(outcome.is_none(), "Vetoed hit deals no damage");
    assert_eq!(protected.hp, 80, "Protected structure is untouched");
    assert_eq!(reports.get(), 0, "No damage report for a vetoed hit");

    let outcome = engine
        .combat
        .damage_structure(&engine.events, sector, &mut exposed, 2)
        .expect("resolve");
    let outcome = outcome.expect("unprotected hit lands");
    assert!(outcome.damage > 0);
    assert!(exposed.hp < 80);
    assert_eq!(reports.get(), 1);
}

/// Same seed, same hits — damage rolls are reproducible.
#[test]
fn damage_rolls_are_deterministic_per_seed() {
    let roll = |seed: u64| {
        let mut engine = SimEngine::new(seed).expect("engine");
        let mut structure = Structure::new(7, 900, 200);
        let sector = SectorId::ground(3, 4);
        let mut dealt = Vec::new();
        for distance in [0, 1, 4] {
            let outcome = engine
                .combat
                .damage_structure(&engine.events, sector, &mut structure, distance)
                .expect("resolve")
                .expect("no veto registered");
            dealt.push(outcome.damage);
        }
        dealt
    };

    assert_eq!(roll(SEED), roll(SEED), "Same seed must produce identical rolls");
}

/// Time compression is refused while any listener disallows it, and
/// allowed again once that listener is gone.
#[test]
fn time_compression_honors_the_disallow_flag() {
    let mut engine = SimEngine::new(SEED).expect("engine");

    let allowed = engine
        .clock
        .request_compression(&engine.events, TimeCompression::X60)
        .expect("request");
    assert!(allowed, "No listener registered: compression goes through");
    assert_eq!(engine.clock.compression, TimeCompression::X60);

    let token = engine
        .events
        .time_compress_disallowed
        .register("combat_in_progress", |_, out: &mut bool| {
            *out = true;
            Ok(())
        });

    engine.clock.compression = TimeCompression::Normal;
    let allowed = engine
        .clock
        .request_compression(&engine.events, TimeCompression::X5)
        .expect("request");
    assert!(!allowed, "Listener disallows compression");
    assert_eq!(engine.clock.compression, TimeCompression::Normal);

    // Dropping back to normal is always allowed, listener or not.
    let allowed = engine
        .clock
        .request_compression(&engine.events, TimeCompression::Normal)
        .expect("request");
    assert!(allowed);

    engine.events.time_compress_disallowed.unregister(token).expect("unregister");
    let allowed = engine
        .clock
        .request_compression(&engine.events, TimeCompression::X5)
        .expect("request");
    assert!(allowed, "Compression allowed again once the listener is gone");
}

/// A listener consuming a strategic event suppresses built-in
/// handling; unconsumed events fall through to it.
#[test]
fn consumed_strategic_events_skip_builtin_handling() {
    let mut engine = SimEngine::new(SEED).expect("engine");
    let consumed: Rc<RefCell<Vec<StrategicEventData>>> = Rc::new(RefCell::new(Vec::new()));

    {
        let consumed = Rc::clone(&consumed);
        engine
            .events
            .strategic_event
            .register("mod_campaign_beat", move |event, out: &mut bool| {
                if event.callback_id == 2 {
                    consumed.borrow_mut().push(*event);
                    *out = true;
                }
                Ok(())
            });
    }

    engine.scheduler.schedule(1, 100, 0);
    engine.scheduler.schedule(2, 200, 7);
    engine.scheduler.schedule(3, 300, 0);

    let fired = engine
        .scheduler
        .advance_to(&engine.events, &mut engine.clock, 1000)
        .expect("advance");
    assert_eq!(fired, 3, "All due events processed");
    assert_eq!(engine.clock.minute, 1000, "Clock lands on the target minute");
    assert_eq!(consumed.borrow().len(), 1, "Exactly one event was consumed");
    assert_eq!(
        engine.scheduler.builtin_handled(),
        2,
        "Unconsumed events fall through to built-in handling"
    );
    assert_eq!(engine.scheduler.pending_count(), 0);
}

/// Due events are delivered in minute order, and the clock passes
/// through each due minute on the way.
#[test]
fn strategic_events_fire_in_minute_order() {
    let mut engine = SimEngine::new(SEED).expect("engine");
    let minutes: Rc<RefCell<Vec<u32>>> = Rc::new(RefCell::new(Vec::new()));

    {
        let minutes = Rc::clone(&minutes);
        engine.events.strategic_event.register("order_probe", move |event, _| {
            minutes.borrow_mut().push(event.minute);
            Ok(())
        });
    }

    engine.scheduler.schedule(1, 300, 0);
    engine.scheduler.schedule(1, 100, 0);
    engine.scheduler.schedule(1, 200, 0);
    engine
        .scheduler
        .advance_to(&engine.events, &mut engine.clock, 250)
        .expect("advance");

    assert_eq!(*minutes.borrow(), vec![100, 200], "Only due events, in minute order");
    assert_eq!(engine.scheduler.pending_count(), 1, "The 300-minute event is still queued");
}

/// The daily quest sweep aggregates listener verdicts.
#[test]
fn quest_sweep_aggregates_verdicts() {
    let engine = SimEngine::new(SEED).expect("engine");

    engine.events.check_quests.register("weekly_delivery", |check, out: &mut bool| {
        if check.day % 7 == 0 {
            *out = true;
        }
        Ok(())
    });
    engine.events.check_quests.register("never_triggers", |_, _| Ok(()));

    assert!(engine.scheduler.check_quests(&engine.events, 14).expect("sweep"));
    assert!(!engine.scheduler.check_quests(&engine.events, 13).expect("sweep"));
}

/// Campaign progress uses the engine-computed value unless a listener
/// overrides it through the output slot.
#[test]
fn player_progress_listener_override() {
    let mut engine = SimEngine::new(SEED).expect("engine");
    engine.scheduler.set_base_progress(10);

    assert_eq!(engine.scheduler.player_progress(&engine.events).expect("progress"), 10);

    engine
        .events
        .calc_player_progress
        .register("mod_progress_model", |_, out| {
            out.percent = Some(55);
            Ok(())
        });
    assert_eq!(engine.scheduler.player_progress(&engine.events).expect("progress"), 55);
}

/// Sector preparation announces in order: prepare first, entry once
/// the sector is current.
#[test]
fn sector_preparation_announces_in_order() {
    let mut engine = SimEngine::new(SEED).expect("engine");
    let seen: Rc<RefCell<Vec<String>>> = Rc::new(RefCell::new(Vec::new()));

    {
        let seen = Rc::clone(&seen);
        engine.events.before_prepare_sector.register("probe", move |_, _| {
            seen.borrow_mut().push("prepare".to_string());
            Ok(())
        });
    }
    {
        let seen = Rc::clone(&seen);
        engine.events.enter_sector.register("probe", move |sector, _| {
            seen.borrow_mut().push(format!("enter {sector}"));
            Ok(())
        });
    }

    let sector = SectorId::ground(10, 1);
    engine.sectors.prepare_sector(&engine.events, sector).expect("prepare");
    assert_eq!(*seen.borrow(), vec!["prepare".to_string(), "enter A10".to_string()]);
    assert_eq!(engine.sectors.current_sector(), Some(sector));
}

/// Soldier creation and hiring announce the same soldier reference the
/// caller gets back.
#[test]
fn soldier_creation_announces_the_reference() {
    let mut engine = SimEngine::new(SEED).expect("engine");
    let announced = Rc::new(Cell::new(0u16));

    {
        let announced = Rc::clone(&announced);
        engine.events.soldier_created.register("probe", move |soldier, _| {
            announced.set(soldier.id);
            Ok(())
        });
    }
    let hired = Rc::new(Cell::new(false));
    {
        let hired = Rc::clone(&hired);
        engine.events.merc_hired.register("probe", move |_, _| {
            hired.set(true);
            Ok(())
        });
    }

    let first = engine.sectors.create_soldier(&engine.events, 57).expect("create");
    assert_eq!(announced.get(), first.id);
    assert!(!hired.get());

    let second = engine.sectors.hire_merc(&engine.events, 12).expect("hire");
    assert_eq!(announced.get(), second.id);
    assert!(hired.get(), "Hiring announces on merc_hired as well");
    assert_ne!(first.id, second.id);
}

/// NPC action records are offered to listeners first; the consuming
/// listener short-circuits the rest of the stop-on-set frame.
#[test]
fn npc_action_consumption_short_circuits() {
    let engine = SimEngine::new(SEED).expect("engine");
    let later_runs = Rc::new(Cell::new(0u32));

    engine.events.npc_do_action.register("mod_npc_handler", |action, out: &mut bool| {
        if action.profile == 61 {
            *out = true;
        }
        Ok(())
    });
    {
        let later_runs = Rc::clone(&later_runs);
        engine.events.npc_do_action.register("second_handler", move |_, _| {
            later_runs.set(later_runs.get() + 1);
            Ok(())
        });
    }

    let handled = engine
        .sectors
        .trigger_npc_action(&engine.events, 61, 12, 3)
        .expect("trigger");
    assert!(handled, "First listener consumed the record");
    assert_eq!(later_runs.get(), 0, "Stop-on-set skips the second listener");

    let handled = engine
        .sectors
        .trigger_npc_action(&engine.events, 7, 12, 3)
        .expect("trigger");
    assert!(!handled, "Unhandled record falls back to built-in processing");
    assert_eq!(later_runs.get(), 1);
}

/// Mod hot-reload drops every script listener while native listeners
/// and channels survive, and reopens the registration phase.
#[test]
fn mod_hot_reload_drops_script_listeners_only() {
    use sectorcmd_core::binding::{ScriptCallable, ScriptType, ScriptValue};
    use sectorcmd_core::catalog::names;

    let engine = SimEngine::new(SEED).expect("engine");
    let script_calls = Rc::new(Cell::new(0u32));
    let native_calls = Rc::new(Cell::new(0u32));

    let make_callable = |script_calls: &Rc<Cell<u32>>| {
        let script_calls = Rc::clone(script_calls);
        ScriptCallable::new(
            "onTimeCompress",
            vec![ScriptType::Bool],
            move |_| {
                script_calls.set(script_calls.get() + 1);
                Ok(ScriptValue::Nil)
            },
        )
    };

    engine
        .bindings
        .bind(names::TIME_COMPRESS_DISALLOWED, make_callable(&script_calls))
        .expect("bind");
    {
        let native_calls = Rc::clone(&native_calls);
        engine.events.time_compress_disallowed.register("native", move |_, _| {
            native_calls.set(native_calls.get() + 1);
            Ok(())
        });
    }
    engine.finish_init();

    engine.events.time_compress_disallowed.notify(&()).expect("notify");
    assert_eq!(script_calls.get(), 1);
    assert_eq!(native_calls.get(), 1);

    engine.reload_mods();
    engine.events.time_compress_disallowed.notify(&()).expect("notify");
    assert_eq!(script_calls.get(), 1, "Script listener is gone after reload");
    assert_eq!(native_calls.get(), 2, "Native listener survives the reload");

    // The registration phase is open again for the reloaded mod set.
    engine
        .bindings
        .bind(names::TIME_COMPRESS_DISALLOWED, make_callable(&script_calls))
        .expect("rebind after reload");
}

/// Item pickups are recorded and announced.
#[test]
fn item_pickup_is_recorded_and_announced() {
    let mut engine = SimEngine::new(SEED).expect("engine");
    let pickups = Rc::new(Cell::new(0u32));

    {
        let pickups = Rc::clone(&pickups);
        engine.events.soldier_got_item.register("probe", move |pickup, _| {
            assert_eq!(pickup.item, 90);
            pickups.set(pickups.get() + 1);
            Ok(())
        });
    }

    let soldier = engine.sectors.create_soldier(&engine.events, 57).expect("create");
    engine
        .inventory
        .give_item(&engine.events, soldier, 90, 1300, 0)
        .expect("give");
    assert_eq!(engine.inventory.carried_count(soldier.id), 1);
    assert_eq!(pickups.get(), 1);
}
