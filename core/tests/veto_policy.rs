//! Output-slot and dispatch-policy semantics: stop-on-set
//! short-circuiting versus continue-always cooperation.

use sectorcmd_core::channel::{DispatchPolicy, ErrorPolicy, EventChannel};
use sectorcmd_core::registry::EventRegistry;
use std::cell::Cell;
use std::rc::Rc;

fn flag_channel(
    registry: &EventRegistry,
    name: &str,
    policy: DispatchPolicy,
) -> Rc<EventChannel<u32, bool>> {
    registry
        .define::<u32, bool>(name, policy, ErrorPolicy::LogAndContinue)
        .expect("define")
}

/// Once a listener sets the flag on a stop-on-set channel, no later
/// listener in that frame is invoked.
#[test]
fn stop_on_set_short_circuits_remaining_listeners() {
    let registry = EventRegistry::new();
    let channel = flag_channel(&registry, "stop_test", DispatchPolicy::StopOnSet);
    let runs = Rc::new(Cell::new(0u32));

    for set_flag in [false, true, false] {
        let runs = Rc::clone(&runs);
        channel.register("counting", move |_, out: &mut bool| {
            runs.set(runs.get() + 1);
            if set_flag {
                *out = true;
            }
            Ok(())
        });
    }

    let triggered = channel.notify(&0).expect("notify");
    assert!(triggered, "Second listener set the flag");
    assert_eq!(runs.get(), 2, "Third listener must not run after the flag is set");
}

/// Continue-always channels invoke every listener regardless of
/// output-slot mutations.
#[test]
fn continue_always_runs_every_listener() {
    let registry = EventRegistry::new();
    let channel = flag_channel(&registry, "continue_test", DispatchPolicy::ContinueAlways);
    let runs = Rc::new(Cell::new(0u32));

    for set_flag in [true, false, false] {
        let runs = Rc::clone(&runs);
        channel.register("counting", move |_, out: &mut bool| {
            runs.set(runs.get() + 1);
            if set_flag {
                *out = true;
            }
            Ok(())
        });
    }

    let triggered = channel.notify(&0).expect("notify");
    assert!(triggered, "First listener set the flag");
    assert_eq!(runs.get(), 3, "All listeners run even after the flag is set");
}

/// Cooperative aggregation: later listeners observe the running value
/// and may OR into it without clearing earlier verdicts.
#[test]
fn listeners_observe_the_running_value() {
    let registry = EventRegistry::new();
    let channel = flag_channel(&registry, "aggregate_test", DispatchPolicy::ContinueAlways);
    let observed_set = Rc::new(Cell::new(false));

    channel.register("setter", |_, out: &mut bool| {
        *out = true;
        Ok(())
    });
    {
        let observed_set = Rc::clone(&observed_set);
        channel.register("observer", move |_, out: &mut bool| {
            observed_set.set(*out);
            *out |= false; // a no-trigger verdict must not clear the flag
            Ok(())
        });
    }

    let result = channel.notify(&0).expect("notify");
    assert!(observed_set.get(), "Second listener sees the flag already set");
    assert!(result, "Aggregated outcome keeps the earlier verdict");
}

/// With no listeners registered, notify returns the declared default.
#[test]
fn empty_channel_returns_declared_default() {
    let registry = EventRegistry::new();
    let channel = flag_channel(&registry, "default_test", DispatchPolicy::StopOnSet);
    let result = channel.notify(&0).expect("notify");
    assert!(!result, "Default flag value is not-triggered");
}
