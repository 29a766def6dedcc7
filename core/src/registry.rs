//! Named channel registry — the engine-owned home of every channel.
//!
//! RULE: No process-wide globals. Subsystems reach a channel through
//! the registry (or the catalog accessor built from it), which the
//! engine context passes by reference.

use crate::channel::{DispatchPolicy, ErrorPolicy, EventChannel, EventOutput};
use crate::error::{EventError, EventResult};
use std::any::{type_name, Any, TypeId};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

struct ChannelEntry {
    payload: TypeId,
    output: TypeId,
    payload_name: &'static str,
    output_name: &'static str,
    dispatch_policy: DispatchPolicy,
    error_policy: ErrorPolicy,
    channel: Rc<dyn Any>,
}

impl ChannelEntry {
    fn signature(&self) -> String {
        format!("({}, {})", self.payload_name, self.output_name)
    }
}

/// All channels of one engine instance, keyed by stable name.
pub struct EventRegistry {
    channels: RefCell<HashMap<String, ChannelEntry>>,
}

impl EventRegistry {
    pub fn new() -> Self {
        Self {
            channels: RefCell::new(HashMap::new()),
        }
    }

    /// Define a channel once. Defining the same name again with an
    /// identical signature and identical policies returns the existing
    /// channel; any difference is a `DuplicateChannel` error, fatal at
    /// startup.
    pub fn define<E: 'static, O: EventOutput>(
        &self,
        name: &str,
        dispatch_policy: DispatchPolicy,
        error_policy: ErrorPolicy,
    ) -> EventResult<Rc<EventChannel<E, O>>> {
        let mut channels = self.channels.borrow_mut();
        if let Some(entry) = channels.get(name) {
            let identical = entry.payload == TypeId::of::<E>()
                && entry.output == TypeId::of::<O>()
                && entry.dispatch_policy == dispatch_policy
                && entry.error_policy == error_policy;
            if !identical {
                return Err(EventError::DuplicateChannel {
                    name: name.to_string(),
                });
            }
            return downcast_entry(name, entry);
        }

        let channel = Rc::new(EventChannel::<E, O>::new(name, dispatch_policy, error_policy));
        channels.insert(
            name.to_string(),
            ChannelEntry {
                payload: TypeId::of::<E>(),
                output: TypeId::of::<O>(),
                payload_name: type_name::<E>(),
                output_name: type_name::<O>(),
                dispatch_policy,
                error_policy,
                channel: Rc::clone(&channel) as Rc<dyn Any>,
            },
        );
        log::debug!("defined channel '{name}'");
        Ok(channel)
    }

    /// Typed lookup by name. `UnknownChannel` if the name is undefined,
    /// `SignatureMismatch` if it is defined under a different signature.
    pub fn channel<E: 'static, O: EventOutput>(
        &self,
        name: &str,
    ) -> EventResult<Rc<EventChannel<E, O>>> {
        let channels = self.channels.borrow();
        let entry = channels.get(name).ok_or_else(|| EventError::UnknownChannel {
            name: name.to_string(),
        })?;
        downcast_entry(name, entry)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.channels.borrow().contains_key(name)
    }

    /// Names of all defined channels, sorted. Diagnostics only.
    pub fn channel_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.channels.borrow().keys().cloned().collect();
        names.sort();
        names
    }
}

impl Default for EventRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn downcast_entry<E: 'static, O: EventOutput>(
    name: &str,
    entry: &ChannelEntry,
) -> EventResult<Rc<EventChannel<E, O>>> {
    Rc::clone(&entry.channel)
        .downcast::<EventChannel<E, O>>()
        .map_err(|_| EventError::SignatureMismatch {
            name: name.to_string(),
            expected: entry.signature(),
            found: format!("({}, {})", type_name::<E>(), type_name::<O>()),
        })
}
