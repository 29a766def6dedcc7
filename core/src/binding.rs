//! Binding adapter — the boundary between the typed dispatch core and
//! dynamically-typed script callables.
//!
//! RULE: The core never sees the script representation. The adapter
//! validates the declared script signature at registration time and
//! produces an ordinary typed listener; after that the channel cannot
//! tell a script listener from a native one.
//!
//! Marshaling is two-way. On call, the payload flattens to positional
//! `ScriptValue`s; channels with an output slot append the running slot
//! value as the trailing argument. The script's return value overwrites
//! the slot; returning nil leaves the slot untouched. Object references
//! cross the boundary as integer handles.

use crate::channel::{EventChannel, EventOutput, ListenerToken};
use crate::error::{EventError, EventResult};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// A dynamically-typed value crossing the script boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptValue {
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

/// Type tag used for registration-time signature validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptType {
    Bool,
    Int,
    Float,
    Str,
}

impl fmt::Display for ScriptType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Float => "float",
            Self::Str => "str",
        };
        f.write_str(tag)
    }
}

/// Payload types describe their script-visible parameter list.
pub trait ScriptArgs: 'static {
    /// Ordered type tags of the flattened parameters.
    const TAGS: &'static [ScriptType];

    /// Flatten to positional values, in `TAGS` order.
    fn to_values(&self) -> Vec<ScriptValue>;
}

impl ScriptArgs for () {
    const TAGS: &'static [ScriptType] = &[];

    fn to_values(&self) -> Vec<ScriptValue> {
        Vec::new()
    }
}

/// Output types describe the script-visible output slot, if any.
pub trait ScriptOutput: EventOutput {
    /// Type tag of the slot as it appears in the script signature.
    const SLOT: Option<ScriptType>;

    /// The running slot value shown to the script, or None for
    /// channels without a slot.
    fn to_value(&self) -> Option<ScriptValue>;

    /// Merge the script's return value back into the slot.
    fn merge(&mut self, value: ScriptValue) -> anyhow::Result<()>;
}

impl ScriptOutput for () {
    const SLOT: Option<ScriptType> = None;

    fn to_value(&self) -> Option<ScriptValue> {
        None
    }

    fn merge(&mut self, value: ScriptValue) -> anyhow::Result<()> {
        match value {
            ScriptValue::Nil => Ok(()),
            other => anyhow::bail!("channel has no output slot, script returned {other:?}"),
        }
    }
}

impl ScriptOutput for bool {
    const SLOT: Option<ScriptType> = Some(ScriptType::Bool);

    fn to_value(&self) -> Option<ScriptValue> {
        Some(ScriptValue::Bool(*self))
    }

    fn merge(&mut self, value: ScriptValue) -> anyhow::Result<()> {
        match value {
            ScriptValue::Nil => Ok(()),
            ScriptValue::Bool(flag) => {
                *self = flag;
                Ok(())
            }
            other => anyhow::bail!("expected bool return for output slot, got {other:?}"),
        }
    }
}

/// An external callable as handed over by the scripting collaborator:
/// a function name, its declared parameter signature, and the call
/// trampoline into script space.
pub struct ScriptCallable {
    pub name: String,
    pub params: Vec<ScriptType>,
    pub func: Rc<dyn Fn(&[ScriptValue]) -> anyhow::Result<ScriptValue>>,
}

impl ScriptCallable {
    pub fn new<F>(name: impl Into<String>, params: Vec<ScriptType>, func: F) -> Self
    where
        F: Fn(&[ScriptValue]) -> anyhow::Result<ScriptValue> + 'static,
    {
        Self {
            name: name.into(),
            params,
            func: Rc::new(func),
        }
    }
}

struct Bound {
    token: ListenerToken,
    unbind: Box<dyn Fn()>,
}

type Binder = Box<dyn Fn(ScriptCallable) -> EventResult<Bound>>;

/// Registration surface exposed to the scripting collaborator.
///
/// Channels become bindable by name through `expose`. Script
/// registration is only open during the initialization phase: `seal`
/// closes it when the engine starts ticking, and `reset` (mod
/// hot-reload) unbinds everything and reopens it. Because dispatch
/// only happens after sealing, script registration never occurs
/// mid-dispatch.
pub struct ScriptBindings {
    sealed: Cell<bool>,
    binders: RefCell<HashMap<String, Binder>>,
    bound: RefCell<Vec<(String, Bound)>>,
}

impl ScriptBindings {
    pub fn new() -> Self {
        Self {
            sealed: Cell::new(false),
            binders: RefCell::new(HashMap::new()),
            bound: RefCell::new(Vec::new()),
        }
    }

    /// Make `channel` bindable by name from script space.
    pub fn expose<E, O>(&self, channel: &Rc<EventChannel<E, O>>)
    where
        E: ScriptArgs,
        O: ScriptOutput,
    {
        let name = channel.name().to_string();
        let ch = Rc::clone(channel);
        let binder: Binder = Box::new(move |callable: ScriptCallable| {
            let mut expected: Vec<ScriptType> = E::TAGS.to_vec();
            if let Some(slot) = O::SLOT {
                expected.push(slot);
            }
            if callable.params != expected {
                return Err(EventError::SignatureMismatch {
                    name: ch.name().to_string(),
                    expected: format_signature(&expected),
                    found: format_signature(&callable.params),
                });
            }
            let func = Rc::clone(&callable.func);
            let token = ch.register(
                format!("script:{}", callable.name),
                move |payload: &E, output: &mut O| {
                    let mut args = payload.to_values();
                    if let Some(current) = output.to_value() {
                        args.push(current);
                    }
                    let returned = (func)(&args)?;
                    output.merge(returned)
                },
            );
            let unbind_channel = Rc::clone(&ch);
            Ok(Bound {
                token,
                unbind: Box::new(move || {
                    let _ = unbind_channel.unregister(token);
                }),
            })
        });
        self.binders.borrow_mut().insert(name, binder);
    }

    /// Bind a script callable to the named channel.
    ///
    /// Validates the declared signature against the channel's marshaled
    /// signature; a mismatch is reported as `SignatureMismatch` and
    /// nothing is registered.
    pub fn bind(&self, channel: &str, callable: ScriptCallable) -> EventResult<ListenerToken> {
        if self.sealed.get() {
            return Err(EventError::RegistrationClosed {
                name: channel.to_string(),
            });
        }
        let binders = self.binders.borrow();
        let binder = binders.get(channel).ok_or_else(|| EventError::UnknownChannel {
            name: channel.to_string(),
        })?;
        let script_name = callable.name.clone();
        let bound = binder(callable)?;
        let token = bound.token;
        log::debug!("bound script function '{script_name}' to channel '{channel}'");
        self.bound.borrow_mut().push((channel.to_string(), bound));
        Ok(token)
    }

    /// Close the initialization phase. Further `bind` calls fail with
    /// `RegistrationClosed` until `reset`.
    pub fn seal(&self) {
        self.sealed.set(true);
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed.get()
    }

    /// Scoped teardown for mod hot-reload: unbind every script listener
    /// and reopen the initialization phase. Channels and their native
    /// listeners are untouched.
    pub fn reset(&self) {
        let bound: Vec<(String, Bound)> = self.bound.borrow_mut().drain(..).collect();
        for (channel, entry) in bound {
            (entry.unbind)();
            log::debug!("unbound script listener {} from '{channel}'", entry.token);
        }
        self.sealed.set(false);
    }

    /// Number of live script bindings.
    pub fn bound_count(&self) -> usize {
        self.bound.borrow().len()
    }
}

impl Default for ScriptBindings {
    fn default() -> Self {
        Self::new()
    }
}

fn format_signature(tags: &[ScriptType]) -> String {
    let inner: Vec<String> = tags.iter().map(|tag| tag.to_string()).collect();
    format!("({})", inner.join(", "))
}
