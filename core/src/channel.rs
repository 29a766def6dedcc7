//! Event channels — the typed publish/subscribe core.
//!
//! RULE: Publishers never know who is listening.
//! A listener influences the publisher only through the channel's
//! output value, never by reaching into the publisher's state.
//!
//! Dispatch is synchronous and confined to the simulation thread.
//! Every `notify` call owns its own dispatch frame: a snapshot of the
//! listener order is taken up front, and register/unregister requests
//! that arrive while any frame is active are queued and applied only
//! after the outermost frame completes. A listener may therefore call
//! `notify` on its own channel without corrupting the iteration.

use crate::error::{EventError, EventResult};
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

/// Opaque handle identifying one registration on one channel.
///
/// Unique per (channel, registration): registering the same callable
/// twice yields two tokens and two invocations per event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerToken(u64);

impl fmt::Display for ListenerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// How dispatch reacts to output-slot mutations. Declared per channel
/// at definition time, never inferred from publisher behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchPolicy {
    /// Every listener in the snapshot runs; listeners cooperatively
    /// observe the running output value.
    ContinueAlways,
    /// Dispatch stops at the first listener that leaves the output in
    /// the triggered state.
    StopOnSet,
}

/// How dispatch reacts when a listener returns an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorPolicy {
    /// Log the failure with channel and listener identity, keep going.
    /// One faulty mod must not break the simulation tick.
    LogAndContinue,
    /// Propagate the failure to the publisher and stop iterating.
    AbortOnError,
}

/// The mutable output slot a channel threads through dispatch.
///
/// `initial()` is the declared default the publisher sees when no
/// listener touches the slot. `is_set()` reports the triggered state
/// that `DispatchPolicy::StopOnSet` short-circuits on.
pub trait EventOutput: 'static {
    fn initial() -> Self;
    fn is_set(&self) -> bool;
}

/// Informational channels carry no output slot.
impl EventOutput for () {
    fn initial() -> Self {}
    fn is_set(&self) -> bool {
        false
    }
}

/// Flag channels: false by default, triggered once set.
impl EventOutput for bool {
    fn initial() -> Self {
        false
    }
    fn is_set(&self) -> bool {
        *self
    }
}

type ListenerFn<E, O> = dyn Fn(&E, &mut O) -> anyhow::Result<()>;

struct Registration<E: 'static, O: 'static> {
    token: ListenerToken,
    label: String,
    callback: Rc<ListenerFn<E, O>>,
}

impl<E, O> Clone for Registration<E, O> {
    fn clone(&self) -> Self {
        Self {
            token: self.token,
            label: self.label.clone(),
            callback: Rc::clone(&self.callback),
        }
    }
}

enum PendingOp<E: 'static, O: 'static> {
    Register(Registration<E, O>),
    Unregister(ListenerToken),
}

/// A named, signature-typed publication point.
///
/// `E` is the payload record, `O` the output slot. Both are fixed at
/// definition time; native listeners are checked at compile time,
/// script listeners at registration through the binding adapter.
pub struct EventChannel<E: 'static, O: EventOutput> {
    name: String,
    dispatch_policy: DispatchPolicy,
    error_policy: ErrorPolicy,
    listeners: RefCell<Vec<Registration<E, O>>>,
    pending: RefCell<Vec<PendingOp<E, O>>>,
    frames: Cell<usize>,
    next_token: Cell<u64>,
}

impl<E: 'static, O: EventOutput> fmt::Debug for EventChannel<E, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventChannel")
            .field("name", &self.name)
            .field("dispatch_policy", &self.dispatch_policy)
            .field("error_policy", &self.error_policy)
            .field("listener_count", &self.listeners.borrow().len())
            .finish()
    }
}

impl<E: 'static, O: EventOutput> EventChannel<E, O> {
    pub(crate) fn new(
        name: impl Into<String>,
        dispatch_policy: DispatchPolicy,
        error_policy: ErrorPolicy,
    ) -> Self {
        Self {
            name: name.into(),
            dispatch_policy,
            error_policy,
            listeners: RefCell::new(Vec::new()),
            pending: RefCell::new(Vec::new()),
            frames: Cell::new(0),
            next_token: Cell::new(1),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dispatch_policy(&self) -> DispatchPolicy {
        self.dispatch_policy
    }

    pub fn error_policy(&self) -> ErrorPolicy {
        self.error_policy
    }

    /// Register a listener. `label` identifies it in failure logs.
    ///
    /// Appends in registration order. If any dispatch frame is active
    /// on this channel, the append is deferred to frame completion and
    /// the listener runs only in subsequent frames; the token is valid
    /// either way.
    pub fn register<F>(&self, label: impl Into<String>, callback: F) -> ListenerToken
    where
        F: Fn(&E, &mut O) -> anyhow::Result<()> + 'static,
    {
        let token = ListenerToken(self.next_token.get());
        self.next_token.set(self.next_token.get() + 1);
        let registration = Registration {
            token,
            label: label.into(),
            callback: Rc::new(callback),
        };
        if self.frames.get() > 0 {
            self.pending.borrow_mut().push(PendingOp::Register(registration));
        } else {
            self.listeners.borrow_mut().push(registration);
        }
        token
    }

    /// Remove the listener identified by `token`.
    ///
    /// A stale token yields `UnknownToken`, which is also logged. If a
    /// dispatch frame is active the removal is deferred to frame
    /// completion — the in-flight frame still sees the listener — and
    /// returns `Ok`; staleness discovered at apply time is logged only.
    pub fn unregister(&self, token: ListenerToken) -> EventResult<()> {
        if self.frames.get() > 0 {
            self.pending.borrow_mut().push(PendingOp::Unregister(token));
            return Ok(());
        }
        self.remove_now(token)
    }

    /// Registered listener count. Deferred operations are excluded
    /// until they are applied.
    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }

    /// Publish one occurrence and return the final output value.
    ///
    /// Reentrant: a listener may call `notify` on this or any other
    /// channel; each call owns its own frame. On `AbortOnError`
    /// channels a listener failure propagates and stops iteration;
    /// otherwise failures are logged and siblings still run.
    pub fn notify(&self, payload: &E) -> EventResult<O> {
        let snapshot: Vec<Registration<E, O>> = self.listeners.borrow().clone();
        self.frames.set(self.frames.get() + 1);
        let result = self.run_frame(payload, &snapshot);
        self.frames.set(self.frames.get() - 1);
        if self.frames.get() == 0 {
            self.apply_pending();
        }
        result
    }

    fn run_frame(&self, payload: &E, snapshot: &[Registration<E, O>]) -> EventResult<O> {
        let mut output = O::initial();
        for registration in snapshot {
            if let Err(source) = (registration.callback)(payload, &mut output) {
                let failure = EventError::ListenerFailure {
                    name: self.name.clone(),
                    listener: registration.label.clone(),
                    source,
                };
                match self.error_policy {
                    ErrorPolicy::LogAndContinue => log::warn!("{failure}"),
                    ErrorPolicy::AbortOnError => return Err(failure),
                }
            }
            if self.dispatch_policy == DispatchPolicy::StopOnSet && output.is_set() {
                break;
            }
        }
        Ok(output)
    }

    fn apply_pending(&self) {
        let ops: Vec<PendingOp<E, O>> = self.pending.borrow_mut().drain(..).collect();
        for op in ops {
            match op {
                PendingOp::Register(registration) => {
                    self.listeners.borrow_mut().push(registration);
                }
                PendingOp::Unregister(token) => {
                    // Stale deferred removals were already logged by remove_now.
                    let _ = self.remove_now(token);
                }
            }
        }
    }

    fn remove_now(&self, token: ListenerToken) -> EventResult<()> {
        let mut listeners = self.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|registration| registration.token != token);
        if listeners.len() == before {
            let err = EventError::UnknownToken {
                name: self.name.clone(),
                token,
            };
            log::warn!("{err}");
            return Err(err);
        }
        Ok(())
    }
}
