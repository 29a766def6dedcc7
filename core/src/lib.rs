//! sectorcmd-core — the typed event notification core of Sector
//! Command, plus the engine subsystems publishing on it.
//!
//! The dispatch core (channel, registry, binding) is deliberately
//! small and closed: publishers announce occurrences on named, typed
//! channels; listeners — native or script-bound — observe them and may
//! veto or alter the publisher's default outcome through the channel's
//! output slot.

pub mod binding;
pub mod catalog;
pub mod channel;
pub mod clock;
pub mod combat;
pub mod engine;
pub mod error;
pub mod inventory;
pub mod registry;
pub mod rng;
pub mod sector;
pub mod strategic;
pub mod types;

pub use channel::{DispatchPolicy, ErrorPolicy, EventChannel, EventOutput, ListenerToken};
pub use error::{EventError, EventResult};
pub use registry::EventRegistry;
